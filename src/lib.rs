//! Footprint - monthly household carbon footprint estimation.
//!
//! # Overview
//!
//! Footprint collects a month of household activity (road and flight
//! distance, electricity, cooking gas, meals by diet), estimates its
//! CO2-equivalent emissions locally, submits it to a remote calculation
//! service and reconciles the service's answer with the local estimate.
//!
//! The local estimate is always available: it drives the live breakdown
//! and is the last fallback when the service supplies no usable total.
//!
//! # Modules
//!
//! - [`model`]: Activity inputs, wire payloads and impact levels
//! - [`estimator`]: Per-category emission estimate and its memo
//! - [`narrative`]: Total extraction from the service's free-text analysis
//! - [`resolver`]: Precedence policy between server, narrative and local totals
//! - [`view`]: Display projections of results and history
//! - [`service`]: HTTP client for the calculation service
//! - [`session`]: Form, result and history state for a single user
//! - [`app`]: Orchestration of the session and the service client
//! - [`api`]: HTTP API handlers
//! - [`config`]: Environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod estimator;
pub mod model;
pub mod narrative;
pub mod resolver;
pub mod service;
pub mod session;
pub mod view;
