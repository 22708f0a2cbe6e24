//! Form, result and history state for a single user.
//!
//! The session owns everything the page displays:
//!
//! - the activity form as entered, with user id and period,
//! - the last result returned by the calculation service,
//! - the user's history as last fetched,
//! - whether a submission is outstanding,
//! - notices about failed operations.
//!
//! It performs no I/O. Callers run the network request between
//! [`Session::begin_submission`] and [`Session::finish_submission`], and hand
//! every other service outcome back through the matching method. Each
//! successful response replaces the corresponding state wholesale; a failed
//! one leaves it as it was and adds a notice.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::estimator::{EstimateMemo, EstimationResult};
use crate::model::{ActivityForm, CalculationRequest, HistoryEntry, ServerResult};
use crate::resolver::{ResolvedDisplay, resolve};
use crate::service::{Operation, ServiceError};
use crate::view::{HistoryRow, ResultView};

/// Notices kept for display; older ones are dropped first.
pub const MAX_NOTICES: usize = 20;

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a calculation is already in progress")]
    SubmissionInFlight,

    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("year must have four digits, got {0}")]
    InvalidYear(i32),

    #[error("user id must not be empty")]
    EmptyUserId,
}

/// A user-visible report of a failed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub operation: Operation,

    /// Generic message naming the operation.
    pub message: &'static str,

    /// The underlying error, for diagnostics.
    pub detail: String,

    pub at: DateTime<Utc>,
}

/// Partial update of the form. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormUpdate {
    pub user_id: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub car_kilometers: Option<String>,
    pub flight_kilometers: Option<String>,
    pub electricity_units: Option<String>,
    pub lpg_cylinders: Option<String>,
    pub meat_meals: Option<String>,
    pub vegetarian_meals: Option<String>,
    pub vegan_meals: Option<String>,
    pub uses_renewable_energy: Option<bool>,
    pub other_activities: Option<String>,
}

/// Everything needed to render the page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: String,
    pub month: u32,
    pub year: i32,
    pub form: ActivityForm,

    /// Live estimate of the form as it stands.
    pub estimate: EstimationResult,

    pub resolved: ResolvedDisplay,

    /// Present once a calculation has succeeded.
    pub result: Option<ResultView>,

    pub history: Vec<HistoryRow>,
    pub in_flight: bool,
    pub notices: Vec<Notice>,
}

#[derive(Debug)]
pub struct Session {
    user_id: String,
    month: u32,
    year: i32,
    form: ActivityForm,
    result: Option<ServerResult>,
    history: Vec<HistoryEntry>,
    in_flight: bool,
    notices: Vec<Notice>,
    memo: EstimateMemo,
}

impl Session {
    /// Start a session for `user_id`, with the period set to `today`'s month.
    pub fn new(user_id: &str, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            month: today.month(),
            year: today.year(),
            form: ActivityForm::default(),
            result: None,
            history: Vec::new(),
            in_flight: false,
            notices: Vec::new(),
            memo: EstimateMemo::default(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn form(&self) -> &ActivityForm {
        &self.form
    }

    pub fn result(&self) -> Option<&ServerResult> {
        self.result.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Apply a form update. Nothing changes if any field is invalid.
    pub fn apply(&mut self, update: FormUpdate) -> Result<(), SessionError> {
        if let Some(month) = update.month {
            if !(1..=12).contains(&month) {
                return Err(SessionError::InvalidMonth(month));
            }
        }
        if let Some(year) = update.year {
            if !(1000..=9999).contains(&year) {
                return Err(SessionError::InvalidYear(year));
            }
        }
        if update.user_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(SessionError::EmptyUserId);
        }

        if let Some(user_id) = update.user_id {
            self.user_id = user_id;
        }
        if let Some(month) = update.month {
            self.month = month;
        }
        if let Some(year) = update.year {
            self.year = year;
        }

        let form = &mut self.form;
        let text_fields = [
            (&mut form.car_kilometers, update.car_kilometers),
            (&mut form.flight_kilometers, update.flight_kilometers),
            (&mut form.electricity_units, update.electricity_units),
            (&mut form.lpg_cylinders, update.lpg_cylinders),
            (&mut form.meat_meals, update.meat_meals),
            (&mut form.vegetarian_meals, update.vegetarian_meals),
            (&mut form.vegan_meals, update.vegan_meals),
            (&mut form.other_activities, update.other_activities),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(renewable) = update.uses_renewable_energy {
            form.uses_renewable_energy = renewable;
        }

        Ok(())
    }

    /// Estimate of the current form, recomputed only when its numbers change.
    pub fn estimate(&mut self) -> &EstimationResult {
        let input = self.form.to_activity();
        self.memo.get(&input)
    }

    /// Display resolved from the last result and the current estimate.
    pub fn resolved(&mut self) -> ResolvedDisplay {
        let input = self.form.to_activity();
        let local = self.memo.get(&input);
        resolve(self.result.as_ref(), local)
    }

    /// Mark a submission as outstanding and build its payload.
    ///
    /// The previous result is cleared.
    pub fn begin_submission(&mut self) -> Result<CalculationRequest, SessionError> {
        if self.in_flight {
            return Err(SessionError::SubmissionInFlight);
        }

        self.in_flight = true;
        self.result = None;

        Ok(CalculationRequest::new(
            &self.user_id,
            self.month,
            self.year,
            &self.form.to_activity(),
        ))
    }

    /// Record the outcome of the outstanding submission.
    ///
    /// A failure is recorded as a notice and handed back to the caller.
    pub fn finish_submission(
        &mut self,
        outcome: Result<ServerResult, ServiceError>,
    ) -> Result<(), ServiceError> {
        self.in_flight = false;

        match outcome {
            Ok(result) => {
                self.result = Some(result);
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Record the outcome of a history fetch.
    ///
    /// On failure the previous history is kept.
    pub fn apply_history(
        &mut self,
        outcome: Result<Vec<HistoryEntry>, ServiceError>,
    ) -> Result<(), ServiceError> {
        match outcome {
            Ok(entries) => {
                self.history = entries;
                Ok(())
            }
            Err(e) => {
                self.record_failure(&e);
                Err(e)
            }
        }
    }

    /// Add a notice for a failed service call.
    pub fn record_failure(&mut self, error: &ServiceError) {
        let operation = error.operation();

        self.notices.push(Notice {
            operation,
            message: operation.notice(),
            detail: error.to_string(),
            at: Utc::now(),
        });

        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    /// Remove and return every pending notice.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn view(&mut self) -> SessionView {
        let resolved = self.resolved();
        let estimate = self.estimate().clone();

        let result = self
            .result
            .as_ref()
            .map(|result| ResultView::new(result, &resolved, &estimate));

        let history = self
            .history
            .iter()
            .map(|entry| HistoryRow::new(entry, &self.user_id))
            .collect();

        SessionView {
            user_id: self.user_id.clone(),
            month: self.month,
            year: self.year,
            form: self.form.clone(),
            estimate,
            resolved,
            result,
            history,
            in_flight: self.in_flight,
            notices: self.notices.clone(),
        }
    }
}
