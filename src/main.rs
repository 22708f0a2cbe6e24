//! Footprint - monthly household carbon footprint estimation.
//!
//! Serves a local, single-user API for the calculator page. The page's form
//! state lives here; calculations, analysis and history are delegated to
//! the remote calculation service.
//!
//! # API Endpoints
//!
//! - `GET /session` - Current form, estimate, result and history
//! - `PUT /session/form` - Update form fields
//! - `POST /estimate` - Stateless estimate of a form
//! - `POST /calculate` - Submit to the calculation service
//! - `POST /history/refresh` - Re-fetch history
//! - `DELETE /history/:id` - Delete a history entry
//! - `GET /health` - Health check

use std::net::SocketAddr;

use chrono::Local;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use footprint::api::{AppState, router};
use footprint::app::FootprintApp;
use footprint::config::Config;
use footprint::service::CalculationClient;
use footprint::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("footprint=info".parse()?))
        .init();

    let config = Config::from_env()?;

    info!(
        port = config.port,
        service_url = %config.service_url,
        user_id = %config.user_id,
        "Starting Footprint"
    );

    let client = CalculationClient::with_base_url(&config.service_url);
    let session = Session::new(&config.user_id, Local::now().date_naive());
    let footprint = FootprintApp::new(session, client);

    // Failure is recorded as a notice on the session
    let _ = footprint.refresh_history().await;

    let app = router(AppState { footprint });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Footprint is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
