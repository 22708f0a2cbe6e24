//! Orchestration of the session and the calculation service.
//!
//! The session lock is never held across a network call: each operation
//! takes what it needs from the session, releases it, awaits the service,
//! then locks again to record the outcome. The in-flight flag set by
//! [`Session::begin_submission`] is what keeps submissions from overlapping.
//!
//! A submission finishes on its own task, so a caller that stops waiting
//! (a dropped connection, a timeout) does not leave the flag set.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinError;
use tracing::{Instrument, Span, info, instrument, warn};

use crate::model::CalculationRequest;
use crate::service::{CalculationClient, ServiceError};
use crate::session::{FormUpdate, Session, SessionError, SessionView};

/// Failure of an application operation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("submission task failed: {0}")]
    Task(#[from] JoinError),
}

/// A session together with the client used to fulfil it.
#[derive(Clone)]
pub struct FootprintApp {
    session: Arc<Mutex<Session>>,
    client: CalculationClient,
}

impl FootprintApp {
    pub fn new(session: Session, client: CalculationClient) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            client,
        }
    }

    pub async fn view(&self) -> SessionView {
        self.session.lock().await.view()
    }

    /// Apply a form update and return the refreshed view.
    pub async fn update_form(&self, update: FormUpdate) -> Result<SessionView, AppError> {
        let mut session = self.session.lock().await;
        session.apply(update)?;
        Ok(session.view())
    }

    /// Submit the current form for calculation, then refresh history.
    ///
    /// A failed history refresh after a successful calculation does not
    /// fail the submission; it is recorded as a notice.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SessionView, AppError> {
        let request = self.session.lock().await.begin_submission()?;

        info!(
            user_id = %request.user_id,
            month = request.month,
            year = request.year,
            "Submitting footprint calculation"
        );

        let app = self.clone();
        let task = tokio::spawn(
            async move { app.complete_submission(request).await }.instrument(Span::current()),
        );
        task.await?
    }

    async fn complete_submission(
        &self,
        request: CalculationRequest,
    ) -> Result<SessionView, AppError> {
        let outcome = self.client.calculate(&request).await;
        match &outcome {
            Ok(result) => info!(total = ?result.total(), "Calculation received"),
            Err(e) => warn!(error = %e, "Calculation failed"),
        }

        self.session.lock().await.finish_submission(outcome)?;

        // Already recorded as a notice on failure
        let _ = self.refresh_history().await;

        Ok(self.view().await)
    }

    /// Re-fetch the user's history, replacing the current list.
    #[instrument(skip(self))]
    pub async fn refresh_history(&self) -> Result<SessionView, AppError> {
        let user_id = self.session.lock().await.user_id().to_string();

        let outcome = self.client.fetch_history(&user_id).await;
        match &outcome {
            Ok(entries) => info!(user_id = %user_id, entry_count = entries.len(), "History fetched"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to fetch history"),
        }

        let mut session = self.session.lock().await;
        session.apply_history(outcome)?;
        Ok(session.view())
    }

    /// Delete a history entry, then re-fetch history.
    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: &str) -> Result<SessionView, AppError> {
        if let Err(e) = self.client.delete_entry(id).await {
            warn!(id = %id, error = %e, "Failed to delete history entry");
            self.session.lock().await.record_failure(&e);
            return Err(e.into());
        }

        info!(id = %id, "History entry deleted");
        self.refresh_history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn app() -> FootprintApp {
        // Nothing listens on port 9; every service call fails to connect
        let client = CalculationClient::with_base_url("http://127.0.0.1:9");
        let session = Session::new("user-001", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        FootprintApp::new(session, client)
    }

    #[tokio::test]
    async fn test_update_form() {
        let app = app();

        let view = app
            .update_form(FormUpdate {
                flight_kilometers: Some("800".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(view.form.flight_kilometers, "800");
        assert!((view.estimate.total - 96.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_submit_transport_failure() {
        let app = app();

        let result = app.submit().await;

        assert!(matches!(result, Err(AppError::Service(_))));
        let view = app.view().await;
        assert!(!view.in_flight);
        assert!(view.result.is_none());
        assert_eq!(view.notices[0].message, "Error calculating footprint");
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_history() {
        let app = app();

        let result = app.delete_entry("42").await;

        assert!(matches!(result, Err(AppError::Service(_))));
        let view = app.view().await;
        assert!(view.history.is_empty());
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].message, "Error deleting entry");
    }
}
