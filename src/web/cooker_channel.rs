//! Channel messages between the web handlers and the cooker control task.

use crate::cooker::CookSnapshot;
use crate::web::models::CommandResponse;
use axum::http::StatusCode;
use tokio::sync::oneshot;

/// A request sent from a web handler to the control task.
#[derive(Debug)]
pub enum CookerRequest {
    /// Fetch an immutable snapshot of the cook.
    GetStatus {
        respond_to: oneshot::Sender<CookSnapshot>,
    },
    /// Execute a remote method by name.
    Execute {
        name: String,
        payload: String,
        respond_to: oneshot::Sender<(StatusCode, CommandResponse)>,
    },
}
