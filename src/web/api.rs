//! Axum routes for the command boundary, plus the method dispatcher the
//! control task runs against the cooker.

use crate::cooker::{Cooker, CookerError};
use crate::web::cooker_channel::CookerRequest;
use crate::web::models::{CommandRequest, CommandResponse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tokio::sync::mpsc::Sender;

pub type AppState = Sender<CookerRequest>;

/// Build the router serving status reads and remote commands.
pub fn create_router(cooker_tx: AppState) -> Router {
    Router::new()
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/command", post(execute_command))
        .with_state(cooker_tx)
}

async fn get_status(
    State(cooker_tx): State<AppState>,
) -> Result<Json<crate::cooker::CookSnapshot>, StatusCode> {
    let (resp_tx, resp_rx) = tokio::sync::oneshot::channel();
    if cooker_tx.send(CookerRequest::GetStatus { respond_to: resp_tx }).await.is_err() {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    match resp_rx.await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn execute_command(
    State(cooker_tx): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<(StatusCode, Json<CommandResponse>), StatusCode> {
    let (resp_tx, resp_rx) = tokio::sync::oneshot::channel();
    if cooker_tx
        .send(CookerRequest::Execute {
            name: request.name,
            payload: request.payload,
            respond_to: resp_tx,
        })
        .await
        .is_err()
    {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    match resp_rx.await {
        Ok((status, response)) => Ok((status, Json(response))),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Execute one remote method against the cooker.
///
/// Contract: `SetTargetTemperature` takes a string-encoded float and answers
/// 200 on success, 400 on a non-numeric payload or an out-of-range value;
/// any other method name answers 404.
pub async fn dispatch(cooker: &Cooker, name: &str, payload: &str) -> (StatusCode, CommandResponse) {
    match name {
        "SetTargetTemperature" => {
            let Ok(kelvins) = payload.trim().parse::<f64>() else {
                return (StatusCode::BAD_REQUEST, CommandResponse::new("Invalid parameter"));
            };
            match cooker.set_target_temperature(kelvins).await {
                Ok(()) => (
                    StatusCode::OK,
                    CommandResponse::new("Executed direct method SetTargetTemperature"),
                ),
                Err(e @ CookerError::InvalidSetPoint(_)) => {
                    (StatusCode::BAD_REQUEST, CommandResponse::new(e.to_string()))
                }
                Err(e) => {
                    tracing::error!("SetTargetTemperature failed: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, CommandResponse::new(e.to_string()))
                }
            }
        }
        _ => (
            StatusCode::NOT_FOUND,
            CommandResponse::new(format!("Direct method {} is not defined", name)),
        ),
    }
}
