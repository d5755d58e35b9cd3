//! HTTP boundary: JSON routes over [`GameService`].

use crate::error::{ErrorKind, LudusError};
use crate::service::{GameService, StateView};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

/// Shared state for the handlers.
#[derive(Debug, Clone)]
pub struct ApiState {
    service: GameService,
    wait_timeout: Duration,
}

impl ApiState {
    /// Bundles the service with the long-poll window.
    pub fn new(service: GameService, wait_timeout: Duration) -> Self {
        Self {
            service,
            wait_timeout,
        }
    }
}

/// Builds the `/api` router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/new", post(new_game))
        .route("/api/join", post(join_game))
        .route("/api/state", post(fetch_state))
        .route("/api/move", post(submit_move))
        .route("/api/waitstate", post(wait_state))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct NewGameRequest {
    config: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewGameResponse {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct JoinRequest {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeatRequest {
    game_id: Option<String>,
    player_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest {
    game_id: Option<String>,
    player_id: Option<String>,
    #[serde(rename = "move")]
    mv: Option<String>,
}

/// Parses a JSON body; an empty body reads as `{}`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, LudusError> {
    if body.is_empty() {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Unparsable request body");
        LudusError::malformed("Request body must be a JSON object.")
    })
}

/// Treats absent and empty strings alike.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

#[instrument(skip_all)]
async fn new_game(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<NewGameResponse>, LudusError> {
    let request: NewGameRequest = parse_body(&body)?;
    let config = present(request.config);
    let id = state.service.create_game(config.as_deref()).await?;
    Ok(Json(NewGameResponse { id }))
}

#[instrument(skip_all)]
async fn join_game(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<StateView>, LudusError> {
    let request: JoinRequest = parse_body(&body)?;
    let (Some(id), Some(name)) = (present(request.id), present(request.name)) else {
        return Err(LudusError::malformed("Must provide id and name in json."));
    };
    Ok(Json(state.service.join_game(&id, &name).await?))
}

fn seat_fields(request: SeatRequest) -> Result<(String, String), LudusError> {
    match (present(request.game_id), present(request.player_id)) {
        (Some(game_id), Some(player_id)) => Ok((game_id, player_id)),
        _ => Err(LudusError::malformed(
            "Must provide gameId and playerId in json.",
        )),
    }
}

#[instrument(skip_all)]
async fn fetch_state(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<StateView>, LudusError> {
    let (game_id, player_id) = seat_fields(parse_body(&body)?)?;
    Ok(Json(state.service.fetch_state(&game_id, &player_id).await?))
}

#[instrument(skip_all)]
async fn submit_move(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<StateView>, LudusError> {
    let request: MoveRequest = parse_body(&body)?;
    let (Some(game_id), Some(player_id), Some(mv)) = (
        present(request.game_id),
        present(request.player_id),
        present(request.mv),
    ) else {
        return Err(LudusError::malformed(
            "Must provide gameId, playerId and move in json.",
        ));
    };
    Ok(Json(
        state.service.submit_move(&game_id, &player_id, &mv).await?,
    ))
}

/// Aborts the wrapped task when dropped, so an abandoned request does not
/// leave its timer behind.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Long poll: answers with the view once it is the caller's turn, or 204
/// when the wait window closes first. Clients re-issue after a 204.
#[instrument(skip_all)]
async fn wait_state(State(state): State<ApiState>, body: Bytes) -> Result<Response, LudusError> {
    let (game_id, player_id) = seat_fields(parse_body(&body)?)?;

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let timeout = state.wait_timeout;
    let _timer = AbortOnDrop(tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        let _ = cancel_tx.send(true);
    }));

    match state
        .service
        .wait_for_turn(&game_id, &player_id, cancel_rx)
        .await?
    {
        Some(view) => Ok(Json(view).into_response()),
        None => {
            debug!(?timeout, "Wait window elapsed");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

/// Status code for each error kind.
fn status_for(kind: &ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Malformed
        | ErrorKind::InvalidConfig
        | ErrorKind::IllegalMove
        | ErrorKind::GameFull { .. }
        | ErrorKind::GameDoesntExist => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for LudusError {
    fn into_response(self) -> Response {
        let status = status_for(&self.kind);
        if self.kind == ErrorKind::Internal {
            error!(error = %self, "Internal failure");
        } else {
            warn!(kind = %self.kind, message = %self.message, "Request rejected");
        }

        let mut body = serde_json::json!({
            "error": self.kind.name(),
            "message": self.public_message(),
        });
        if let ErrorKind::GameFull {
            white_name,
            black_name,
        } = &self.kind
        {
            body["players"] = serde_json::json!([white_name, black_name]);
        }
        (status, Json(body)).into_response()
    }
}
