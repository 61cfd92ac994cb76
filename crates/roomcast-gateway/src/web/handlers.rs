//! Page handlers.

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;

use roomcast_core::error::RoomcastError;

use crate::app_state::AppState;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateSession {
    #[serde(default)]
    pub display_name: String,
}

pub async fn home(State(app): State<AppState>) -> Result<Html<String>, ApiError> {
    Ok(Html(app.views().home()?))
}

/// `POST /session/create`: mint a session, then 303 to its page.
pub async fn create_session(
    State(app): State<AppState>,
    Form(form): Form<CreateSession>,
) -> Result<Redirect, ApiError> {
    let name = form.display_name.trim();
    if name.is_empty() {
        return Err(RoomcastError::BadRequest("display_name must not be empty".into()).into());
    }
    let token = app.sessions().create(name);
    Ok(Redirect::to(&format!("/session/{token}")))
}

pub async fn show_session(
    State(app): State<AppState>,
    Path(token): Path<String>,
) -> Result<Html<String>, ApiError> {
    let session = app.sessions().lookup(&token)?;
    Ok(Html(app.views().session(&session)?))
}

pub async fn not_found() -> ApiError {
    ApiError(RoomcastError::NotFound)
}
