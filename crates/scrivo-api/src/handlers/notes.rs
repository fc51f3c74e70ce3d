//! Note HTTP handlers: create, read, update, share, history, delete.
//!
//! Path ids that are not integers are answered as unmatched routes (404),
//! before authentication is checked. Malformed JSON bodies are 400. Both go
//! through [`ApiError`]'s rejection impls.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use scrivo_core::{logging, Note, NoteHistoryEntry, NoteId, NoteInput, ShareInput};

use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::error::ApiError;

type NotePath = Result<Path<NoteId>, PathRejection>;

fn note_id(path: NotePath) -> Result<NoteId, ApiError> {
    let Path(id) = path?;
    tracing::Span::current().record(logging::NOTE_ID, id);
    Ok(id)
}

/// Create a note owned by the caller.
///
/// # Returns
/// - 201 Created with the note
/// - 400 Bad Request with field errors
pub async fn create_note(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    let note = state.notes.create(user.id, &input).await?;
    tracing::Span::current().record(logging::NOTE_ID, note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

/// Fetch a note the caller owns or has been shared.
pub async fn get_note(
    State(state): State<AppState>,
    path: NotePath,
    auth: Result<RequireAuth, ApiError>,
) -> Result<Json<Note>, ApiError> {
    let id = note_id(path)?;
    let RequireAuth(user) = auth?;
    Ok(Json(state.notes.get(user.id, id).await?))
}

/// Replace title and content; the previous values go to the history.
///
/// # Returns
/// - 200 OK with the updated note
/// - 400 Bad Request with field errors
/// - 403 Forbidden if the caller neither owns nor shares the note
/// - 404 Not Found if the note does not exist
pub async fn update_note(
    State(state): State<AppState>,
    path: NotePath,
    auth: Result<RequireAuth, ApiError>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<Json<Note>, ApiError> {
    let id = note_id(path)?;
    let RequireAuth(user) = auth?;
    let Json(input) = payload?;
    Ok(Json(state.notes.update(user.id, id, &input).await?))
}

/// Share a note with other users. Owner only.
///
/// Body: `{"note_id": 1, "users": [2, 3]}`. Either every user gets access or
/// none does; the first unknown id is reported as 404.
pub async fn share_note(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    payload: Result<Json<ShareInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload?;
    if let Some(id) = input.note_id {
        tracing::Span::current().record(logging::NOTE_ID, id);
    }
    let granted = state.notes.share(user.id, &input).await?;
    Ok(Json(json!({
        "message": "Note shared successfully",
        "granted": granted,
    })))
}

/// Update history of a note, oldest first.
pub async fn note_history(
    State(state): State<AppState>,
    path: NotePath,
    auth: Result<RequireAuth, ApiError>,
) -> Result<Json<Vec<NoteHistoryEntry>>, ApiError> {
    let id = note_id(path)?;
    let RequireAuth(user) = auth?;
    Ok(Json(state.notes.history(user.id, id).await?))
}

/// Delete a note with its shares and history. Owner only.
pub async fn delete_note(
    State(state): State<AppState>,
    path: NotePath,
    auth: Result<RequireAuth, ApiError>,
) -> Result<StatusCode, ApiError> {
    let id = note_id(path)?;
    let RequireAuth(user) = auth?;
    state.notes.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
