//! `/notes` handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::auth::RequireApiKey;
use super::error::ApiError;
use super::state::SharedState;
use crate::notes::{MAX_LIST_LIMIT, Note, NoteStore, NoteUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct NoteInput {
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteList {
    ok: bool,
    items: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteItem {
    ok: bool,
    item: Note,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    ok: bool,
}

fn store(state: &SharedState) -> Result<&NoteStore, ApiError> {
    state.notes.as_ref().ok_or_else(ApiError::notes_disabled)
}

/// An unreadable body counts as an empty one; field checks report the problem.
fn input(payload: Result<Json<NoteInput>, JsonRejection>) -> NoteInput {
    payload.map(|Json(input)| input).unwrap_or_default()
}

/// A non-numeric id cannot name a note.
fn note_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::not_found())
}

pub async fn list(State(state): State<SharedState>) -> Result<Json<NoteList>, ApiError> {
    let items = store(&state)?.list(MAX_LIST_LIMIT).await?;
    Ok(Json(NoteList { ok: true, items }))
}

pub async fn create(
    _: RequireApiKey,
    State(state): State<SharedState>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<Json<NoteItem>, ApiError> {
    let input = input(payload);
    let item = store(&state)?
        .create(
            input.title.as_deref().unwrap_or_default(),
            input.content.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(NoteItem { ok: true, item }))
}

pub async fn get(
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<NoteItem>, ApiError> {
    let item = store(&state)?.get(note_id(path)?).await?;
    Ok(Json(NoteItem { ok: true, item }))
}

pub async fn update(
    _: RequireApiKey,
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<Json<NoteItem>, ApiError> {
    let input = input(payload);
    let update = NoteUpdate {
        title: input.title,
        content: input.content,
    };
    let item = store(&state)?.update(note_id(path)?, update).await?;
    Ok(Json(NoteItem { ok: true, item }))
}

pub async fn delete(
    _: RequireApiKey,
    State(state): State<SharedState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Deleted>, ApiError> {
    store(&state)?.delete(note_id(path)?).await?;
    Ok(Json(Deleted { ok: true }))
}
