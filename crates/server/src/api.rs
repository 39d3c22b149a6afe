//! REST API routes, wire-compatible with the frontend's `/api` client

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{Database, NewResult, StatRow, User};
use crate::error::{Error, Result};

/// Success envelope: `{"message": "success", "data": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    fn success(data: T) -> Json<Self> {
        Json(Self {
            message: "success",
            data,
        })
    }
}

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", get(list_users).post(create_user))
        .route("/results", post(submit_result))
        .route("/stats/:user_id", get(user_stats))
        .with_state(db)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mathboard-server",
    }))
}

async fn list_users(State(db): State<Database>) -> Result<Json<Envelope<Vec<User>>>> {
    let users = db.list_users()?;
    Ok(Envelope::success(users))
}

#[derive(Debug, Deserialize)]
struct CreateUserRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedUser {
    id: i64,
    name: String,
    icon: String,
}

async fn create_user(
    State(db): State<Database>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<Envelope<CreatedUser>>> {
    let name = match req.name {
        Some(n) if !n.is_empty() => n,
        _ => return Err(Error::NameRequired),
    };
    let icon = req.icon.unwrap_or_else(|| "smile".to_string());

    let id = db.create_user(&name, &icon)?;
    debug!("Created profile {} ({})", name, id);

    Ok(Envelope::success(CreatedUser { id, name, icon }))
}

#[derive(Debug, Deserialize)]
struct SubmitResultRequest {
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    factor_a: Option<i64>,
    #[serde(default)]
    factor_b: Option<i64>,
    #[serde(default)]
    user_answer: Option<i64>,
    #[serde(default)]
    time_taken_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SubmittedResult {
    id: i64,
    is_correct: bool,
}

async fn submit_result(
    State(db): State<Database>,
    Json(req): Json<SubmitResultRequest>,
) -> Result<Json<Envelope<SubmittedResult>>> {
    let (user_id, factor_a, factor_b, user_answer, time_taken_ms) = match (
        req.user_id,
        req.factor_a,
        req.factor_b,
        req.user_answer,
        req.time_taken_ms,
    ) {
        (Some(u), Some(a), Some(b), Some(ans), Some(t)) => (u, a, b, ans, t),
        _ => return Err(Error::MissingFields),
    };

    // The server is the authority on correctness
    let correct_answer = factor_a * factor_b;
    let is_correct = user_answer == correct_answer;

    let id = db.insert_result(&NewResult {
        user_id,
        factor_a,
        factor_b,
        user_answer,
        correct_answer,
        is_correct,
        time_taken_ms,
    })?;

    Ok(Envelope::success(SubmittedResult { id, is_correct }))
}

async fn user_stats(
    State(db): State<Database>,
    Path(user_id): Path<i64>,
) -> Result<Json<Envelope<Vec<StatRow>>>> {
    let rows = db.stats_for_user(user_id)?;
    Ok(Envelope::success(rows))
}
