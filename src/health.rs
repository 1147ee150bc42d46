use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, Debug)]
pub struct Health {
    status: &'static str,
    timestamp: String,
    database_url: &'static str,
    environment: &'static str,
}

/// Liveness check. Never touches the database, so that it keeps answering
/// while the database is down or not configured.
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        database_url: match state.config.database_url {
            Some(_) => "configured",
            None => "not configured",
        },
        environment: state.config.environment.as_str(),
    })
}
