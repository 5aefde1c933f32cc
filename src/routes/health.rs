use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub database: String,
}

impl HealthData {
    pub fn from_ping(db_ok: bool) -> Self {
        Self {
            status: if db_ok { "ok" } else { "degraded" }.to_string(),
            database: if db_ok { "up" } else { "down" }.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let db_ok = match state.orm.ping().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "database ping failed");
            false
        }
    };

    Json(ApiResponse::success(
        "Health check",
        HealthData::from_ping(db_ok),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_degraded_when_database_is_down() {
        let data = HealthData::from_ping(false);
        assert_eq!(data.status, "degraded");
        assert_eq!(data.database, "down");
        assert_eq!(HealthData::from_ping(true).status, "ok");
    }
}
