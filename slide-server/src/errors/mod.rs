pub mod api;
pub mod entity;
pub mod record;
pub mod setup;

pub use api::ApiError;
pub use entity::EntityError;
pub use record::RecordError;
pub use setup::SetupError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use slide_api::GatewayError;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::EntityError(e) => (e.status_code(), e.to_string(), None),
            ApiError::GatewayError(GatewayError::AuthenticationFailed(e)) => {
                tracing::warn!("Cloud rejected credentials: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "Cloud authentication failed".to_string(),
                    None,
                )
            }
            ApiError::GatewayError(e) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Gateway error: {}", e);
                let status = match e {
                    GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, e.to_string(), Some(error_id.to_string()))
            }
        };

        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        (status, body).into_response()
    }
}
