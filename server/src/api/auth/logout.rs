use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::{delete_session, AuthUser};
use crate::get_conn;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    tag = "auth",
    responses(
        (status = 204, description = "Session terminated"),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    AuthUser(_user): AuthUser,
    State(ctx): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // AuthUser already validated the header, so the token is present
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .unwrap_or_default();

    let mut conn = get_conn!(ctx);

    if let Err(e) = delete_session(&mut conn, token) {
        tracing::error!("Failed to delete session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                errors: "Failed to delete session".to_string(),
            }),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
