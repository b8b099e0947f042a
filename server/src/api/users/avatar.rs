use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::images::parse_data_url;
use crate::schema::users;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// Base64 data URL, e.g. `data:image/png;base64,...`
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar/",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = AvatarResponse),
        (status = 400, description = "Missing or invalid avatar field", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn put_avatar(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Json(req): Json<AvatarRequest>,
) -> impl IntoResponse {
    let Some(data_url) = req.avatar.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Field 'avatar' is missing".to_string(),
            }),
        )
            .into_response();
    };

    let image = match parse_data_url(data_url) {
        Ok(image) => image,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message }))
                .into_response();
        }
    };

    let mut conn = get_conn!(ctx);

    if let Err(e) = diesel::update(users::table.find(user.id))
        .set((
            users::avatar.eq(Some(image.bytes)),
            users::avatar_content_type.eq(Some(image.content_type)),
        ))
        .execute(&mut conn)
    {
        tracing::error!("Failed to store avatar: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                errors: "Failed to store avatar".to_string(),
            }),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(AvatarResponse {
            avatar: format!("{}/media/avatars/{}", ctx.domain, user.id),
        }),
    )
        .into_response()
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar/",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    if let Err(e) = diesel::update(users::table.find(user.id))
        .set((
            users::avatar.eq(None::<Vec<u8>>),
            users::avatar_content_type.eq(None::<String>),
        ))
        .execute(&mut conn)
    {
        tracing::error!("Failed to remove avatar: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                errors: "Failed to remove avatar".to_string(),
            }),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
