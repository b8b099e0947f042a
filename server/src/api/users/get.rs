use crate::api::users::{subscribed_author_ids, UserProfile};
use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::MaybeAuthUser;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found", body = DetailResponse)
    )
)]
pub async fn get_user(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let user: User = match users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "User not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let subscribed =
        match subscribed_author_ids(&mut conn, viewer.as_ref().map(|v| v.id), &[user.id]) {
            Ok(set) => set,
            Err(e) => {
                tracing::error!("Failed to fetch subscriptions: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        errors: "Failed to fetch user".to_string(),
                    }),
                )
                    .into_response();
            }
        };

    (
        StatusCode::OK,
        Json(UserProfile::from_user(
            &user,
            subscribed.contains(&user.id),
            &ctx.domain,
        )),
    )
        .into_response()
}
