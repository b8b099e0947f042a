use crate::api::tags::TagResponse;
use crate::api::{DetailResponse, ErrorResponse};
use crate::get_conn;
use crate::models::Tag;
use crate::schema::tags;
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
    path = "/api/tags/{id}/",
    tag = "tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag details", body = TagResponse),
        (status = 404, description = "Tag not found", body = DetailResponse)
    )
)]
pub async fn get_tag(State(ctx): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let tag: Tag = match tags::table
        .find(id)
        .select(Tag::as_select())
        .first(&mut conn)
    {
        Ok(t) => t,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "Tag not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch tag: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch tag".to_string(),
                }),
            )
                .into_response();
        }
    };

    (StatusCode::OK, Json(TagResponse::from(tag))).into_response()
}
