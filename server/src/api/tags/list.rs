use crate::api::tags::TagResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::models::Tag;
use crate::schema::tags;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;

#[utoipa::path(
    get,
    path = "/api/tags/",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = [TagResponse])
    )
)]
pub async fn list_tags(State(ctx): State<AppState>) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let rows: Vec<Tag> = match tags::table
        .select(Tag::as_select())
        .order(tags::name.asc())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch tags: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch tags".to_string(),
                }),
            )
                .into_response();
        }
    };

    let tags: Vec<TagResponse> = rows.into_iter().map(TagResponse::from).collect();

    (StatusCode::OK, Json(tags)).into_response()
}
