use crate::api::{DetailResponse, ErrorResponse};
use crate::get_conn;
use crate::schema::{recipes, users};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for stored images (avatars and recipe photos)
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/media/avatars/{id}", axum::routing::get(get_avatar))
        .route("/media/recipes/{id}", axum::routing::get(get_recipe_image))
}

#[utoipa::path(
    get,
    path = "/media/avatars/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Avatar image bytes"),
        (status = 404, description = "No avatar for this user", body = DetailResponse)
    )
)]
pub async fn get_avatar(State(ctx): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let row: Option<(Option<Vec<u8>>, Option<String>)> = match users::table
        .find(id)
        .select((users::avatar, users::avatar_content_type))
        .first(&mut conn)
        .optional()
    {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Failed to fetch avatar: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch avatar".to_string(),
                }),
            )
                .into_response();
        }
    };

    match row {
        Some((Some(bytes), Some(content_type))) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(DetailResponse {
                detail: "Avatar not found".to_string(),
            }),
        )
            .into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/media/recipes/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe image bytes"),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    )
)]
pub async fn get_recipe_image(
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let row: Option<(Vec<u8>, String)> = match recipes::table
        .find(id)
        .select((recipes::image, recipes::image_content_type))
        .first(&mut conn)
        .optional()
    {
        Ok(row) => row,
        Err(e) => {
            tracing::error!("Failed to fetch recipe image: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch recipe image".to_string(),
                }),
            )
                .into_response();
        }
    };

    match row {
        Some((bytes, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(DetailResponse {
                detail: "Recipe image not found".to_string(),
            }),
        )
            .into_response(),
    }
}

#[derive(OpenApi)]
#[openapi(paths(get_avatar, get_recipe_image))]
pub struct ApiDoc;
