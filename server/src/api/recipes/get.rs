use crate::api::recipes::read::{load_recipe_responses, RecipeResponse};
use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::MaybeAuthUser;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::recipes;
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
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    )
)]
pub async fn get_recipe(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let recipe: Recipe = match recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)
    {
        Ok(r) => r,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "Recipe not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match load_recipe_responses(&mut conn, vec![recipe], viewer.as_ref(), &ctx.domain) {
        Ok(mut responses) if !responses.is_empty() => {
            (StatusCode::OK, Json(responses.remove(0))).into_response()
        }
        Ok(_) | Err(_) => {
            tracing::error!("Failed to assemble recipe payload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
