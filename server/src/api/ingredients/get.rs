use crate::api::ingredients::IngredientResponse;
use crate::api::{DetailResponse, ErrorResponse};
use crate::get_conn;
use crate::models::Ingredient;
use crate::schema::ingredients;
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
    path = "/api/ingredients/{id}/",
    tag = "ingredients",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient details", body = IngredientResponse),
        (status = 404, description = "Ingredient not found", body = DetailResponse)
    )
)]
pub async fn get_ingredient(
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let ingredient: Ingredient = match ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(&mut conn)
    {
        Ok(i) => i,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "Ingredient not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch ingredient: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch ingredient".to_string(),
                }),
            )
                .into_response();
        }
    };

    (StatusCode::OK, Json(IngredientResponse::from(ingredient))).into_response()
}
