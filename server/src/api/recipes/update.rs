use crate::api::recipes::create::{
    insert_components, missing_components, validate_components, IngredientAmount,
};
use crate::api::recipes::read::{load_recipe_responses, RecipeResponse};
use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::images::{parse_data_url, DecodedImage};
use crate::models::{Recipe, RecipeChanges};
use crate::schema::{recipe_ingredients, recipe_tags, recipes};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Partial update payload. Tag and ingredient lists are always required
/// and replace the stored sets wholesale; the scalar fields and image are
/// optional.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeUpdateRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    /// Base64 data URL, e.g. `data:image/png;base64,...`
    pub image: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = RecipeUpdateRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not the recipe author", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecipeUpdateRequest>,
) -> impl IntoResponse {
    if let Some(name) = req.name.as_deref() {
        if name.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    errors: "Name cannot be empty".to_string(),
                }),
            )
                .into_response();
        }
    }
    if let Some(text) = req.text.as_deref() {
        if text.trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    errors: "Text cannot be empty".to_string(),
                }),
            )
                .into_response();
        }
    }
    if let Some(cooking_time) = req.cooking_time {
        if cooking_time < 1 {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    errors: "Cooking time must be at least 1".to_string(),
                }),
            )
                .into_response();
        }
    }
    if let Err(message) = validate_components(&req.tags, &req.ingredients) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message })).into_response();
    }

    let image: Option<DecodedImage> = match req.image.as_deref().map(parse_data_url) {
        None => None,
        Some(Ok(image)) => Some(image),
        Some(Err(message)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message }))
                .into_response();
        }
    };

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
                    errors: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if recipe.author_id != user.id {
        return (
            StatusCode::FORBIDDEN,
            Json(DetailResponse {
                detail: "Only the author can edit this recipe".to_string(),
            }),
        )
            .into_response();
    }

    let ingredient_ids: Vec<Uuid> = req.ingredients.iter().map(|i| i.id).collect();
    match missing_components(&mut conn, &req.tags, &ingredient_ids) {
        Ok(None) => {}
        Ok(Some(message)) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message }))
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to check recipe components: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let changes = RecipeChanges {
            name: req.name.as_deref(),
            image: image.as_ref().map(|i| i.bytes.as_slice()),
            image_content_type: image.as_ref().map(|i| i.content_type.as_str()),
            text: req.text.as_deref(),
            cooking_time: req.cooking_time,
        };

        let has_field_changes = req.name.is_some()
            || req.text.is_some()
            || req.cooking_time.is_some()
            || image.is_some();

        let updated: Recipe = if has_field_changes {
            diesel::update(recipes::table.find(recipe.id))
                .set(&changes)
                .returning(Recipe::as_returning())
                .get_result(conn)?
        } else {
            recipe
        };

        // Replace the tag and ingredient sets wholesale
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(updated.id)))
            .execute(conn)?;
        diesel::delete(
            recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(updated.id)),
        )
        .execute(conn)?;
        insert_components(conn, updated.id, &req.tags, &req.ingredients)?;

        Ok(updated)
    });

    let updated = match result {
        Ok(updated) => updated,
        Err(e) => {
            tracing::error!("Failed to update recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to update recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match load_recipe_responses(&mut conn, vec![updated], Some(&user), &ctx.domain) {
        Ok(mut responses) if !responses.is_empty() => {
            (StatusCode::OK, Json(responses.remove(0))).into_response()
        }
        Ok(_) | Err(_) => {
            tracing::error!("Failed to load updated recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to load updated recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}
