use crate::api::recipes::read::{load_recipe_responses, RecipeResponse};
use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::images::parse_data_url;
use crate::models::{NewRecipe, NewRecipeIngredient, NewRecipeTag, Recipe};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, recipes, tags};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Base64 data URL, e.g. `data:image/png;base64,...`
    pub image: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Shared tag/ingredient list rules for create and update.
pub fn validate_components(
    tag_ids: &[Uuid],
    ingredients: &[IngredientAmount],
) -> Result<(), String> {
    if tag_ids.is_empty() {
        return Err("Field 'tags' cannot be empty".to_string());
    }
    let unique_tags: HashSet<&Uuid> = tag_ids.iter().collect();
    if unique_tags.len() != tag_ids.len() {
        return Err("Tags cannot repeat".to_string());
    }

    if ingredients.is_empty() {
        return Err("Field 'ingredients' cannot be empty".to_string());
    }
    let unique_ingredients: HashSet<&Uuid> = ingredients.iter().map(|i| &i.id).collect();
    if unique_ingredients.len() != ingredients.len() {
        return Err("Ingredients cannot repeat".to_string());
    }
    if ingredients.iter().any(|i| i.amount < 1) {
        return Err("Ingredient amounts must be at least 1".to_string());
    }

    Ok(())
}

/// Check that every referenced tag and ingredient row exists.
pub fn missing_components(
    conn: &mut PgConnection,
    tag_ids: &[Uuid],
    ingredient_ids: &[Uuid],
) -> QueryResult<Option<String>> {
    let found_tags: i64 = tags::table
        .filter(tags::id.eq_any(tag_ids))
        .count()
        .get_result(conn)?;
    if found_tags != tag_ids.len() as i64 {
        return Ok(Some("One or more tags do not exist".to_string()));
    }

    let found_ingredients: i64 = ingredients::table
        .filter(ingredients::id.eq_any(ingredient_ids))
        .count()
        .get_result(conn)?;
    if found_ingredients != ingredient_ids.len() as i64 {
        return Ok(Some("One or more ingredients do not exist".to_string()));
    }

    Ok(None)
}

/// Insert the tag and ingredient join rows for a recipe.
pub fn insert_components(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
    ingredient_amounts: &[IngredientAmount],
) -> QueryResult<()> {
    let tag_rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&tag_rows)
        .execute(conn)?;

    let ingredient_rows: Vec<NewRecipeIngredient> = ingredient_amounts
        .iter()
        .map(|item| NewRecipeIngredient {
            recipe_id,
            ingredient_id: item.id,
            amount: item.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&ingredient_rows)
        .execute(conn)?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/recipes/",
    tag = "recipes",
    request_body = RecipeWriteRequest,
    responses(
        (status = 201, description = "Recipe created successfully", body = RecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Json(req): Json<RecipeWriteRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Name cannot be empty".to_string(),
            }),
        )
            .into_response();
    }
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Text cannot be empty".to_string(),
            }),
        )
            .into_response();
    }
    if req.cooking_time < 1 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Cooking time must be at least 1".to_string(),
            }),
        )
            .into_response();
    }
    if let Err(message) = validate_components(&req.tags, &req.ingredients) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message })).into_response();
    }

    let image = match parse_data_url(&req.image) {
        Ok(image) => image,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message }))
                .into_response();
        }
    };

    let mut conn = get_conn!(ctx);

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
                    errors: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    }

    // Recipe plus join rows land atomically
    let result: Result<Recipe, diesel::result::Error> = conn.transaction(|conn| {
        let new_recipe = NewRecipe {
            author_id: user.id,
            name: &req.name,
            image: &image.bytes,
            image_content_type: &image.content_type,
            text: &req.text,
            cooking_time: req.cooking_time,
        };

        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        insert_components(conn, recipe.id, &req.tags, &req.ingredients)?;

        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            tracing::error!("Failed to create recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to create recipe".to_string(),
                }),
            )
                .into_response();
        }
    };

    match load_recipe_responses(&mut conn, vec![recipe], Some(&user), &ctx.domain) {
        Ok(mut responses) if !responses.is_empty() => {
            (StatusCode::CREATED, Json(responses.remove(0))).into_response()
        }
        Ok(_) | Err(_) => {
            tracing::error!("Failed to load created recipe");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to load created recipe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(Uuid, i32)]) -> Vec<IngredientAmount> {
        pairs
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect()
    }

    #[test]
    fn test_components_accept_valid_lists() {
        let tags = vec![Uuid::new_v4(), Uuid::new_v4()];
        let ingredients = items(&[(Uuid::new_v4(), 1), (Uuid::new_v4(), 250)]);
        assert!(validate_components(&tags, &ingredients).is_ok());
    }

    #[test]
    fn test_components_reject_empty_tags() {
        let ingredients = items(&[(Uuid::new_v4(), 1)]);
        assert!(validate_components(&[], &ingredients).is_err());
    }

    #[test]
    fn test_components_reject_repeated_tags() {
        let tag = Uuid::new_v4();
        let ingredients = items(&[(Uuid::new_v4(), 1)]);
        assert!(validate_components(&[tag, tag], &ingredients).is_err());
    }

    #[test]
    fn test_components_reject_empty_ingredients() {
        assert!(validate_components(&[Uuid::new_v4()], &[]).is_err());
    }

    #[test]
    fn test_components_reject_repeated_ingredients() {
        let ingredient = Uuid::new_v4();
        let ingredients = items(&[(ingredient, 1), (ingredient, 2)]);
        assert!(validate_components(&[Uuid::new_v4()], &ingredients).is_err());
    }

    #[test]
    fn test_components_reject_zero_amount() {
        let ingredients = items(&[(Uuid::new_v4(), 0)]);
        assert!(validate_components(&[Uuid::new_v4()], &ingredients).is_err());
    }
}
