use crate::api::ingredients::IngredientResponse;
use crate::api::ErrorResponse;
use crate::get_conn;
use crate::models::Ingredient;
use crate::schema::ingredients;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix to filter by
    pub name: Option<String>,
}

/// Escape LIKE wildcards, then turn the user's prefix into a pattern.
fn prefix_pattern(prefix: &str) -> String {
    format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Matching ingredients", body = [IngredientResponse])
    )
)]
pub async fn list_ingredients(
    State(ctx): State<AppState>,
    Query(params): Query<ListIngredientsParams>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let mut query = ingredients::table.into_boxed();

    if let Some(prefix) = params.name.as_deref() {
        if !prefix.is_empty() {
            query = query.filter(ingredients::name.ilike(prefix_pattern(prefix)));
        }
    }

    let rows: Vec<Ingredient> = match query
        .select(Ingredient::as_select())
        .order(ingredients::name.asc())
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch ingredients".to_string(),
                }),
            )
                .into_response();
        }
    };

    let ingredients: Vec<IngredientResponse> =
        rows.into_iter().map(IngredientResponse::from).collect();

    (StatusCode::OK, Json(ingredients)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_appends_wildcard() {
        assert_eq!(prefix_pattern("Ap"), "Ap%");
    }

    #[test]
    fn test_prefix_pattern_escapes_like_wildcards() {
        assert_eq!(prefix_pattern("50%_off"), "50\\%\\_off%");
    }
}
