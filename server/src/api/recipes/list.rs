use crate::api::recipes::read::{load_recipe_responses, RecipeResponse};
use crate::api::{ErrorResponse, PaginationMetadata};
use crate::auth::MaybeAuthUser;
use crate::get_conn;
use crate::models::Recipe;
use crate::schema::{favorites, recipe_tags, recipes, shopping_cart, tags};
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::Query;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListRecipesParams {
    /// Number of items to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Tag slugs to filter by; repeatable, matches any
    #[serde(default)]
    pub tags: Vec<String>,
    /// Author user ID
    pub author: Option<Uuid>,
    /// Only the viewer's favorites (`1` or `true`); ignored for anonymous users
    pub is_favorited: Option<String>,
    /// Only recipes in the viewer's cart; ignored for anonymous users
    pub is_in_shopping_cart: Option<String>,
}

/// Query-string booleans arrive as `1` or `true`.
fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true") | Some("True"))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Paginated list of recipes, newest first", body = ListRecipesResponse)
    )
)]
pub async fn list_recipes(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(ctx): State<AppState>,
    Query(params): Query<ListRecipesParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut conn = get_conn!(ctx);

    let mut query = recipes::table.into_boxed();

    if !params.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(&params.tags))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }

    if let Some(author) = params.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    // The boolean filters are no-ops for anonymous viewers
    if let Some(viewer) = viewer.as_ref() {
        if is_truthy(params.is_favorited.as_deref()) {
            let favorited = favorites::table
                .filter(favorites::user_id.eq(viewer.id))
                .select(favorites::recipe_id);
            query = query.filter(recipes::id.eq_any(favorited));
        }

        if is_truthy(params.is_in_shopping_cart.as_deref()) {
            let in_cart = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer.id))
                .select(shopping_cart::recipe_id);
            query = query.filter(recipes::id.eq_any(in_cart));
        }
    }

    // COUNT(*) OVER() carries the pre-LIMIT total on every row
    let rows: Vec<(Recipe, i64)> = match query
        .order(recipes::created_at.desc())
        .select((Recipe::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch recipes: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, count)| *count).unwrap_or(0);
    let page: Vec<Recipe> = rows.into_iter().map(|(recipe, _)| recipe).collect();

    let recipes = match load_recipe_responses(&mut conn, page, viewer.as_ref(), &ctx.domain) {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::error!("Failed to assemble recipe payloads: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch recipes".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(ListRecipesResponse {
            recipes,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(Some("1")));
        assert!(is_truthy(Some("true")));
        assert!(is_truthy(Some("True")));
    }

    #[test]
    fn test_falsy_values() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some("0")));
        assert!(!is_truthy(Some("false")));
        assert!(!is_truthy(Some("yes")));
    }
}
