use crate::api::recipes::read::RecipeMinified;
use crate::api::users::avatar_url;
use crate::api::{DetailResponse, ErrorResponse, PaginationMetadata};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::{Recipe, User};
use crate::schema::{recipes, subscriptions, users};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// A followed author: the profile plus that author's recipes and count.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionItem {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeMinified>,
    pub recipes_count: i64,
    pub avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListSubscriptionsParams {
    /// Number of items to return (default: 20, max: 100)
    pub limit: Option<i64>,
    /// Number of items to skip (default: 0)
    pub offset: Option<i64>,
    /// Truncate each author's recipe list to this many entries
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListSubscriptionsResponse {
    pub subscriptions: Vec<SubscriptionItem>,
    pub pagination: PaginationMetadata,
}

/// Assemble subscription payloads for followed authors. Each author's
/// recipes arrive newest-first; `recipes_count` is the full count even when
/// the list itself is truncated by `recipes_limit`.
pub fn build_subscription_items(
    conn: &mut PgConnection,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
    domain: &str,
) -> QueryResult<Vec<SubscriptionItem>> {
    let author_ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();

    let mut recipes_by_author: HashMap<Uuid, Vec<Recipe>> = HashMap::new();
    let rows: Vec<Recipe> = recipes::table
        .filter(recipes::author_id.eq_any(&author_ids))
        .order(recipes::created_at.desc())
        .select(Recipe::as_select())
        .load(conn)?;
    for recipe in rows {
        recipes_by_author
            .entry(recipe.author_id)
            .or_default()
            .push(recipe);
    }

    let items = authors
        .into_iter()
        .map(|author| {
            let author_recipes = recipes_by_author.remove(&author.id).unwrap_or_default();
            let recipes_count = author_recipes.len() as i64;

            let mut minified: Vec<RecipeMinified> = author_recipes
                .iter()
                .map(|recipe| RecipeMinified::from_recipe(recipe, domain))
                .collect();
            if let Some(limit) = recipes_limit {
                minified.truncate(limit.max(0) as usize);
            }

            SubscriptionItem {
                id: author.id,
                username: author.username.clone(),
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
                email: author.email.clone(),
                is_subscribed: true,
                recipes: minified,
                recipes_count,
                avatar: avatar_url(&author, domain),
            }
        })
        .collect();

    Ok(items)
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    tag = "users",
    params(ListSubscriptionsParams),
    responses(
        (status = 200, description = "Authors the requesting user follows", body = ListSubscriptionsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Query(params): Query<ListSubscriptionsParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut conn = get_conn!(ctx);

    let followed = subscriptions::table
        .filter(subscriptions::user_id.eq(user.id))
        .select(subscriptions::author_id);

    let rows: Vec<(User, i64)> = match users::table
        .filter(users::id.eq_any(followed))
        .order(users::username.asc())
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch subscriptions: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch subscriptions".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, count)| *count).unwrap_or(0);
    let authors: Vec<User> = rows.into_iter().map(|(author, _)| author).collect();

    let items =
        match build_subscription_items(&mut conn, authors, params.recipes_limit, &ctx.domain) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Failed to assemble subscription payloads: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        errors: "Failed to fetch subscriptions".to_string(),
                    }),
                )
                    .into_response();
            }
        };

    (
        StatusCode::OK,
        Json(ListSubscriptionsResponse {
            subscriptions: items,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}
