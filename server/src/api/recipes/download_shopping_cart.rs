use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::schema::{ingredients, recipe_ingredients, shopping_cart};
use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Sum amounts grouped by (ingredient name, measurement unit), sorted by
/// name then unit. Two cart recipes each needing "sugar, 100 g" and
/// "sugar, 50 g" come out as one 150 g line.
fn aggregate_ingredients(rows: Vec<(String, String, i32)>) -> Vec<(String, String, i64)> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_insert(0) += i64::from(amount);
    }
    totals
        .into_iter()
        .map(|((name, unit), total)| (name, unit, total))
        .collect()
}

fn render_shopping_list(items: &[(String, String, i64)]) -> String {
    let mut out = String::from("Shopping list:\n\n");
    for (name, unit, total) in items {
        out.push_str(&format!("{} ({}) - {}\n", name, unit, total));
    }
    out
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    tag = "recipes",
    responses(
        (status = 200, description = "Aggregated shopping list as a text attachment", body = String, content_type = "text/plain"),
        (status = 400, description = "Shopping cart is empty", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let cart_recipe_ids: Vec<Uuid> = match shopping_cart::table
        .filter(shopping_cart::user_id.eq(user.id))
        .select(shopping_cart::recipe_id)
        .load(&mut conn)
    {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!("Failed to fetch shopping cart: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    if cart_recipe_ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Shopping cart is empty".to_string(),
            }),
        )
            .into_response();
    }

    let rows: Vec<(String, String, i32)> = match recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&cart_recipe_ids))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch cart ingredients: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to build shopping list".to_string(),
                }),
            )
                .into_response();
        }
    };

    let text = render_shopping_list(&aggregate_ingredients(rows));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_cart.txt\"",
            ),
        ],
        text,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> (String, String, i32) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_aggregate_sums_same_ingredient_and_unit() {
        let items = aggregate_ingredients(vec![row("sugar", "g", 100), row("sugar", "g", 50)]);
        assert_eq!(items, vec![("sugar".to_string(), "g".to_string(), 150)]);
    }

    #[test]
    fn test_aggregate_keeps_units_apart() {
        let items = aggregate_ingredients(vec![row("milk", "ml", 200), row("milk", "tbsp", 2)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_aggregate_sorts_by_name() {
        let items = aggregate_ingredients(vec![
            row("salt", "g", 5),
            row("butter", "g", 50),
            row("flour", "g", 300),
        ]);
        let names: Vec<&str> = items.iter().map(|(name, _, _)| name.as_str()).collect();
        assert_eq!(names, vec!["butter", "flour", "salt"]);
    }

    #[test]
    fn test_render_shopping_list() {
        let items = vec![
            ("flour".to_string(), "g".to_string(), 300),
            ("milk".to_string(), "ml".to_string(), 250),
        ];
        let text = render_shopping_list(&items);
        assert!(text.starts_with("Shopping list:\n"));
        assert!(text.contains("flour (g) - 300\n"));
        assert!(text.contains("milk (ml) - 250\n"));
    }
}
