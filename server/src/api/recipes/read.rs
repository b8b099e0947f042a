use crate::api::tags::TagResponse;
use crate::api::users::{subscribed_author_ids, UserProfile};
use crate::models::{Ingredient, Recipe, Tag, User};
use crate::schema::{favorites, ingredients, recipe_ingredients, recipe_tags, shopping_cart, tags, users};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

/// An ingredient line inside a recipe payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Full recipe payload with nested author, tags, and ingredients. The two
/// booleans are computed against the requesting user and stay false for
/// anonymous requests.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: Uuid,
    pub tags: Vec<TagResponse>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Compact recipe payload used by the favorite/cart/subscription responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeMinified {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeMinified {
    pub fn from_recipe(recipe: &Recipe, domain: &str) -> Self {
        RecipeMinified {
            id: recipe.id,
            name: recipe.name.clone(),
            image: image_url(recipe.id, domain),
            cooking_time: recipe.cooking_time,
        }
    }
}

pub fn image_url(recipe_id: Uuid, domain: &str) -> String {
    format!("{}/media/recipes/{}", domain, recipe_id)
}

/// Assemble full payloads for a page of recipes, preserving input order.
/// Tags, ingredients, authors, and the viewer's favorite/cart sets are
/// each fetched in one batched query.
pub fn load_recipe_responses(
    conn: &mut PgConnection,
    recipes: Vec<Recipe>,
    viewer: Option<&User>,
    domain: &str,
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();

    let authors: HashMap<Uuid, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    let tag_rows: Vec<(Uuid, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<(i32, Ingredient)>> = HashMap::new();
    let ingredient_rows: Vec<(Uuid, i32, Ingredient)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
        .order(ingredients::name.asc())
        .select((
            recipe_ingredients::recipe_id,
            recipe_ingredients::amount,
            Ingredient::as_select(),
        ))
        .load(conn)?;
    for (recipe_id, amount, ingredient) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push((amount, ingredient));
    }

    let favorited: HashSet<Uuid> = match viewer {
        Some(viewer) => favorites::table
            .filter(favorites::user_id.eq(viewer.id))
            .filter(favorites::recipe_id.eq_any(&recipe_ids))
            .select(favorites::recipe_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let in_cart: HashSet<Uuid> = match viewer {
        Some(viewer) => shopping_cart::table
            .filter(shopping_cart::user_id.eq(viewer.id))
            .filter(shopping_cart::recipe_id.eq_any(&recipe_ids))
            .select(shopping_cart::recipe_id)
            .load::<Uuid>(conn)?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let subscribed = subscribed_author_ids(conn, viewer.map(|v| v.id), &author_ids)?;

    let mut responses = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        let author = authors
            .get(&recipe.author_id)
            .ok_or(diesel::result::Error::NotFound)?;

        let tags = tags_by_recipe
            .remove(&recipe.id)
            .unwrap_or_default()
            .into_iter()
            .map(TagResponse::from)
            .collect();

        let ingredients = ingredients_by_recipe
            .remove(&recipe.id)
            .unwrap_or_default()
            .into_iter()
            .map(|(amount, ingredient)| RecipeIngredientResponse {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount,
            })
            .collect();

        responses.push(RecipeResponse {
            id: recipe.id,
            tags,
            author: UserProfile::from_user(author, subscribed.contains(&author.id), domain),
            ingredients,
            is_favorited: favorited.contains(&recipe.id),
            is_in_shopping_cart: in_cart.contains(&recipe.id),
            name: recipe.name,
            image: image_url(recipe.id, domain),
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        });
    }

    Ok(responses)
}
