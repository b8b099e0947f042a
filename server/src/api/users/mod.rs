pub mod avatar;
pub mod create;
pub mod get;
pub mod list;
pub mod me;
pub mod subscribe;
pub mod subscriptions;

use crate::models::User;
use crate::schema::subscriptions as subscriptions_table;
use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Public profile shape, embedded in recipes and returned by the user
/// endpoints. `is_subscribed` is computed against the requesting user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserProfile {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserProfile {
    pub fn from_user(user: &User, is_subscribed: bool, domain: &str) -> Self {
        UserProfile {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: avatar_url(user, domain),
        }
    }
}

pub fn avatar_url(user: &User, domain: &str) -> Option<String> {
    user.avatar_content_type
        .as_ref()
        .map(|_| format!("{}/media/avatars/{}", domain, user.id))
}

/// Which of `author_ids` the viewer follows. Empty for anonymous viewers.
pub fn subscribed_author_ids(
    conn: &mut PgConnection,
    viewer: Option<Uuid>,
    author_ids: &[Uuid],
) -> QueryResult<HashSet<Uuid>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };

    let ids: Vec<Uuid> = subscriptions_table::table
        .filter(subscriptions_table::user_id.eq(viewer))
        .filter(subscriptions_table::author_id.eq_any(author_ids))
        .select(subscriptions_table::author_id)
        .load(conn)?;

    Ok(ids.into_iter().collect())
}

/// Returns the router for the user endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users/",
            get(list::list_users).post(create::create_user),
        )
        .route("/api/users/me/", get(me::me))
        .route(
            "/api/users/me/avatar/",
            put(avatar::put_avatar).delete(avatar::delete_avatar),
        )
        .route(
            "/api/users/subscriptions/",
            get(subscriptions::list_subscriptions),
        )
        .route("/api/users/{id}/", get(get::get_user))
        .route(
            "/api/users/{id}/subscribe/",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_user,
        list::list_users,
        get::get_user,
        me::me,
        avatar::put_avatar,
        avatar::delete_avatar,
        subscriptions::list_subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        UserProfile,
        create::SignupRequest,
        create::SignupResponse,
        list::ListUsersResponse,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
        subscriptions::SubscriptionItem,
        subscriptions::ListSubscriptionsResponse,
    ))
)]
pub struct ApiDoc;
