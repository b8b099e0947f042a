use crate::api::users::{subscribed_author_ids, UserProfile};
use crate::api::{ErrorResponse, PageParams, PaginationMetadata};
use crate::auth::MaybeAuthUser;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
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
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListUsersResponse {
    pub users: Vec<UserProfile>,
    pub pagination: PaginationMetadata,
}

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of users", body = ListUsersResponse)
    )
)]
pub async fn list_users(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(ctx): State<AppState>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let limit = params.limit();
    let offset = params.offset();

    let mut conn = get_conn!(ctx);

    // COUNT(*) OVER() carries the pre-LIMIT total on every row
    let rows: Vec<(User, i64)> = match users::table
        .order(users::username.asc())
        .select((User::as_select(), sql::<BigInt>("COUNT(*) OVER()")))
        .limit(limit)
        .offset(offset)
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to fetch users: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to fetch users".to_string(),
                }),
            )
                .into_response();
        }
    };

    let total = rows.first().map(|(_, count)| *count).unwrap_or(0);
    let page: Vec<User> = rows.into_iter().map(|(user, _)| user).collect();

    let author_ids: Vec<Uuid> = page.iter().map(|u| u.id).collect();
    let subscribed =
        match subscribed_author_ids(&mut conn, viewer.as_ref().map(|v| v.id), &author_ids) {
            Ok(set) => set,
            Err(e) => {
                tracing::error!("Failed to fetch subscriptions: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        errors: "Failed to fetch users".to_string(),
                    }),
                )
                    .into_response();
            }
        };

    let users = page
        .iter()
        .map(|user| UserProfile::from_user(user, subscribed.contains(&user.id), &ctx.domain))
        .collect();

    (
        StatusCode::OK,
        Json(ListUsersResponse {
            users,
            pagination: PaginationMetadata {
                total,
                limit,
                offset,
            },
        }),
    )
        .into_response()
}
