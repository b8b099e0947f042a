use crate::api::users::subscriptions::{build_subscription_items, SubscriptionItem};
use crate::api::{DetailResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::get_conn;
use crate::models::{NewSubscription, User};
use crate::schema::{subscriptions, users};
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
    post,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author user ID")
    ),
    responses(
        (status = 201, description = "Subscribed to the author", body = SubscriptionItem),
        (status = 400, description = "Self-subscribe or duplicate", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let author: User = match users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "User not found".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to subscribe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if author.id == user.id {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Cannot subscribe to yourself".to_string(),
            }),
        )
            .into_response();
    }

    let new_subscription = NewSubscription {
        user_id: user.id,
        author_id: author.id,
    };

    match diesel::insert_into(subscriptions::table)
        .values(&new_subscription)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    errors: "Already subscribed to this user".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to subscribe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to subscribe".to_string(),
                }),
            )
                .into_response();
        }
    }

    match build_subscription_items(&mut conn, vec![author], None, &ctx.domain) {
        Ok(mut items) if !items.is_empty() => {
            (StatusCode::CREATED, Json(items.remove(0))).into_response()
        }
        Ok(_) | Err(_) => {
            tracing::error!("Failed to assemble subscription payload");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to subscribe".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author user ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed from the author"),
        (status = 400, description = "No such subscription", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(ctx): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let author_exists: bool = match diesel::select(diesel::dsl::exists(
        users::table.filter(users::id.eq(id)),
    ))
    .get_result(&mut conn)
    {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to fetch user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to unsubscribe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if !author_exists {
        return (
            StatusCode::NOT_FOUND,
            Json(DetailResponse {
                detail: "User not found".to_string(),
            }),
        )
            .into_response();
    }

    let removed = match diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user.id))
            .filter(subscriptions::author_id.eq(id)),
    )
    .execute(&mut conn)
    {
        Ok(count) => count,
        Err(e) => {
            tracing::error!("Failed to unsubscribe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to unsubscribe".to_string(),
                }),
            )
                .into_response();
        }
    };

    if removed == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                errors: "Subscription not found".to_string(),
            }),
        )
            .into_response();
    }

    StatusCode::NO_CONTENT.into_response()
}
