use crate::api::users::UserProfile;
use crate::api::DetailResponse;
use crate::auth::AuthUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "The requesting user's profile", body = UserProfile),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(AuthUser(user): AuthUser, State(ctx): State<AppState>) -> impl IntoResponse {
    // Users cannot follow themselves, so is_subscribed is always false here
    (
        StatusCode::OK,
        Json(UserProfile::from_user(&user, false, &ctx.domain)),
    )
        .into_response()
}
