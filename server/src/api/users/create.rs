use crate::api::ErrorResponse;
use crate::auth::hash_password;
use crate::get_conn;
use crate::models::NewUser;
use crate::schema::users;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignupResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Usernames are restricted to word characters plus `.@+-`, and `me` is
/// reserved for the profile route.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username == "me" {
        return Err("'me' is not a valid username".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
    {
        return Err("Username contains invalid characters".to_string());
    }
    Ok(())
}

fn validate_signup(req: &SignupRequest) -> Result<(), String> {
    validate_username(&req.username)?;
    if req.email.is_empty() || !req.email.contains('@') {
        return Err("A valid email is required".to_string());
    }
    if req.first_name.is_empty() {
        return Err("First name cannot be empty".to_string());
    }
    if req.last_name.is_empty() {
        return Err("Last name cannot be empty".to_string());
    }
    if req.password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(ctx): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    if let Err(message) = validate_signup(&req) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { errors: message })).into_response();
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to hash password".to_string(),
                }),
            )
                .into_response();
        }
    };

    let mut conn = get_conn!(ctx);

    let new_user = NewUser {
        email: &req.email,
        username: &req.username,
        first_name: &req.first_name,
        last_name: &req.last_name,
        password_hash: &password_hash,
    };

    let user_id: Uuid = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(users::id)
        .get_result(&mut conn)
    {
        Ok(id) => id,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    errors: "A user with that email or username already exists".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to create user".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::CREATED,
        Json(SignupResponse {
            id: user_id,
            email: req.email,
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str) -> SignupRequest {
        SignupRequest {
            email: "cook@example.com".to_string(),
            username: username.to_string(),
            first_name: "Julia".to_string(),
            last_name: "Child".to_string(),
            password: "bon-appetit".to_string(),
        }
    }

    #[test]
    fn test_username_accepts_word_characters() {
        assert!(validate_username("julia.child+cook@site-1_2").is_ok());
    }

    #[test]
    fn test_username_rejects_me() {
        assert!(validate_username("me").is_err());
    }

    #[test]
    fn test_username_rejects_invalid_characters() {
        assert!(validate_username("julia child").is_err());
        assert!(validate_username("julia/child").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_signup_requires_email_shape() {
        let mut req = request("julia");
        req.email = "not-an-email".to_string();
        assert!(validate_signup(&req).is_err());
    }

    #[test]
    fn test_signup_requires_names() {
        let mut req = request("julia");
        req.first_name = String::new();
        assert!(validate_signup(&req).is_err());

        let mut req = request("julia");
        req.last_name = String::new();
        assert!(validate_signup(&req).is_err());
    }

    #[test]
    fn test_signup_accepts_valid_request() {
        assert!(validate_signup(&request("julia")).is_ok());
    }
}
