use crate::api::{DetailResponse, ErrorResponse};
use crate::get_conn;
use crate::models::{NewShortLink, ShortLink};
use crate::schema::{recipes, short_links};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const SHORT_CODE_LEN: usize = 6;

/// Attempts before giving up on finding an unused code. With 62^6 possible
/// codes a collision retry is already rare; five in a row is not expected.
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

pub fn generate_short_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(SHORT_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Get-or-create keyed on the original URL. Uniqueness of the code is
/// enforced by the database; a colliding insert is retried with a fresh
/// code. Returns `None` when every attempt collided.
fn get_or_create_short_link(
    conn: &mut PgConnection,
    url: &str,
) -> QueryResult<Option<ShortLink>> {
    let existing = short_links::table
        .filter(short_links::original_url.eq(url))
        .select(ShortLink::as_select())
        .first(conn)
        .optional()?;
    if let Some(link) = existing {
        return Ok(Some(link));
    }

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_short_code();
        let new_link = NewShortLink {
            original_url: url,
            short_code: &code,
        };

        match diesel::insert_into(short_links::table)
            .values(&new_link)
            .returning(ShortLink::as_returning())
            .get_result(conn)
        {
            Ok(link) => return Ok(Some(link)),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                // Either the code collided, or a concurrent request created
                // the link for this URL first. The re-select settles which.
                let raced = short_links::table
                    .filter(short_links::original_url.eq(url))
                    .select(ShortLink::as_select())
                    .first(conn)
                    .optional()?;
                if let Some(link) = raced {
                    return Ok(Some(link));
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(None)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link/",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Short link for the recipe", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    )
)]
pub async fn get_link(State(ctx): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let recipe_exists: bool = match diesel::select(diesel::dsl::exists(
        recipes::table.filter(recipes::id.eq(id)),
    ))
    .get_result(&mut conn)
    {
        Ok(exists) => exists,
        Err(e) => {
            tracing::error!("Failed to fetch recipe: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to create short link".to_string(),
                }),
            )
                .into_response();
        }
    };

    if !recipe_exists {
        return (
            StatusCode::NOT_FOUND,
            Json(DetailResponse {
                detail: "Recipe not found".to_string(),
            }),
        )
            .into_response();
    }

    let original_url = format!("{}/api/recipes/{}/", ctx.domain, id);

    match get_or_create_short_link(&mut conn, &original_url) {
        Ok(Some(link)) => (
            StatusCode::OK,
            Json(ShortLinkResponse {
                short_link: format!("{}/{}", ctx.domain, link.short_code),
            }),
        )
            .into_response(),
        Ok(None) => {
            tracing::error!("Exhausted short code attempts for {}", original_url);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to create short link".to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create short link: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to create short link".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_code_length() {
        assert_eq!(generate_short_code().len(), SHORT_CODE_LEN);
    }

    #[test]
    fn test_short_code_is_alphanumeric() {
        for _ in 0..100 {
            let code = generate_short_code();
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()), "{}", code);
        }
    }

    #[test]
    fn test_response_uses_hyphenated_key() {
        let response = ShortLinkResponse {
            short_link: "http://localhost:3000/aB3x9Z".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("short-link").is_some());
    }
}
