use crate::api::{DetailResponse, ErrorResponse};
use crate::get_conn;
use crate::schema::short_links;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use diesel::prelude::*;
use utoipa::OpenApi;

/// Returns the router for short-link redirects, mounted at the site root
pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/{short_code}", axum::routing::get(redirect_short_link))
        .route("/{short_code}/", axum::routing::get(redirect_short_link))
}

#[utoipa::path(
    get,
    path = "/{short_code}/",
    tag = "short_links",
    params(
        ("short_code" = String, Path, description = "6-character short code")
    ),
    responses(
        (status = 307, description = "Redirect to the recipe's canonical URL"),
        (status = 404, description = "Unknown short code", body = DetailResponse)
    )
)]
pub async fn redirect_short_link(
    State(ctx): State<AppState>,
    Path(short_code): Path<String>,
) -> impl IntoResponse {
    let mut conn = get_conn!(ctx);

    let original_url: String = match short_links::table
        .filter(short_links::short_code.eq(&short_code))
        .select(short_links::original_url)
        .first(&mut conn)
    {
        Ok(url) => url,
        Err(diesel::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "Short link does not exist".to_string(),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to resolve short link: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    errors: "Failed to resolve short link".to_string(),
                }),
            )
                .into_response();
        }
    };

    Redirect::temporary(&original_url).into_response()
}

#[derive(OpenApi)]
#[openapi(paths(redirect_short_link))]
pub struct ApiDoc;
