mod api;
mod auth;
mod csv_load;
mod db;
mod images;
mod models;
mod schema;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::Router;
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa_swagger_ui::SwaggerUi;

/// Shared state for all handlers: the connection pool plus the public
/// base URL used to build image and short-link URLs.
pub struct Context {
    pub pool: db::DbPool,
    pub domain: String,
}

pub type AppState = Arc<Context>;

/// Checked-out pooled connection, or an early-return 500 response.
#[macro_export]
macro_rules! get_conn {
    ($ctx:expr) => {
        match $ctx.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Failed to get DB connection: {}", e);
                return (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json($crate::api::ErrorResponse {
                        errors: "Database connection failed".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    };
}

#[derive(Parser)]
#[command(name = "tureen-server")]
#[command(about = "Tureen recipe-sharing API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Dump the OpenAPI spec as JSON and exit
    Openapi,
    /// Bulk-load ingredients and tags from headerless CSV files
    LoadCsv {
        /// CSV with `name,measurement_unit` rows
        #[arg(long)]
        ingredients: Option<PathBuf>,
        /// CSV with `name,slug` rows
        #[arg(long)]
        tags: Option<PathBuf>,
    },
}

fn init_telemetry() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn domain_from_env() -> String {
    env::var("DOMAIN_NAME")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Openapi) => {
            let spec = api::openapi().to_pretty_json()?;
            println!("{}", spec);
            Ok(())
        }
        Some(Commands::LoadCsv { ingredients, tags }) => {
            init_telemetry();
            let database_url = env::var("DATABASE_URL")?;
            let pool = db::create_pool(&database_url);
            csv_load::run(&pool, ingredients.as_deref(), tags.as_deref())
        }
        Some(Commands::Serve) | None => serve().await,
    }
}

async fn serve() -> anyhow::Result<()> {
    init_telemetry();

    let database_url = env::var("DATABASE_URL")?;
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let ctx: AppState = Arc::new(Context {
        pool: db::create_pool(&database_url),
        domain: domain_from_env(),
    });

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let app = Router::new()
        .merge(api::auth::router())
        .merge(api::users::router())
        .merge(api::tags::router())
        .merge(api::ingredients::router())
        .merge(api::recipes::router())
        .merge(api::media::router())
        .merge(api::short_links::router())
        .merge(swagger_ui)
        .with_state(ctx)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI available at /swagger-ui/");

    axum::serve(listener, app).await?;

    Ok(())
}
