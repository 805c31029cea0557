use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::api_key::{api_key_gate, API_KEY_HEADER};
use crate::config::Config;
use crate::controllers::AppState;
use crate::mailer::{self, Mailer};
use crate::migrations::Migrator;
use crate::openapi::ApiDoc;
use crate::routing;

const API_DOCS_PATH: &str = "/api-docs";
const API_DOCS_JSON_PATH: &str = "/api-docs/openapi.json";

/// The Slice application: configuration, database and mail delivery.
pub struct App {
    pub config: Config,
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
}

impl App {
    /// Build the application from environment configuration.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    /// Build the application with a given config.
    ///
    /// Connects to the database and applies pending migrations.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = crate::db::connect(&config).await?;

        tracing::info!("Running pending database migrations...");
        Migrator::up(&db, None).await?;
        tracing::info!("Migrations complete.");

        let mailer = mailer::from_config(&config);

        Ok(App { config, db, mailer })
    }

    /// Replace the mail transport.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    fn state(&self) -> AppState {
        AppState {
            db: self.db.clone(),
            config: Arc::new(self.config.clone()),
            mailer: self.mailer.clone(),
        }
    }

    /// Build the full router with middleware.
    pub fn router(&self) -> Router {
        let state = self.state();
        let config = state.config.clone();

        if config.api_key.is_none() {
            tracing::warn!("API_KEY is not set, the x-api-key gate is disabled");
        }

        let openapi_spec = ApiDoc::openapi();
        let openapi_json = openapi_spec.clone();

        let x_request_id = HeaderName::from_static("x-request-id");

        routing::build_routes()
            .fallback(routing::not_found)
            .with_state(state.clone())
            .merge(Scalar::with_url(API_DOCS_PATH, openapi_spec))
            .route(
                API_DOCS_JSON_PATH,
                get(move || {
                    let spec = openapi_json.clone();
                    async move { axum::Json(spec) }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state, api_key_gate))
            .layer(axum::Extension(config.clone()))
            .layer(cors_layer(&config))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                    .on_request(DefaultOnRequest::new().level(tracing::Level::DEBUG))
                    .on_response(
                        DefaultOnResponse::new()
                            .level(tracing::Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Slice server running on http://{}", addr);
        tracing::info!("API docs at http://{}{}", addr, API_DOCS_PATH);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// CORS for the web client: its origin only, with credentials.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .allow_credentials(true);

    match HeaderValue::from_str(config.frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(
                "FRONTEND_URL {:?} is not a valid origin, cross-origin requests will be refused",
                config.frontend_url
            );
            layer
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down Slice server...");
}
