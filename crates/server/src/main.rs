use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use notifier::PushDispatcher;
use order_api::{list_projects, project_by_slug, submit_order, ApiContext};
use serde::Deserialize;
use shared::{
    catalog::Catalog,
    domain::ProjectView,
    error::{ApiError, ErrorCode},
    locale::Locale,
    protocol::{SubmitOrderRequest, SubmitOrderResponse},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, Settings};

const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct LocaleQuery {
    locale: Option<String>,
}

impl LocaleQuery {
    fn locale(&self) -> Locale {
        Locale::parse_or_default(self.locale.as_deref())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let settings = load_settings();
    let api = build_api_context(&settings)?;
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_api_context(settings: &Settings) -> anyhow::Result<ApiContext> {
    let catalog = match &settings.catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("failed to load catalog from '{path}'"))?,
        None => Catalog::builtin().context("built-in catalog is invalid")?,
    };
    info!(projects = catalog.len(), "catalog loaded");

    let push = settings.push_config()?;
    if push.credentials.is_none() {
        warn!("LINE credentials missing; order submissions will fail until configured");
    }
    let dispatcher = PushDispatcher::new(push).context("failed to build push client")?;

    Ok(ApiContext {
        catalog: Arc::new(catalog),
        dispatcher: Arc::new(dispatcher),
    })
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/projects", get(http_list_projects))
        .route("/api/projects/:slug", get(http_project_by_slug))
        .route("/api/orders", post(http_submit_order))
        .route("/api/send-line-notify", post(http_submit_order))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_list_projects(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LocaleQuery>,
) -> Json<Vec<ProjectView>> {
    Json(list_projects(&state.api, q.locale()))
}

async fn http_project_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(q): Query<LocaleQuery>,
) -> Result<Json<ProjectView>, (StatusCode, Json<ApiError>)> {
    let view = project_by_slug(&state.api, &slug, q.locale()).map_err(into_response_error)?;
    Ok(Json(view))
}

async fn http_submit_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitOrderRequest>, JsonRejection>,
) -> Result<Json<SubmitOrderResponse>, (StatusCode, Json<ApiError>)> {
    let Json(request) = payload.map_err(|rejection| {
        (
            rejection.status(),
            Json(
                ApiError::new(ErrorCode::Validation, "malformed order request")
                    .with_details(rejection.body_text()),
            ),
        )
    })?;
    let response = submit_order(&state.api, request, Utc::now())
        .await
        .map_err(into_response_error)?;
    Ok(Json(response))
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotConfigured | ErrorCode::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_response_error(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(error.code), Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
