//! Real-Estate Tax API
//!
//! JSON endpoints over the tax calculators and the structure optimizer.

pub mod cache;
pub mod config;
pub mod tax_routes;

#[cfg(test)]
mod route_tests;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use immo_core::TaxError;
use immo_tax::{RateTables, TaxDomainModel};
use serde::{Deserialize, Serialize};
use structure_optimizer::{StructureCatalogue, StructureOptimizer, StructureReport};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::CalculationCache;
use crate::config::ServerConfig;

/// Envelope for every response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// JSON body extractor whose rejections use the [`ApiResponse`] envelope
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Tax(#[from] TaxError),
    /// Malformed body, or a category code no table knows
    #[error("{}", .0.body_text())]
    Rejected(#[from] JsonRejection),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Tax(TaxError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            AppError::Tax(TaxError::UnknownCategory { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Tax(TaxError::InvalidConfiguration(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Rejected(rejection) => rejection.status(),
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub model: TaxDomainModel,
    pub optimizer: Arc<StructureOptimizer>,
    pub structure_cache: Arc<CalculationCache<StructureReport>>,
}

impl AppState {
    pub fn new(model: TaxDomainModel, optimizer: StructureOptimizer, cache_capacity: usize) -> Self {
        Self {
            model,
            optimizer: Arc::new(optimizer),
            structure_cache: Arc::new(CalculationCache::new(cache_capacity)),
        }
    }

    /// Build the state, loading table overrides named in the config.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let model = match &config.tables_path {
            Some(path) => {
                let tables = RateTables::from_json_file(path)
                    .with_context(|| format!("loading rate tables from {}", path.display()))?;
                TaxDomainModel::with_tables(tables)?
            }
            None => TaxDomainModel::new(),
        };

        let catalogue = match &config.structures_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let catalogue = StructureCatalogue::from_json_str(&json)
                    .with_context(|| format!("parsing structure catalogue {}", path.display()))?;
                tracing::info!("Loaded structure catalogue from {}", path.display());
                catalogue
            }
            None => StructureCatalogue::default(),
        };
        let optimizer =
            StructureOptimizer::with_catalogue(catalogue, model.tables().capital_gains.clone())?;

        Ok(Self::new(model, optimizer, config.cache_capacity))
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(tax_routes::tax_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn init_tracing(json_logging: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

pub async fn run_server() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.json_logging);

    let state = AppState::from_config(&config)?;
    if state.structure_cache.is_enabled() {
        tracing::info!("Structure cache enabled ({} entries)", config.cache_capacity);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Tax API listening on {}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
