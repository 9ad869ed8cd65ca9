//! Real-Estate Tax API Routes
//!
//! One POST endpoint per calculator, plus the active tables and cache stats.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use immo_tax::{
    CapitalGainsInput, CapitalGainsResult, CashflowInput, CashflowProjection, DepreciationInput,
    DepreciationResult, PropertyTaxInput, PropertyTaxResult, PurchaseCostInput,
    PurchaseCostResult, RateTables, RentalIncomeInput, RentalIncomeResult, TransferMode,
    TransferTaxInput, TransferTaxResult, YieldInput, YieldResult,
};
use structure_optimizer::StructureReport;

use crate::cache::CacheStats;
use crate::{ApiResponse, AppError, AppJson, AppState};

pub fn tax_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/tax/tables", get(get_tables))
        // Calculators
        .route("/api/tax/property", post(property_tax))
        .route("/api/tax/depreciation", post(depreciation))
        .route("/api/tax/capital-gains", post(capital_gains))
        .route("/api/tax/inheritance", post(inheritance_tax))
        .route("/api/tax/gift", post(gift_tax))
        .route("/api/tax/purchase-costs", post(purchase_costs))
        .route("/api/tax/yield", post(rental_yield))
        .route("/api/tax/cashflow", post(cashflow))
        .route("/api/tax/rental-income", post(rental_income))
        // Structure optimizer
        .route("/api/tax/structures", post(structures))
        .route("/api/tax/cache-stats", get(cache_stats))
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

/// Tables the calculators are currently using
async fn get_tables(State(state): State<AppState>) -> Json<ApiResponse<RateTables>> {
    Json(ApiResponse::success(state.model.tables().clone()))
}

async fn property_tax(
    State(state): State<AppState>,
    AppJson(input): AppJson<PropertyTaxInput>,
) -> Result<Json<ApiResponse<PropertyTaxResult>>, AppError> {
    let result = state.model.property_tax(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn depreciation(
    State(state): State<AppState>,
    AppJson(input): AppJson<DepreciationInput>,
) -> Result<Json<ApiResponse<DepreciationResult>>, AppError> {
    let result = state.model.depreciation(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn capital_gains(
    State(state): State<AppState>,
    AppJson(input): AppJson<CapitalGainsInput>,
) -> Result<Json<ApiResponse<CapitalGainsResult>>, AppError> {
    let result = state.model.capital_gains(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn inheritance_tax(
    State(state): State<AppState>,
    AppJson(input): AppJson<TransferTaxInput>,
) -> Result<Json<ApiResponse<TransferTaxResult>>, AppError> {
    let result = state.model.transfer_tax(&input, TransferMode::Inheritance)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn gift_tax(
    State(state): State<AppState>,
    AppJson(input): AppJson<TransferTaxInput>,
) -> Result<Json<ApiResponse<TransferTaxResult>>, AppError> {
    let result = state.model.transfer_tax(&input, TransferMode::Gift)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn purchase_costs(
    State(state): State<AppState>,
    AppJson(input): AppJson<PurchaseCostInput>,
) -> Result<Json<ApiResponse<PurchaseCostResult>>, AppError> {
    let result = state.model.purchase_costs(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn rental_yield(
    State(state): State<AppState>,
    AppJson(input): AppJson<YieldInput>,
) -> Result<Json<ApiResponse<YieldResult>>, AppError> {
    let result = state.model.rental_yield(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn cashflow(
    State(state): State<AppState>,
    AppJson(input): AppJson<CashflowInput>,
) -> Result<Json<ApiResponse<CashflowProjection>>, AppError> {
    let result = state.model.cashflow_projection(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

async fn rental_income(
    State(state): State<AppState>,
    AppJson(input): AppJson<RentalIncomeInput>,
) -> Result<Json<ApiResponse<RentalIncomeResult>>, AppError> {
    let result = state.model.rental_income(&input)?;
    Ok(Json(ApiResponse::success(result)))
}

/// Rank ownership structures for a sale. Runs on the blocking pool and is
/// memoized by input.
async fn structures(
    State(state): State<AppState>,
    AppJson(input): AppJson<CapitalGainsInput>,
) -> Result<Json<ApiResponse<StructureReport>>, AppError> {
    let optimizer = state.optimizer.clone();
    let cache = state.structure_cache.clone();

    let report = tokio::task::spawn_blocking(move || {
        cache.get_or_compute("structures", &input, || optimizer.optimize(&input))
    })
    .await
    .map_err(|e| AppError::Internal(format!("structure optimizer task failed: {e}")))??;

    Ok(Json(ApiResponse::success(report)))
}

async fn cache_stats(State(state): State<AppState>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::success(state.structure_cache.stats()))
}
