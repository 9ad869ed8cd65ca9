use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use immo_tax::TaxDomainModel;
use serde_json::{json, Value};
use structure_optimizer::StructureOptimizer;
use tower::ServiceExt;

use crate::{app, AppState};

fn test_state() -> AppState {
    AppState::new(TaxDomainModel::new(), StructureOptimizer::new(), 16)
}

async fn send(router: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn sale_body() -> Value {
    json!({
        "purchase_price": 300000.0,
        "sale_price": 500000.0,
        "purchase_date": "2021-03-01",
        "sale_date": "2024-03-01",
        "personal_tax_rate_percent": 42.0,
        "church_tax_rate_percent": 8.0
    })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(test_state()), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], "ok");
}

#[tokio::test]
async fn test_property_tax_route() {
    let (status, body) = send(
        app(test_state()),
        "POST",
        "/api/tax/property",
        Some(json!({
            "valuation": {"model": "market_value", "market_value": 500000.0},
            "jurisdiction": "urban",
            "property_type": "residential"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let final_tax = body["data"]["final_tax"].as_f64().unwrap();
    assert!((final_tax - 1_470.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_inheritance_and_gift_routes() {
    let input = json!({"gross_value": 150000.0, "relationship": "parent"});

    let (status, body) = send(app(test_state()), "POST", "/api/tax/inheritance", Some(input.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowance"].as_f64().unwrap(), 100_000.0);
    assert_eq!(body["data"]["tax_class"], "II");

    let (status, body) = send(app(test_state()), "POST", "/api/tax/gift", Some(input)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allowance"].as_f64().unwrap(), 20_000.0);
    assert_eq!(body["data"]["mode"], "gift");
}

#[tokio::test]
async fn test_unknown_jurisdiction_is_unprocessable() {
    let (status, body) = send(
        app(test_state()),
        "POST",
        "/api/tax/purchase-costs",
        Some(json!({"price": 300000.0, "jurisdiction": "xx"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("xx"));
}

#[tokio::test]
async fn test_unknown_relationship_uses_envelope() {
    let (status, body) = send(
        app(test_state()),
        "POST",
        "/api/tax/inheritance",
        Some(json!({"gross_value": 150000.0, "relationship": "cousin"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Unknown relationship code: cousin"));
}

#[tokio::test]
async fn test_german_alias_is_accepted() {
    let (status, body) = send(
        app(test_state()),
        "POST",
        "/api/tax/inheritance",
        Some(json!({"gross_value": 600000.0, "relationship": "kind"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["relationship"], "child");
    assert_eq!(body["data"]["allowance"].as_f64().unwrap(), 400_000.0);
    assert!((body["data"]["tax_amount"].as_f64().unwrap() - 19_000.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/tax/yield")
        .header("content-type", "application/json")
        .body(Body::from("{\"purchase_price\": "))
        .unwrap();
    let response = app(test_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let (status, body) = send(
        app(test_state()),
        "POST",
        "/api/tax/depreciation",
        Some(json!({
            "acquisition_cost": 0.0,
            "construction_year": 2000,
            "acquisition_year": 2020,
            "usage_category": "residential"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_structures_are_cached() {
    let state = test_state();

    let (status, first) = send(app(state.clone()), "POST", "/api/tax/structures", Some(sale_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["candidates"][0]["name"], "Share Deal (GmbH)");

    let (_, second) = send(app(state.clone()), "POST", "/api/tax/structures", Some(sale_body())).await;
    assert_eq!(first, second);

    let (status, stats) = send(app(state), "GET", "/api/tax/cache-stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["size"], 1);
    assert_eq!(stats["data"]["lookups"], 2);
    assert_eq!(stats["data"]["hits"], 1);
}

#[tokio::test]
async fn test_remaining_calculator_routes() {
    let state = test_state();

    let (status, body) = send(app(state.clone()), "POST", "/api/tax/capital-gains", Some(sale_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_taxable"], true);

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/tax/yield",
        Some(json!({
            "purchase_price": 300000.0,
            "purchase_costs": 30000.0,
            "annual_rent": 18000.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["projection"].as_array().unwrap().len(), 10);

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/tax/cashflow",
        Some(json!({"monthly_rent": 1200.0, "years": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["years"].as_array().unwrap().len(), 3);

    let (status, body) = send(
        app(state.clone()),
        "POST",
        "/api/tax/rental-income",
        Some(json!({"annual_rent": 12000.0, "interest": 3000.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["taxable_surplus"].as_f64().unwrap(), 9_000.0);

    let (status, body) = send(app(state), "GET", "/api/tax/tables", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["purchase_costs"]["transfer_tax_rates"]["by"], 3.5);
}
