//! End-to-end wire tests driving the router through `tower::ServiceExt::oneshot`,
//! covering the scenarios spec.md walks through: provisioning, token issuance,
//! usage submission, model selection and quota exhaustion, and aggregates.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use model_meter_api::routes::build_router;
use model_meter_api::state::AppState;
use model_meter_domain::{Pricebook, StaticModelEntry};
use model_meter_metering::SystemClock;
use model_meter_pricing::PricingResolver;
use model_meter_store::Store;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const PROVISIONING_KEY: &str = "test-provisioning-key";
const SIGNING_KEY: &[u8] = b"test-signing-key-0123456789abcdef";

fn pricebook() -> Pricebook {
    Pricebook::from_entries(vec![
        StaticModelEntry {
            label: "premium".into(),
            id: "model-premium".into(),
            input_price_usd_micros_per_1m: 3_000_000,
            output_price_usd_micros_per_1m: 15_000_000,
        },
        StaticModelEntry {
            label: "standard".into(),
            id: "model-standard".into(),
            input_price_usd_micros_per_1m: 500_000,
            output_price_usd_micros_per_1m: 1_500_000,
        },
    ])
}

async fn test_state() -> AppState {
    let store = Store::connect(":memory:", None).await.unwrap();
    AppState {
        store: Arc::new(store),
        pricing: Arc::new(PricingResolver::new(pricebook())),
        signing_key: Arc::from(SIGNING_KEY.to_vec().into_boxed_slice()),
        provisioning_api_key: Arc::from(PROVISIONING_KEY),
        clock: Arc::new(SystemClock),
        default_shard_count: 4,
        retention_days: 32,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn provisions_an_org_issues_a_token_and_meters_usage() {
    let state = test_state().await;
    let router = build_router(state);
    let org_id = Uuid::new_v4();

    let create_org = router
        .clone()
        .oneshot(
            json_request(
                "PUT",
                &format!("/orgs/{org_id}"),
                json!({
                    "display_name": "Acme",
                    "timezone": "UTC",
                    "quota_scope": "ORG",
                    "model_ordering": ["premium", "standard"],
                    "quotas": {"premium": 10_000, "standard": 10_000},
                    "shard_count": 4,
                }),
            )
            .header("x-provisioning-api-key", PROVISIONING_KEY),
        )
        .await
        .unwrap();
    assert_eq!(create_org.status(), StatusCode::OK);
    let org_body = body_json(create_org).await;
    let client_id = org_body["client_id"].as_str().unwrap().to_string();
    let client_secret = org_body["client_secret"].as_str().unwrap().to_string();

    let create_app = router
        .clone()
        .oneshot(
            json_request(
                "PUT",
                &format!("/orgs/{org_id}/apps/app-1"),
                json!({"display_name": "App One", "overrides": {}}),
            )
            .header("x-provisioning-api-key", PROVISIONING_KEY),
        )
        .await
        .unwrap();
    assert_eq!(create_app.status(), StatusCode::OK);

    let token_response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/token",
            json!({"grant_type": "client_credentials", "client_id": client_id, "client_secret": client_secret}),
        ))
        .await
        .unwrap();
    assert_eq!(token_response.status(), StatusCode::OK);
    let token_body = body_json(token_response).await;
    let access_token = token_body["access_token"].as_str().unwrap().to_string();

    let usage_response = router
        .clone()
        .oneshot(
            json_request(
                "POST",
                &format!("/orgs/{org_id}/apps/app-1/usage"),
                json!({
                    "request_id": "req-1",
                    "label": "premium",
                    "supplied_model_id": "model-premium",
                    "input_tokens": 1500,
                    "output_tokens": 800,
                    "status": "SUCCESS",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "calling_region": null,
                }),
            )
            .header("authorization", format!("Bearer {access_token}")),
        )
        .await
        .unwrap();
    assert_eq!(usage_response.status(), StatusCode::ACCEPTED);
    let usage_body = body_json(usage_response).await;
    assert_eq!(usage_body["cost_micros"], 16_500);
    assert_eq!(usage_body["is_new"], true);

    let selection_response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orgs/{org_id}/apps/app-1/model-selection"))
                .header("authorization", format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(selection_response.status(), StatusCode::OK);
    let selection_body = body_json(selection_response).await;
    assert_eq!(selection_body["label"], "premium");
    assert_eq!(selection_body["sticky_fallback_active"], false);

    let aggregates_response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/orgs/{org_id}/apps/app-1/aggregates/today"))
                .header("authorization", format!("Bearer {access_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(aggregates_response.status(), StatusCode::OK);
    let aggregates_body = body_json(aggregates_response).await;
    assert_eq!(aggregates_body["totals"]["cost_micros"], 16_500);
}

#[tokio::test]
async fn rejects_requests_without_a_bearer_token() {
    let state = test_state().await;
    let router = build_router(state);
    let org_id = Uuid::new_v4();

    let response = router
        .oneshot(
            Request::builder()
                .uri(format!("/orgs/{org_id}/apps/app-1/model-selection"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rejects_provisioning_writes_without_the_provisioning_key() {
    let state = test_state().await;
    let router = build_router(state);
    let org_id = Uuid::new_v4();

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/orgs/{org_id}"),
            json!({
                "display_name": "Acme",
                "timezone": "UTC",
                "quota_scope": "ORG",
                "model_ordering": ["premium"],
                "quotas": {"premium": 10_000},
                "shard_count": 4,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn batch_usage_rejects_more_than_one_hundred_records() {
    let state = test_state().await;
    let router = build_router(state.clone());
    let org_id = Uuid::new_v4();

    state
        .store
        .upsert_organization(&model_meter_domain::Organization {
            org_id,
            display_name: "Acme".into(),
            timezone: "UTC".into(),
            quota_scope: model_meter_domain::QuotaScope::Org,
            model_ordering: vec!["premium".into()],
            quotas: std::collections::HashMap::from([("premium".into(), 10_000)]),
            shard_count: 4,
            credentials: model_meter_domain::CredentialRecord::new("org-x".into(), "hash".into(), chrono::Utc::now()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        })
        .await
        .unwrap();
    state
        .store
        .upsert_application(&model_meter_domain::Application {
            org_id,
            app_id: "app-1".into(),
            display_name: "App One".into(),
            overrides: Default::default(),
            credentials: model_meter_domain::CredentialRecord::new("org-x-app-app-1".into(), "hash".into(), chrono::Utc::now()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let subject = model_meter_domain::Subject { org_id, app_id: Some("app-1".into()), client_id: "org-x-app-app-1".into() };
    let access = model_meter_security::issue_access_token(&subject, SIGNING_KEY).unwrap();

    let records: Vec<Value> = (0..101)
        .map(|i| {
            json!({
                "request_id": format!("req-{i}"),
                "label": "premium",
                "supplied_model_id": "model-premium",
                "input_tokens": 1,
                "output_tokens": 1,
                "status": "SUCCESS",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "calling_region": null,
            })
        })
        .collect();

    let response = router
        .oneshot(
            json_request("POST", &format!("/orgs/{org_id}/apps/app-1/usage/batch"), json!(records))
                .header("authorization", format!("Bearer {}", access.token)),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
