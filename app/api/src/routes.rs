//! Wires the wire surface from spec.md §6.1 onto axum routers, each
//! guarded by the middleware layer its auth model requires.

use crate::handlers::{aggregates, auth, health, profiles, provisioning, selection, usage};
use crate::middleware::{require_access_token, require_provisioning_key};
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let provisioning_routes = Router::new()
        .route("/orgs/:org_id", put(provisioning::upsert_org))
        .route("/orgs/:org_id/apps/:app_id", put(provisioning::upsert_app))
        .route("/orgs/:org_id/credentials/rotate", post(provisioning::rotate_org_credentials))
        .route("/orgs/:org_id/apps/:app_id/credentials/rotate", post(provisioning::rotate_app_credentials))
        .layer(middleware::from_fn_with_state(state.clone(), require_provisioning_key));

    let tenant_routes = Router::new()
        .route("/orgs/:org_id/apps/:app_id/inference-profiles", post(profiles::register_profile).get(profiles::list_profiles))
        .route("/orgs/:org_id/apps/:app_id/inference-profiles/:label", get(profiles::get_profile))
        .route("/orgs/:org_id/apps/:app_id/model-selection", get(selection::get_selection))
        .route("/orgs/:org_id/apps/:app_id/usage", post(usage::submit_one))
        .route("/orgs/:org_id/apps/:app_id/usage/batch", post(usage::submit_batch))
        .route("/orgs/:org_id/aggregates/today", get(aggregates::org_today))
        .route("/orgs/:org_id/apps/:app_id/aggregates/today", get(aggregates::app_today))
        .route("/orgs/:org_id/aggregates/:date", get(aggregates::org_historical))
        .route("/orgs/:org_id/apps/:app_id/aggregates/:date", get(aggregates::app_historical))
        .layer(middleware::from_fn_with_state(state.clone(), require_access_token));

    let auth_routes = Router::new()
        .route("/auth/token", post(auth::issue_token))
        .route("/auth/revoke", post(auth::revoke));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes)
        .merge(provisioning_routes)
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
