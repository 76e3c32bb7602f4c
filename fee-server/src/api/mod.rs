//! HTTP API for the fee server
//!
//! Every route except `/health` is scoped by an explicit `school_id` path segment.

pub mod fees;
pub mod health;
pub mod payments;
pub mod quarter;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the router
pub fn create_router(state: AppState) -> Router {
    let fees = Router::new()
        .route(
            "/api/schools/{school_id}/students/{student_id}/fee-breakdown",
            get(fees::fee_breakdown),
        )
        .route(
            "/api/schools/{school_id}/classes/{class_id}/summary",
            get(fees::class_summary),
        )
        .route(
            "/api/schools/{school_id}/fee-components",
            post(fees::create_component),
        )
        .route(
            "/api/schools/{school_id}/fee-components/{id}/deactivate",
            post(fees::deactivate_component),
        )
        .route(
            "/api/schools/{school_id}/fee-components/{id}/reactivate",
            post(fees::reactivate_component),
        )
        .route(
            "/api/schools/{school_id}/quarter-split",
            post(quarter::quarter_split),
        );

    let payments = Router::new()
        .route(
            "/api/schools/{school_id}/payments/verify",
            post(payments::verify_payment),
        )
        .route(
            "/api/schools/{school_id}/payments/callback",
            post(payments::gateway_callback),
        )
        .route(
            "/api/schools/{school_id}/payment-orders",
            post(payments::create_order),
        )
        .route(
            "/api/schools/{school_id}/students/{student_id}/adjustments",
            post(payments::create_adjustment),
        )
        .route(
            "/api/schools/{school_id}/students/{student_id}/transactions",
            get(payments::student_transactions),
        )
        .route(
            "/api/schools/{school_id}/fee-components/{id}/transactions",
            get(payments::component_transactions),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .merge(fees)
        .merge(payments)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
