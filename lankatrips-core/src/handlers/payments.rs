use axum::{middleware, routing::post, Json, Router};
use serde_json::{json, Value};

use crate::auth::require_auth;
use crate::AppState;

/// Placeholder routes for the future card-payment gateway. Nothing is
/// captured today; receipts stay on PAY_LATER until this lands.
pub fn routes(state: AppState) -> Router<AppState> {
    let authed = Router::new()
        .route("/create-intent", post(create_payment_intent))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/webhook", post(webhook))
        .merge(authed)
}

/// POST /api/payments/create-intent
async fn create_payment_intent() -> Json<Value> {
    Json(json!({
        "success": false,
        "data": null,
        "message": "Payment gateway integration not implemented yet",
    }))
}

/// POST /api/payments/webhook
async fn webhook() -> Json<Value> {
    Json(json!({ "received": true }))
}
