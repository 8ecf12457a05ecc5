use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::checkin::{
    close_station, get_station, open_station, report_fault, retry, submit_scan,
};
use crate::handlers::health_check;
use crate::state::AppState;

pub fn create_routes(state: Arc<AppState>) -> Router {
    let checkin = Router::new()
        .route(
            "/:event_id",
            post(open_station).get(get_station).delete(close_station),
        )
        .route("/:event_id/scans", post(submit_scan))
        .route("/:event_id/scanner-faults", post(report_fault))
        .route("/:event_id/retry", post(retry));

    Router::new()
        .route("/health", get(health_check))
        .nest("/checkin", checkin)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
}
