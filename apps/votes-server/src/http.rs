use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use crate::request_id::{self, MakeReqId};

// Leaves room for the per-call deadline to answer with a problem document first
const TIMEOUT_GRACE: Duration = Duration::from_secs(1);

async fn health_check() -> &'static str {
    "ok"
}

/// Wrap the module routes with the server-wide middleware stack.
///
/// Order, outermost first: PropagateRequestId -> SetRequestId -> Trace -> Timeout.
pub fn build_router(routes: Router, request_timeout: Option<Duration>) -> Router {
    let x_request_id = request_id::header();

    let mut router = routes.route("/health", get(health_check));

    if let Some(timeout) = request_timeout {
        router = router.layer(TimeoutLayer::new(timeout + TIMEOUT_GRACE));
    }

    router
        .layer(request_id::create_trace_layer())
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId))
        .layer(PropagateRequestIdLayer::new(x_request_id))
}
