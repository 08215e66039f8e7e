//! API Routes
//!
//! Configures the Axum router with all document cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_handler, add_to_set_handler, create_collection_handler, find_handler, health_handler,
    list_collections_handler, pull_handler, push_handler, remove_handler, replace_handler,
    stats_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /collections` - List collection names
/// - `POST /collections` - Create a collection
/// - `GET /collections/:name/stats` - Collection statistics
/// - `POST /collections/:name/documents` - Add one or more documents
/// - `POST /collections/:name/find` - Query documents
/// - `POST /collections/:name/update` - Set fields on matched documents
/// - `POST /collections/:name/replace` - Replace matched documents
/// - `POST /collections/:name/push` - Append to an array field
/// - `POST /collections/:name/add-to-set` - Append unique values to an array field
/// - `POST /collections/:name/pull` - Remove values from an array field
/// - `POST /collections/:name/remove` - Delete matched documents
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let collection_routes = Router::new()
        .route("/stats", get(stats_handler))
        .route("/documents", post(add_handler))
        .route("/find", post(find_handler))
        .route("/update", post(update_handler))
        .route("/replace", post(replace_handler))
        .route("/push", post(push_handler))
        .route("/add-to-set", post(add_to_set_handler))
        .route("/pull", post(pull_handler))
        .route("/remove", post(remove_handler));

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/collections",
            get(list_collections_handler).post(create_collection_handler),
        )
        .nest("/collections/:name", collection_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
