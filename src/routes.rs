use crate::{config::AllowedOrigins, handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Inline base64 images travel in the JSON body. Kept a little above
/// `MAX_MOMENT_BYTES` so JSON overhead does not mask the validation message.
pub const BODY_LIMIT_BYTES: usize = 512 * 1024;

fn cors_layer(origins: &AllowedOrigins) -> CorsLayer {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::from(Any),
        AllowedOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>, origins: &AllowedOrigins) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/moments", get(handlers::list_moments).post(handlers::create_moment))
        .route("/moments/{id}", delete(handlers::delete_moment))
        // Middleware Layers
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state) // Pass the application state
}
