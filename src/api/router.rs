//! HTTP router.
//!
//! Routes are nested under `/api/` apart from the service info at `/`.
//! Path params use `:param` syntax (axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::handlers;
use super::state::AppState;
use crate::domain::MAX_IMAGE_BYTES;

/// Uploads up to the image limit plus multipart framing.
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 5 * 1024 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    let patients = Router::new()
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route("/patients/stats", get(handlers::patient_stats))
        .route(
            "/patients/:id",
            get(handlers::get_patient).delete(handlers::delete_patient),
        );

    let diagnosis = Router::new()
        .route("/diagnosis/predict", post(handlers::predict))
        .route("/diagnosis/upload-csv", post(handlers::upload_csv))
        .route("/diagnosis/analyze-image", post(handlers::analyze_image))
        .route("/diagnosis/symptoms", get(handlers::symptoms))
        .route("/diagnosis/diseases", get(handlers::diseases))
        .route("/diagnosis/history", get(handlers::history));

    let data = Router::new()
        .route("/data/seed", post(handlers::seed))
        .route("/data/reseed", post(handlers::reseed))
        .route("/data/train", post(handlers::train))
        .route("/data/export", get(handlers::export));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(patients)
        .merge(diagnosis)
        .merge(data);

    Router::new()
        .route("/", get(handlers::root))
        .nest("/api", api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
}
