use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::{metrics_middleware, metrics_router};
use crate::modules::auth::router::init_auth_router;
use crate::modules::health::health;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// The application router.
///
/// With a Prometheus handle, `/metrics` is served and every request is
/// counted. Rate limits key on the peer address, so a router built with
/// limits enabled must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn init_router(state: AppState, metrics: Option<PrometheusHandle>) -> anyhow::Result<Router> {
    let mut api = Router::new()
        .nest("/auth", init_auth_router(&state.rate_limit_config)?)
        .nest("/users", init_users_router(&state));

    if state.rate_limit_config.enabled {
        api = api.layer(GovernorLayer::new(
            state.rate_limit_config.general_governor_config()?,
        ));
    }

    let mut app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health))
        .merge(api);

    if let Some(handle) = metrics {
        app = app
            .merge(metrics_router(handle))
            .layer(middleware::from_fn(metrics_middleware));
    }

    Ok(app
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(logging_middleware)))
}
