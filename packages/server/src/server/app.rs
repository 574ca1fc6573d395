//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post},
    Router,
};
use payu::{PayUOptions, PayUService};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub payu: Arc<PayUService>,
    pub jwt_service: Arc<JwtService>,
    pub config: Arc<Config>,
}

/// Build the Axum application router.
///
/// Everything under /api speaks the `{ success, error?, ...payload }` JSON
/// envelope; /health sits outside the rate limit.
pub fn build_app(pool: PgPool, config: Config) -> Router {
    let payu = Arc::new(PayUService::new(PayUOptions {
        merchant_key: config.payu_merchant_key.clone(),
        merchant_salt: config.payu_merchant_salt.clone(),
        base_url: config.payu_base_url.clone(),
    }));

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    // CORS: configured origins, or any origin when none are configured
    // (development).
    let allow_origin = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let rate_limit_enabled = config.rate_limit_enabled;

    let app_state = AppState {
        db_pool: pool,
        payu,
        jwt_service: jwt_service.clone(),
        config: Arc::new(config),
    };

    let mut api = Router::new()
        // Catalog browsing + admin CRUD
        .route("/events", get(routes::list_events).post(routes::create_event))
        .route(
            "/events/:id",
            get(routes::get_event)
                .put(routes::update_event)
                .delete(routes::delete_event),
        )
        .route(
            "/workshops",
            get(routes::list_workshops).post(routes::create_workshop),
        )
        .route(
            "/workshops/:id",
            get(routes::get_workshop)
                .put(routes::update_workshop)
                .delete(routes::delete_workshop),
        )
        // Identity
        .route("/member/sync", post(routes::sync_member))
        .route("/member/me", get(routes::current_member))
        // Cart
        .route("/cart/:user_id", get(routes::get_cart))
        .route("/cart/add", post(routes::add_event_to_cart))
        .route("/cart/workshop/add", post(routes::add_workshop_to_cart))
        .route("/cart/:user_id/:item_id", delete(routes::remove_event_from_cart))
        .route(
            "/cart/workshop/:user_id/:item_id",
            delete(routes::remove_workshop_from_cart),
        )
        // Combo packages
        .route("/combo/catalog", get(routes::combo_catalog))
        .route("/combo/select", post(routes::select_combo))
        .route("/combo/clear/:user_id", post(routes::clear_combo))
        .route("/combo/active/:user_id", get(routes::active_combo))
        // Payment
        .route("/payment/initiate", post(routes::initiate_payment))
        .route("/payment/status/:order_id", get(routes::payment_status))
        .route("/payment/verify", post(routes::verify_payment));

    if rate_limit_enabled {
        // 10 requests per second per IP with bursts of 20; IP taken from
        // X-Forwarded-For behind the reverse proxy.
        let rate_limit_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(10)
                .burst_size(20)
                .use_headers()
                .finish()
                .expect("Rate limiter configuration is valid and should never fail"),
        );
        api = api.layer(GovernorLayer {
            config: rate_limit_config,
        });
    }

    let jwt_service_for_middleware = jwt_service;

    Router::new()
        .nest("/api", api)
        // Health check (no rate limit)
        .route("/health", get(routes::health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
