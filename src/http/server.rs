//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, CORS, security headers,
//!   API key, rate limiting)
//! - Bind server to listener
//! - Graceful shutdown on SIGINT or SIGTERM

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{header, HeaderName, HeaderValue, Method, Request};
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::game::GameService;
use crate::http::{handlers, middleware};
use crate::security::{ApiKeyPolicy, RateLimiter};

pub const X_REQUEST_ID: &str = "x-request-id";

const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: GameService,
    pub environment: Arc<str>,
    pub rpc_url: Arc<str>,
    pub module_name: Arc<str>,
    pub started: Instant,
    /// Present while `security.rate_limit_per_minute` is above 0.
    pub limiter: Option<Arc<RateLimiter>>,
    /// Present while `security.api_key` is set.
    pub api_key: Option<ApiKeyPolicy>,
}

/// HTTP server for the wager API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpServer {
    pub fn new(config: AppConfig, service: GameService) -> Self {
        let limiter = RateLimiter::per_minute(config.security.rate_limit_per_minute).map(Arc::new);
        let state = AppState {
            service,
            environment: Arc::from(config.environment.as_str()),
            rpc_url: Arc::from(config.chain.rpc_url.as_str()),
            module_name: Arc::from(config.chain.module_name.as_str()),
            started: Instant::now(),
            limiter: limiter.clone(),
            api_key: ApiKeyPolicy::from_config(&config.security),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let api = Router::new()
            .route("/api/v1/info", get(handlers::info))
            .route("/api/v1/status", get(handlers::status))
            .route("/api/v1/games/stake", post(handlers::stake_game))
            .route("/api/v1/games/pay_winner", post(handlers::pay_winner))
            .route("/api/v1/games/stakes/{address}", get(handlers::stake_history))
            .route("/api/v1/games/history/{address}", get(handlers::game_history))
            .route("/api/v1/games/stats", get(handlers::game_stats))
            .route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                middleware::require_api_key,
            ));

        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .merge(api)
            .fallback(handlers::not_found)
            .with_state(state.clone())
            .layer(axum_middleware::from_fn_with_state(state, middleware::rate_limit))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(middleware::handle_layer_error))
                    .timeout(Duration::from_secs(config.timeouts.request_secs)),
            );

        if config.security.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers([
                        header::CONTENT_TYPE,
                        header::AUTHORIZATION,
                        HeaderName::from_static("x-requested-with"),
                        HeaderName::from_static("x-api-key"),
                    ])
                    .max_age(CORS_MAX_AGE),
            );
        }

        if config.security.enable_headers {
            router = router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_XSS_PROTECTION,
                    HeaderValue::from_static("1; mode=block"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            rate_limit_per_minute = self.config.security.rate_limit_per_minute,
            api_key = self.config.security.api_key().is_some(),
            "HTTP server starting"
        );

        let sweeper = self.limiter.clone().map(|limiter| {
            let idle = Duration::from_secs(self.config.security.rate_limit_idle_secs.max(1));
            tokio::spawn(sweep_idle_clients(limiter, idle))
        });

        let served = axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        if let Some(task) = sweeper {
            task.abort();
        }
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Evict idle limiter buckets every `idle` period until aborted.
async fn sweep_idle_clients(limiter: Arc<RateLimiter>, idle: Duration) {
    let mut ticker = tokio::time::interval(idle);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let evicted = limiter.evict_idle(idle);
        if evicted > 0 {
            tracing::debug!(evicted, tracked = limiter.tracked_clients(), "Evicted idle rate limit buckets");
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// The SIGTERM handler is registered when this is called, not when the
/// future is first polled, so call it from within the runtime.
fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());

    async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => tracing::info!("Shutdown signal received (SIGINT)"),
            _ = terminate => tracing::info!("Shutdown signal received (SIGTERM)"),
        }
    }
}
