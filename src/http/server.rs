//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Compose the edge middleware chain in order
//! - Own the limiter registries and their background sweepers
//! - Bind the server to a listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::LdapAdminChecker;
use crate::config::ConsoleConfig;
use crate::console::{ResourceRepository, SessionIssuer, SessionVerifier, StaticRepository};
use crate::http::api;
use crate::http::middleware::{
    api_rate_limit, attach_session, audit_log, connection_limit, login_rate_limit, origin_guard,
};
use crate::http::websocket::{namespace_stream, STREAM_ROUTE};
use crate::lifecycle::ShutdownSignal;
use crate::security::headers::with_security_headers;
use crate::security::{ConnectionLimiter, RateLimiterRegistry, TrustConfig};

/// Shared state for the edge middleware. Registries are constructed once per
/// server and injected here; each owns its own lock.
#[derive(Clone)]
pub struct EdgeState {
    pub trust: Arc<TrustConfig>,
    pub rate_limits: RateLimiterRegistry,
    pub rate_limit_enabled: bool,
    pub connections: Arc<ConnectionLimiter>,
    pub connection_retry_after: Duration,
    pub connection_sweep_interval: Duration,
    pub sessions: Option<Arc<dyn SessionVerifier>>,
}

impl EdgeState {
    pub fn new(config: &ConsoleConfig, sessions: Option<Arc<dyn SessionVerifier>>) -> Self {
        Self {
            trust: Arc::new(TrustConfig::from_settings(&config.trust)),
            rate_limits: RateLimiterRegistry::new(&config.rate_limit),
            rate_limit_enabled: config.rate_limit.enabled,
            connections: Arc::new(ConnectionLimiter::new(config.connections.max_per_ip)),
            connection_retry_after: Duration::from_secs(config.connections.retry_after_secs),
            connection_sweep_interval: Duration::from_secs(config.connections.sweep_interval_secs),
            sessions,
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn ResourceRepository>,
    pub issuer: Option<Arc<dyn SessionIssuer>>,
    pub ldap: Option<Arc<dyn LdapAdminChecker>>,
    pub ldap_timeout: Duration,
}

/// External collaborators supplied by the embedding application.
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn ResourceRepository>,
    pub sessions: Option<Arc<dyn SessionVerifier>>,
    pub issuer: Option<Arc<dyn SessionIssuer>>,
    pub ldap: Option<Arc<dyn LdapAdminChecker>>,
}

impl Collaborators {
    /// Static repository from config, no session or directory services.
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            repository: Arc::new(StaticRepository::new(&config.console)),
            sessions: None,
            issuer: None,
            ldap: None,
        }
    }
}

/// HTTP server for the console edge.
pub struct HttpServer {
    router: Router,
    edge: EdgeState,
    config: ConsoleConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ConsoleConfig, collaborators: Collaborators) -> Self {
        let edge = EdgeState::new(&config, collaborators.sessions);
        let app = AppState {
            repository: collaborators.repository,
            issuer: collaborators.issuer,
            ldap: collaborators.ldap,
            ldap_timeout: Duration::from_millis(config.ldap.lookup_timeout_ms),
        };

        let router = Self::build_router(&config, edge.clone(), app);
        Self {
            router,
            edge,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers wrap everything added before them, so the last `.layer` call
    /// is the outermost stage.
    fn build_router(config: &ConsoleConfig, edge: EdgeState, app: AppState) -> Router {
        let login = post(api::login).route_layer(middleware::from_fn_with_state(
            edge.clone(),
            login_rate_limit,
        ));

        let router = Router::new()
            .route("/healthz", get(api::healthz))
            .route("/api/auth/login", login)
            .route("/api/me", get(api::me))
            .route("/api/namespaces", get(api::list_namespaces))
            .route("/api/resources/{kind}", get(api::list_resources))
            .route(
                "/api/namespaces/{namespace}/access/{action}",
                get(api::check_access),
            )
            .route(STREAM_ROUTE, get(namespace_stream))
            .route(
                "/api/namespaces/{namespace}/{kind}/{name}",
                delete(api::delete_resource),
            )
            .with_state(app)
            .layer(middleware::from_fn(audit_log))
            .layer(middleware::from_fn_with_state(edge.clone(), attach_session))
            .layer(middleware::from_fn_with_state(edge.clone(), connection_limit))
            .layer(middleware::from_fn_with_state(edge.clone(), api_rate_limit))
            .layer(middleware::from_fn_with_state(edge, origin_guard));

        let router = if config.security.enable_headers {
            with_security_headers(router, config.trust.production)
        } else {
            router
        };

        router
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared edge state (registries, trust settings).
    pub fn edge(&self) -> &EdgeState {
        &self.edge
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            production = self.edge.trust.production,
            allowed_origins = self.edge.trust.allowed_origins.len(),
            max_ws_per_ip = self.edge.connections.max_per_ip(),
            "HTTP server starting"
        );

        let cleanup = self.edge.rate_limits.spawn_cleanup();
        let sweep = self
            .edge
            .connections
            .spawn_sweep(self.edge.connection_sweep_interval);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await;

        cleanup.stop().await;
        sweep.stop().await;
        served?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
