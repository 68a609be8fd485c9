//! API Gateway service - router assembly and HTTP server.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::types::RequestDefaults;
use crate::handlers::{self, AppState};
use crate::middleware::create_cors_layer;
use crate::ports::outbound::LedgerNetwork;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Per-organization HTTP gateway
pub struct ApiGatewayService {
    config: GatewayConfig,
    network: Arc<dyn LedgerNetwork>,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    ///
    /// # Errors
    ///
    /// `GatewayError::Config` if the configuration does not validate.
    pub fn new(config: GatewayConfig, network: Arc<dyn LedgerNetwork>) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;
        Ok(Self { config, network })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the HTTP router with its middleware stack
    pub fn router(&self) -> Router {
        let state = AppState {
            network: Arc::clone(&self.network),
            defaults: Arc::new(RequestDefaults {
                issuer: self.config.defaults.issuer.clone(),
                operator: self.config.organization.operator.clone(),
            }),
            organization: Arc::from(self.config.organization.name.as_str()),
        };

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&self.config.cors))
            .layer(TimeoutLayer::new(self.config.timeouts.request))
            .map_response(IntoResponse::into_response)
            .layer(RequestBodyLimitLayer::new(self.config.limits.max_request_size));

        let api = Router::new()
            .route("/create", post(handlers::create))
            .route("/issue", post(handlers::issue))
            .route("/check", post(handlers::check))
            .route("/treat", post(handlers::treat))
            .route("/pay", post(handlers::pay))
            .route("/receive", post(handlers::receive))
            .route("/deliver", post(handlers::deliver))
            .route("/queryHistory", post(handlers::query_history))
            .route("/queryOperator", post(handlers::query_operator))
            .route("/queryIssuer", post(handlers::query_issuer))
            .route("/queryNamed", post(handlers::query_named))
            .route("/queryAdhoc", post(handlers::query_adhoc))
            .route("/queryAll", get(handlers::query_all));

        Router::new()
            .nest("/api", api)
            .route("/health", get(handlers::health_check))
            .layer(middleware)
            .with_state(state)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// `Bind` if the address is unavailable, `Internal` if the server fails.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.http.enabled {
            info!("HTTP server disabled");
            return Ok(());
        }
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// `Internal` if the server fails.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        info!(
            %addr,
            organization = %self.config.organization.name,
            msp_id = %self.config.organization.msp_id,
            "API Gateway listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        info!("API Gateway stopped");
        Ok(())
    }
}
