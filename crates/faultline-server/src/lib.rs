mod envelope;
mod failure;
mod fallback;
mod health;
mod panic_stack;
mod request_context;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use faultline_config::Config;
use faultline_pipeline::ExceptionPipeline;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub use envelope::failure_for_partial;
pub use failure::Failure;
pub use request_context::record_view;

/// Assembled server with routes and error-envelope middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build a server exposing only the built-in routes
    pub fn new(config: &Config) -> Self {
        Self::with_routes(config, Router::new())
    }

    /// Build a server around application routes
    ///
    /// Every error response the routes produce, including framework
    /// rejections and panics, leaves as an error envelope.
    pub fn with_routes(config: &Config, routes: Router) -> Self {
        let pipeline = Arc::new(ExceptionPipeline::new(&config.pipeline));
        Self::with_pipeline(config, routes, pipeline)
    }

    /// Build a server around application routes and a prepared pipeline
    pub fn with_pipeline(config: &Config, routes: Router, pipeline: Arc<ExceptionPipeline>) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let mut app = routes;

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.fallback(fallback::not_found_handler);

        // Apply middleware layers (innermost first)

        // Request context (innermost, sees identity set by outer layers)
        app = app.layer(axum::middleware::from_fn(request_context::request_context_middleware));

        // Handler panics become raised failures carrying the panic-site stack
        panic_stack::install();
        app = app.layer(CatchPanicLayer::custom(envelope::panic_response));

        // Error envelopes
        app = app.layer(axum::middleware::from_fn_with_state(pipeline, envelope::envelope_middleware));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Self {
            router: app,
            listen_address,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
