//! Test server wrapper that starts faultline on a random port

use std::net::SocketAddr;
use std::sync::Arc;

use faultline_config::Config;
use faultline_pipeline::ExceptionPipeline;
use faultline_server::Server;
use tokio_util::sync::CancellationToken;

use super::app;
use super::sink::MemorySink;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    sink: MemorySink,
}

impl TestServer {
    /// Start a test server serving the demo routes
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let sink = MemorySink::default();
        let pipeline = Arc::new(ExceptionPipeline::with_sink(&config.pipeline, Arc::new(sink.clone())));
        let server = Server::with_pipeline(&config, app::routes(), pipeline);

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let router = server
                .into_router()
                .layer(axum::middleware::from_fn(app::header_auth));

            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            sink,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Log records written by the server's pipeline
    pub fn sink(&self) -> &MemorySink {
        &self.sink
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
