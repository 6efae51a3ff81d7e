//! ServerBuilder for fluent API to build HTTP servers

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::AppConfig;
use crate::core::document::{DocumentRenderer, TextPdfRenderer};
use crate::core::error::EstateResult;
use crate::core::files::FileStore;
use crate::core::generator::DocumentGenerator;
use crate::storage::{EntityStores, LocalFileStore};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for the estate HTTP server
///
/// Every collaborator has a default: in-memory stores, a local file store
/// rooted at `files.root` and the built-in text PDF renderer.
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(AppConfig::load(None)?)
///     .with_stores(EntityStores::mongodb(database).await?)
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: AppConfig,
    stores: Option<EntityStores>,
    files: Option<Arc<dyn FileStore>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            stores: None,
            files: None,
            renderer: None,
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_stores(mut self, stores: EntityStores) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Replace the built-in text PDF renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Add routes that don't belong to a resource, merged at the root
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the transport-agnostic host
    ///
    /// Store calls and renders are bounded by the configured timeouts.
    pub fn build_host(self) -> EstateResult<ServerHost> {
        let config = self.config;

        let stores = self
            .stores
            .unwrap_or_else(EntityStores::in_memory)
            .with_timeout(config.timeouts.store());

        let files = match self.files {
            Some(files) => files,
            None => Arc::new(LocalFileStore::new(config.files.root.clone())),
        };

        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => Arc::new(TextPdfRenderer::new()?.with_mode(config.pagination.filter_mode)),
        };

        let generator = DocumentGenerator::new(renderer)
            .with_file_store(files.clone())
            .with_mode(config.pagination.filter_mode)
            .with_timeout(config.timeouts.render());

        Ok(ServerHost::new(config, stores, files, generator))
    }

    /// Build the host and expose it over REST
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        Ok(RestExposure::build_router(host, custom_routes))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds `addr`, serves until SIGTERM or Ctrl+C, then drains in-flight
    /// requests.
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
