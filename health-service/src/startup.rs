//! Application startup and lifecycle management.

use crate::config::HealthServiceConfig;
use crate::services::{Database, HealthChecker, RedisService};
use crate::{build_router, db, AppState};
use axum::Router;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Wire the production collaborators and bind the listener.
    ///
    /// Port 0 binds a random port, which tests read back through [`Application::port`].
    pub async fn build(config: HealthServiceConfig) -> Result<Self, AppError> {
        let pool = db::create_pool(&config.database).map_err(|e| {
            tracing::error!("Failed to configure PostgreSQL pool: {}", e);
            AppError::from(e)
        })?;

        let redis = RedisService::new(&config.redis).map_err(|e| {
            tracing::error!("Failed to configure Redis client: {}", e);
            AppError::from(e)
        })?;

        let checker = HealthChecker::new(Arc::new(Database::new(pool)), Arc::new(redis));
        Self::with_checker(config, checker).await
    }

    /// Bind the listener around an already assembled checker.
    pub async fn with_checker(
        config: HealthServiceConfig,
        checker: HealthChecker,
    ) -> Result<Self, AppError> {
        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let router = build_router(AppState::new(config, checker));

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        tracing::info!(port = self.port, "Listening");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
