#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the farm survey dashboard.
//!
//! Holds one [`Dashboard`] behind a mutex. Chart interactions are posted to
//! `/api/interactions`; the handler applies them, redraws the immediate
//! charts, and schedules the deferred redraws on the Actix runtime. Chart
//! views are read back from `/api/charts/{chart}`. The built frontend is
//! served from `app/dist`.

pub mod config;
mod handlers;
pub mod interactive;

use std::sync::{Mutex, MutexGuard, PoisonError};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use farm_map_dashboard::{Dashboard, DashboardConfig};

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Debug)]
pub struct ServerState {
    /// The dashboard all requests act on.
    pub dashboard: Mutex<Dashboard>,
    /// Resolved server settings.
    pub config: ServerConfig,
    /// Settings the dashboard was built with.
    pub dashboard_config: DashboardConfig,
}

impl ServerState {
    /// Wraps a dashboard for sharing between workers.
    #[must_use]
    pub const fn new(
        dashboard: Dashboard,
        config: ServerConfig,
        dashboard_config: DashboardConfig,
    ) -> Self {
        Self {
            dashboard: Mutex::new(dashboard),
            config,
            dashboard_config,
        }
    }

    /// Locks the dashboard. A panic in another handler does not leave the
    /// dashboard half-updated, so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Dashboard> {
        self.dashboard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/config", web::get().to(handlers::config))
            .route("/filters", web::get().to(handlers::filters))
            .route("/state", web::get().to(handlers::state))
            .route("/charts/{chart}", web::get().to(handlers::chart))
            .route("/interactions", web::post().to(handlers::interactions)),
    );
}

/// Starts the farm map API server.
///
/// Loads the survey data from the configured data directory, builds the
/// dashboard, and starts the Actix-Web HTTP server. The caller is
/// responsible for the async runtime and for initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the survey data cannot be loaded,
/// the HTTP server fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let config = ServerConfig::from_env();
    let dashboard_config = config.dashboard_config();

    log::info!(
        "Loading survey data from {} ({} environment)...",
        config.data_dir.display(),
        config.environment
    );
    let dashboard = Dashboard::load(&config.data_dir, dashboard_config.clone()).map_err(|e| {
        log::error!("Failed to load survey data: {e}");
        std::io::Error::other(e)
    })?;

    let summary = dashboard.summary();
    log::info!(
        "Loaded {} farms ({} visible)",
        dashboard.state().dataset().farms().len(),
        summary.farm_count
    );

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let state = web::Data::new(ServerState::new(dashboard, config, dashboard_config));

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
