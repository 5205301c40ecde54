//! HTTP handler functions for the farm map API.

use std::time::Instant;

use actix_web::{HttpResponse, web};
use farm_map_dashboard::DashboardError;
use farm_map_dashboard_models::{ChartKind, Interaction};
use farm_map_server_models::{ApiError, ApiHealth};

use crate::ServerState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/config`
///
/// Returns the environment, survey API URL, deferred delay, and farm-size
/// breakpoints the dashboard runs with.
pub async fn config(state: web::Data<ServerState>) -> HttpResponse {
    HttpResponse::Ok().json(state.config.to_api(&state.dashboard_config))
}

/// `GET /api/filters`
pub async fn filters(state: web::Data<ServerState>) -> HttpResponse {
    let dashboard = state.lock();
    HttpResponse::Ok().json(dashboard.filters())
}

/// `GET /api/state`
///
/// Summary of the filtered dataset.
pub async fn state(state: web::Data<ServerState>) -> HttpResponse {
    HttpResponse::Ok().json(state.lock().summary())
}

/// `GET /api/charts/{chart}`
///
/// Returns the latest view of a chart.
pub async fn chart(state: web::Data<ServerState>, path: web::Path<String>) -> HttpResponse {
    let name = path.into_inner();
    let Ok(kind) = name.parse::<ChartKind>() else {
        return HttpResponse::NotFound().json(ApiError::new(format!("Unknown chart: {name}")));
    };

    match state.lock().chart_view(kind) {
        Ok(Some(view)) => HttpResponse::Ok().json(view),
        Ok(None) => {
            HttpResponse::NotFound().json(ApiError::new(format!("Chart {kind} is not rendered")))
        }
        Err(e @ DashboardError::UnknownChart(_)) => {
            HttpResponse::NotFound().json(ApiError::new(e.to_string()))
        }
        Err(e) => {
            log::error!("Failed to render {kind}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to render chart"))
        }
    }
}

/// `POST /api/interactions`
///
/// Applies a chart interaction. The immediate charts are redrawn before
/// responding; deferred redraws run on the runtime once their delay has
/// passed.
pub async fn interactions(
    state: web::Data<ServerState>,
    body: web::Json<Interaction>,
) -> HttpResponse {
    let interaction = body.into_inner();

    let (result, delay) = {
        let mut dashboard = state.lock();
        (
            dashboard.handle(&interaction, Instant::now()),
            dashboard.defer_delay(),
        )
    };

    match result {
        Ok(outcome) => {
            if !outcome.deferred.is_empty() {
                let state = state.clone();
                actix_rt::spawn(async move {
                    actix_rt::time::sleep(delay).await;
                    let ran = state.lock().run_due(Instant::now());
                    log::debug!("Deferred redraws: {ran:?}");
                });
            }
            HttpResponse::Ok().json(outcome)
        }
        Err(e) => {
            log::warn!("Rejected {} interaction: {e}", interaction.event_kind());
            HttpResponse::BadRequest().json(ApiError::new(e.to_string()))
        }
    }
}
