// Bike Rental Reports - Web Server
// REST API with Axum over one in-memory snapshot

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use bike_rental_reports::{
    db, logging, output, ReportCatalog, ReportConfig, ReportError, ReportKind, Snapshot,
};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Parser)]
#[clap(name = "bike-reports-server", version, about = "HTTP API for the bike-rental reports")]
struct Args {
    /// SQLite database holding the rental dataset
    #[clap(long, env = "BIKE_REPORTS_DB", default_value = "rentals.db")]
    db: PathBuf,

    /// JSON file overriding report parameters
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(long, env = "BIKE_REPORTS_ADDR", default_value = "0.0.0.0:3000")]
    addr: String,
}

/// Shared application state; the snapshot is immutable, so no lock.
#[derive(Clone)]
struct AppState {
    snapshot: Arc<Snapshot>,
    catalog: Arc<ReportCatalog>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Serialize)]
struct ReportSummary {
    name: &'static str,
    title: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/reports - Names and titles of every report
async fn list_reports() -> impl IntoResponse {
    let reports: Vec<ReportSummary> = ReportKind::ALL
        .iter()
        .map(|kind| ReportSummary {
            name: kind.name(),
            title: kind.title(),
        })
        .collect();

    Json(ApiResponse::ok(reports))
}

/// GET /api/reports/:name - One computed report
async fn get_report(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let kind = match name.parse::<ReportKind>() {
        Ok(kind) => kind,
        Err(e) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<serde_json::Value>::err(e.to_string())),
            )
                .into_response()
        }
    };

    match state.catalog.run(kind, state.snapshot.as_ref()) {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(output::report_json(&report)))).into_response(),
        Err(e) => {
            error!(report = %name, error = %e, "report failed");
            let status = match e {
                ReportError::UnknownReport(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ApiResponse::<serde_json::Value>::err(e.to_string()))).into_response()
        }
    }
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/reports", get(list_reports))
        .route("/reports/:name", get(get_report))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    println!("🌐 Bike Rental Reports - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if !args.db.exists() {
        return Err(anyhow!(
            "database {:?} not found; run `bike-reports import <csv-dir>` or `bike-reports seed` first",
            args.db
        ));
    }

    let config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };

    let conn = db::open_database(&args.db)?;
    let snapshot = db::load_snapshot(&conn)?;
    println!("✓ Snapshot loaded from {:?}", args.db);
    for (relation, count) in snapshot.row_counts() {
        println!("  {:<16} {} rows", relation, count);
    }

    let state = AppState {
        snapshot: Arc::new(snapshot),
        catalog: Arc::new(ReportCatalog::new(config)),
    };

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    info!(addr = %args.addr, "server listening");
    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/reports", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app(state))
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bike_rental_reports::seed::sample_snapshot;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            snapshot: Arc::new(sample_snapshot()),
            catalog: Arc::new(ReportCatalog::default()),
        }
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_list_reports() {
        let (status, body) = get_json("/api/reports").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 8);
        assert_eq!(body["data"][0]["name"], "bikes-per-category");
    }

    #[tokio::test]
    async fn test_get_report() {
        let (status, body) = get_json("/api/reports/customer-segmentation").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rows"][0]["rental_count_category"], "more than 10");
    }

    #[tokio::test]
    async fn test_unknown_report_is_404() {
        let (status, body) = get_json("/api/reports/profit").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "unknown report: profit");
    }
}
