// Bank Analytics - Web Server
// REST API with Axum: every report as JSON under /api

use anyhow::{bail, Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use bank_analytics::{
    assess_risk, breakdown_by_country, breakdown_by_segment, credit_exposure_by_sector,
    financial_summary, logging, monthly_performance, open_database, CustomerFilter,
    DashboardSnapshot, EngineError, PerformanceTotals, PeriodFilter, PeriodPerformance, Settings,
};

/// Shared application state
///
/// Handlers pass the mutex itself as the data source, so each query takes
/// the lock on its own.
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    settings: Arc<Settings>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
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

fn respond<T: Serialize>(endpoint: &str, result: bank_analytics::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            let status = match &e {
                EngineError::InvalidMonth(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error!("{} failed: {}", endpoint, e);
            (status, Json(ApiResponse::<T>::err(e.to_string()))).into_response()
        }
    }
}

#[derive(Serialize)]
struct PerformanceResponse {
    months: Vec<PeriodPerformance>,
    totals: PerformanceTotals,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Every indicator plus the risk assessment
async fn get_dashboard(State(state): State<AppState>) -> Response {
    let snap =
        DashboardSnapshot::compute(&*state.db, &state.settings.engine, &state.settings.risk);
    (StatusCode::OK, Json(ApiResponse::ok(snap))).into_response()
}

/// GET /api/summary
async fn get_summary(State(state): State<AppState>) -> Response {
    respond(
        "summary",
        financial_summary(&*state.db, &state.settings.engine),
    )
}

/// GET /api/risk
async fn get_risk(State(state): State<AppState>) -> Response {
    respond(
        "risk",
        assess_risk(&*state.db, &state.settings.engine, &state.settings.risk),
    )
}

/// GET /api/sectors
async fn get_sectors(State(state): State<AppState>) -> Response {
    respond("sectors", credit_exposure_by_sector(&*state.db))
}

/// GET /api/performance?from=YYYY-MM&to=YYYY-MM
async fn get_performance(
    State(state): State<AppState>,
    Query(filter): Query<PeriodFilter>,
) -> Response {
    let result = monthly_performance(&*state.db, &filter).map(|months| PerformanceResponse {
        totals: PerformanceTotals::from_rows(&months),
        months,
    });
    respond("performance", result)
}

/// GET /api/breakdown/country?country=..&segment=..
async fn get_country_breakdown(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> Response {
    respond(
        "breakdown/country",
        breakdown_by_country(&*state.db, &filter, &state.settings.engine),
    )
}

/// GET /api/breakdown/segment?country=..&segment=..
async fn get_segment_breakdown(
    State(state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> Response {
    respond(
        "breakdown/segment",
        breakdown_by_segment(&*state.db, &filter, &state.settings.engine),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    logging::init(&settings);

    println!("🌐 Bank Analytics - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if !settings.db_path.exists() {
        eprintln!("❌ Database not found at {:?}", settings.db_path);
        eprintln!("   Run: bank-analytics init");
        eprintln!("   then import data first.");
        bail!("database not found");
    }

    let conn = open_database(&settings.db_path)?;
    info!("database opened: {:?}", settings.db_path);

    let addr = settings.bind_addr.clone();
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        settings: Arc::new(settings),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/summary", get(get_summary))
        .route("/risk", get(get_risk))
        .route("/sectors", get(get_sectors))
        .route("/performance", get(get_performance))
        .route("/breakdown/country", get(get_country_breakdown))
        .route("/breakdown/segment", get(get_segment_breakdown))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("server error")?;

    Ok(())
}
