use cobranca_report::{create_pool, router, AppConfig, AppState, Formatter, PgReportStore, ReportService};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging with local timestamps
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // A .env file is optional; real environment variables win.
    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file loaded: {}", e);
    }

    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    let pool = create_pool(&config.database);
    info!("Database pool created");

    let store = Arc::new(PgReportStore::new(pool));
    let reports = ReportService::new(store, Formatter::new(config.report.blank_policy));
    let state = AppState::new(reports, config.auth.clone());

    let app = router(state).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET /api/cobranca/consulta           - paginated receivables");
    info!("  GET /api/cobranca/consulta_xlsx      - receivables spreadsheet");
    info!("  GET /api/cobranca/consulta_csv       - receivables CSV");
    info!("  GET /api/cobranca/renegociacao       - paginated renegotiation installments");
    info!("  GET /api/cobranca/renegociacao_xlsx  - renegotiation spreadsheet");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
