//! Ops Dashboard backend
//!
//! Serves the business-operations dashboard: the four managed automations,
//! call-center and purchase analytics from the customer sheet, the monthly
//! insights report, and the operations assistant.
//!
//! ## Endpoints
//!
//! - `POST /chat` - Talk to the operations assistant
//! - `GET /workflows` - Managed workflows with run statistics
//! - `GET /workflow-detail/:id` - Plain-language timeline of one workflow
//! - `GET /sheets?sheet=customers|content` - Raw sheet rows
//! - `GET /sheets/analytics?range=` - Call-center KPIs
//! - `GET /sheets/purchase-stats` - Revenue totals
//! - `GET /sheets/purchase-history` - Revenue per month
//! - `GET /docs` - Monthly insights report
//! - `GET /healthz` - Health check

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ops_dashboard::config::{AppState, Config};
use ops_dashboard::router::build_router;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ops_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    info!("Starting Ops Dashboard");
    info!(
        "n8n: {}",
        config.n8n_api_url.as_deref().unwrap_or("not configured")
    );
    info!(
        "Assistant providers: anthropic={} openai={}",
        config.anthropic_api_key.is_some(),
        config.openai_api_key.is_some()
    );
    info!("Binding to: {}", bind_addr);

    // Create shared state
    let state = AppState::new(config);
    info!("Managing {} workflows", state.registry.len());

    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
