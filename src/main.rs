use tokio::net::TcpListener;

use extract_desk::{config::LogFormat, create_router, telemetry, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    telemetry::init_tracing(LogFormat::from_env()?);

    let config = Config::from_env()?;

    tracing::info!("Starting Extract Desk");
    tracing::info!("Extraction API: {}", config.extraction_api_url);
    tracing::info!("Max upload size: {}MB", config.max_upload_size_mb);

    let addr = config.bind_address();
    let state = AppState::new(config)?;
    let app = create_router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
