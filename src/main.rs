mod config;
mod error;
mod gemini;
mod llm_client;
mod logging;
mod models;
mod request_id;
mod router;

use clap::Parser;
use config::Config;
use router::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "gemini-gateway")]
#[command(about = "HTTP gateway relaying text, media and chat requests to Gemini")]
struct Args {
    #[arg(short, long, env = "HOST", default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Optional YAML file overriding model, prompts and chat settings
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long, env = "GATEWAY_PROXY")]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Values from .env only fill variables that are not already set
    dotenvy::dotenv().ok();
    let args = Args::parse();

    logging::init_logging(logging::parse_level(&args.log_level), args.log_file.as_deref());

    let config = match &args.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Configuration loaded successfully from: {}", path);
            config
        }
        None => Config::default(),
    };
    info!("Using model {}", config.model_id());

    if args.api_key.as_deref().unwrap_or_default().is_empty() {
        warn!("GEMINI_API_KEY is not set; generation routes will fail until it is provided");
    }

    let client_builder = reqwest::Client::builder();
    let client_builder = match &args.proxy {
        Some(proxy) => client_builder.proxy(reqwest::Proxy::all(proxy)?),
        None => client_builder,
    };
    let http_client = Arc::new(client_builder.build()?);

    let llm_client = Arc::new(llm_client::LlmClient::new(http_client, &config, args.api_key));
    let app_state = AppState {
        llm_client,
        config: Arc::new(config),
    };
    let app = router::build_router(app_state);

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server is running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
