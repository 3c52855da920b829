#![allow(clippy::result_large_err)]

use coupon_buddy::{
    api::HttpApi,
    config::{self, ApiConfig},
    core::printing::FilePrinter,
    errors::{Error, Result},
    terminal::{self, Worksheet},
};
use dotenvy::dotenv;
use std::{env, path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SETTINGS_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file
    dotenv().ok(); // Non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Load terminal settings and backend endpoint
    let settings = config::load_settings(SETTINGS_PATH)
        .inspect_err(|e| error!("Failed to load {}: {}", SETTINGS_PATH, e))?;
    let api_config = ApiConfig::from_env()?;
    info!("Using backend at {}", api_config.base_url);
    let usuario_id = config::operator_user_id()
        .inspect_err(|e| error!("OPERATOR_USER_ID is not usable: {}", e))?;

    // 4. Read the worksheet named on the command line (or WORKSHEET_PATH)
    let worksheet_path = env::args()
        .nth(1)
        .or_else(|| env::var("WORKSHEET_PATH").ok())
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config {
            message: "usage: coupon-buddy <worksheet.toml>".to_string(),
        })?;
    let worksheet = Worksheet::load(&worksheet_path)
        .await
        .inspect_err(|e| error!("Failed to read {}: {}", worksheet_path.display(), e))?;

    // 5. Run the terminal
    let api = Arc::new(HttpApi::new(api_config)?);
    let printer = FilePrinter::new(settings.print.output_dir.clone());
    let report = terminal::run(api, &printer, &settings, usuario_id, &worksheet)
        .await
        .inspect_err(|e| error!("Terminal run failed: {}", e))?;

    info!(
        "Client {}: {} invoices, {} coupons earned, {} printed",
        report.cliente_id, report.entries, report.cupones, report.printed
    );
    Ok(())
}
