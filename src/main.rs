use load_planner::api;
use load_planner::config::AppConfig;
use log::{error, info, warn};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenv {
        if !err.not_found() {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let packing = app_config.optimizer.packing_config();
    info!(
        "Load planner starting (strategy {}, support ratio {})",
        packing.strategy, packing.support_ratio
    );

    if let Err(err) = api::start_api_server(app_config.api, app_config.optimizer).await {
        error!("API server terminated with an error: {}", err);
        std::process::exit(1);
    }
}
