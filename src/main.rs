use std::error::Error;

use student_analytics::{start_server, AppConfig, AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;
    log::info!("🚀 Starting Student Performance Analytics...");

    // CSV parsing, fitting and chart rendering are blocking work
    let state = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || AppState::load(&config)).await??
    };

    log::info!("   Visit http://{}:{} in your browser!", config.host, config.port);
    start_server(state, &config).await?;

    Ok(())
}
