use std::process::ExitCode;

use basket_core::{BasketConfig, ENV_PREFIX};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match BasketConfig::from_env(ENV_PREFIX).settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("[basket] invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    basket_server::init_tracing(&settings.logger);

    if let Err(e) = run(settings).await {
        tracing::error!(error = %format!("{e:#}"), "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(settings: basket_core::Settings) -> anyhow::Result<()> {
    let app = basket_server::build(&settings).await?;
    app.listen(settings.server.addr.as_str(), basket_server::shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}
