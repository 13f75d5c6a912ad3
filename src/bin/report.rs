use linear_relay::core::config::AppConfig;
use linear_relay::report::handler;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    linear_relay::setup_logging();

    let config = AppConfig::from_env();
    if let Err(e) = &config {
        error!("Config error: {}", e);
    }
    let config = config.as_ref();

    lambda_runtime::run(lambda_runtime::service_fn(move |event| handler(config, event))).await
}
