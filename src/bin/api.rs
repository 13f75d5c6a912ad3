use linear_relay::api::{WebhookService, handler};
use linear_relay::core::config::AppConfig;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    linear_relay::setup_logging();

    let service = AppConfig::from_env().map(WebhookService::from_config);
    if let Err(e) = &service {
        error!("Config error: {}", e);
    }
    let service = service.as_ref();

    lambda_runtime::run(lambda_runtime::service_fn(move |event| handler(service, event))).await
}
