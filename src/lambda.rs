use catalogue_api::adapters::aws_backends;
use catalogue_api::utils::{logger, validation::Validate};
use catalogue_api::{router, AppConfig, AppState};
use lambda_http::{run, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config = AppConfig::from_env()?;
    config.validate()?;

    // Clients are built once per execution environment and reused across invocations.
    let backends = aws_backends(&config).await?;
    tracing::info!(environment = %config.environment, "Starting catalogue-api Lambda handler");

    run(router(AppState::new(config, backends))).await
}
