use aws_lambda_events::event::s3::S3Event;
use image_shrinker::{notification, observability, Config, Pipeline, S3Store, TinifyClient};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::info;

type ShrinkPipeline = Pipeline<S3Store, TinifyClient>;

async fn lambda_handler(
    pipeline: &ShrinkPipeline,
    event: LambdaEvent<S3Event>,
) -> Result<(), Error> {
    let notifications = notification::from_event(&event.payload)?;
    info!(
        request_id = %event.context.request_id,
        records = notifications.len(),
        "received s3 event"
    );

    pipeline.process_batch(&notifications).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    observability::init();

    let config = Config::from_env()?;
    let store = S3Store::from_env(config.bucket.as_str()).await;
    let optimizer = TinifyClient::new(config.api_key.as_str())?;
    let pipeline = Pipeline::new(store, optimizer);

    let pipeline = &pipeline;
    let func = service_fn(move |event: LambdaEvent<S3Event>| async move {
        lambda_handler(pipeline, event).await
    });
    lambda_runtime::run(func).await?;
    Ok(())
}
