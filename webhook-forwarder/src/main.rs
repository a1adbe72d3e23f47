use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::env::args;
use tracing::{debug, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use webhook_forwarder::bus::{DryRunBus, EventBridgeBus, EventBus};
use webhook_forwarder::config::Config;
use webhook_forwarder::handler::{self, GatewayResponse};
use webhook_forwarder::replay;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env()?;
    info!("{:?}", config);

    // a payload file in the args means a one-off local run instead of the Lambda loop
    if let Some(payload_file) = args().nth(1) {
        if payload_file == "--help" {
            print_help();
            return Ok(());
        }

        let reply = replay::run(&payload_file, &DryRunBus, &config).await?;
        println!("{}", serde_json::to_string_pretty(&reply.response)?);
        return Ok(());
    }

    // one client per process, shared by all invocations
    let bus = EventBridgeBus::from_env().await;
    let (bus, config) = (&bus, &config);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        my_handler(event, bus, config).await
    }))
    .await
}

async fn my_handler(event: LambdaEvent<Value>, bus: &dyn EventBus, config: &Config) -> Result<GatewayResponse, Error> {
    let (event, ctx) = event.into_parts();

    debug!("Event: {:?}", event);
    debug!("Context: {:?}", ctx);

    Ok(handler::handle(&event, bus, config).await.response)
}

/// Logs go to CloudWatch, which adds its own timestamps and has no use for color codes.
/// Set RUST_LOG=debug to log the full event and context.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .without_time()
        .compact()
        .init();
}

fn print_help() {
    println!("Validates GitHub webhooks from API Gateway and forwards them to EventBridge.");
    println!("Deployed as a Lambda function it takes no params.");
    println!();
    println!("Local run: webhook-forwarder [payload_file], e.g. gateway_event.json");
    println!("The event is handled in full, but nothing is published.");
}
