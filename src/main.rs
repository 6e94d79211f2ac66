use std::process;

use etex_client::{AppError, config, infra::telemetry, run_round_trip};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let kind = error.kind();
    let chain = error.messages().join(": ");
    if dispatcher::has_been_set() {
        error!(kind = ?kind, error = %chain, "etex build failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(kind = ?kind, error = %chain, "etex build failed");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let report = run_round_trip(&settings.server, &cli_args.manifest).await?;
    info!(
        target = "etex::client",
        sent = report.sent.members,
        received = report.extracted.members,
        request_bytes = report.request_bytes,
        response_bytes = report.response_bytes,
        output = %report.output_dir.display(),
        "Build finished"
    );
    Ok(())
}
