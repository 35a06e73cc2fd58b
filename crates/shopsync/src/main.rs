//! Thin runnable entry point wiring the library crates together. Not a CLI
//! framework: reads `std::env::args`, dispatches on the first positional
//! argument, and lets each library crate do the real work.

use anyhow::{bail, Context, Result};
use shopsync_bulk::BulkRuntime;
use shopsync_client::GraphQlClient;
use shopsync_core::stats::RunStats;
use shopsync_core::{init_logging, Config};
use shopsync_dump::DumpSession;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();

    let config = Config::from_env().context("loading configuration from environment")?;
    init_logging(config.log_level, config.log_format);

    let stats = match command.as_str() {
        "dump" => run_dump(&config).await?,
        "apply" => run_apply(&config).await?,
        "defs-apply" => run_defs_apply(&config).await?,
        "drop-files" => {
            let confirmation = args.next().unwrap_or_default();
            run_drop_files(&config, &confirmation).await?
        }
        other => bail!("unknown command {other:?}; expected one of: dump, apply, defs-apply, drop-files"),
    };

    report(&stats);
    if stats.any_failed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_dump(config: &Config) -> Result<RunStats> {
    let client = GraphQlClient::new(&config.source.shop_domain, &config.source.admin_token, &config.api_version)
        .context("constructing source client")?;
    let runtime = BulkRuntime::new(client.clone(), config.bulk_poll_interval);
    let session = DumpSession::new(client, runtime, config.output_dir.clone());
    Ok(session.run().await?)
}

async fn run_apply(config: &Config) -> Result<RunStats> {
    let client = GraphQlClient::new(&config.destination.shop_domain, &config.destination.admin_token, &config.api_version)
        .context("constructing destination client")?;
    Ok(shopsync_apply::run_apply(&client, &config.output_dir).await?)
}

async fn run_defs_apply(config: &Config) -> Result<RunStats> {
    let client = GraphQlClient::new(&config.destination.shop_domain, &config.destination.admin_token, &config.api_version)
        .context("constructing destination client")?;
    let stats = shopsync_apply::phases::definitions::apply_definitions(&client, &config.output_dir).await?;
    let mut run = RunStats::default();
    run.push(stats);
    Ok(run)
}

async fn run_drop_files(config: &Config, confirmation: &str) -> Result<RunStats> {
    let client = GraphQlClient::new(&config.destination.shop_domain, &config.destination.admin_token, &config.api_version)
        .context("constructing destination client")?;
    let stats = shopsync_apply::phases::drop::drop_files(&client, confirmation).await?;
    let mut run = RunStats::default();
    run.push(stats);
    Ok(run)
}

fn report(stats: &RunStats) {
    for phase in &stats.phases {
        tracing::info!(
            phase = %phase.phase,
            total = phase.total,
            created = phase.created,
            updated = phase.updated,
            skipped = phase.skipped,
            failed = phase.failed,
            "phase complete"
        );
        for err in phase.errors.iter().take(10) {
            tracing::warn!(phase = %phase.phase, %err, "sampled error");
        }
    }
}
