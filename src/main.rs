use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{info, warn};

use docstore_check::{cli, config, logging, output, pipeline, store, util};

fn main() -> ExitCode {
    logging::init_logging();
    match run() {
        Ok(pipeline::RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(pipeline::RunOutcome::Cancelled) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<pipeline::RunOutcome> {
    let cli_opts = cli::parse();
    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let mut cfg = loaded.config;
    util::apply_cli_overrides(&mut cfg, &cli_opts);
    let opts = util::options_from_cli(&cli_opts);
    opts.validate()?;

    info!(
        "starting run_id={} store={} config_hash={} workers={}",
        cfg.run_id,
        cli_opts.store.display(),
        loaded.config_hash,
        opts.workers
    );

    let store = store::open_store(
        util::store_kind_from_cli(cli_opts.store_kind),
        &cli_opts.store,
        cfg.scan_batch_size,
    )
    .with_context(|| format!("failed to open store {}", cli_opts.store.display()))?;

    if let Some(path) = opts.output.as_deref() {
        util::ensure_output_path(path)?;
    }
    let sinks = output::build_sinks(opts.silent, opts.output.as_deref(), opts.format)
        .context("failed to open result sinks")?;

    let cancel_flag = Arc::new(AtomicBool::new(false));
    {
        let flag = cancel_flag.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        }) {
            warn!("failed to install Ctrl+C handler: {err}");
        }
    }

    let report =
        pipeline::run_check_with_cancel(&cfg, &opts, store.as_ref(), sinks, cancel_flag)?;

    info!("docstore-check run {}", report.outcome.as_str());
    Ok(report.outcome)
}
