mod cli;
mod error;
mod output;
mod symbols;

use std::time::Duration;

use clap::Parser;
use cli::{Command, QueryArgs, WatchArgs};
use error::AppError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use woox::{
    Credentials, CycleReport, PairFilter, QueryWindow, QuickRange, RefreshScheduler,
    RefreshSettings, TimeRange, WooxConfig, WooxHttpClient,
};

const API_KEY_VAR: &str = "WOO_API_KEY";
const API_SECRET_VAR: &str = "WOO_API_SECRET";

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = cli
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shared cancellation token + signal handlers.
    let cancel = setup_signal_handlers();

    let _ = dotenvy::dotenv(); // load .env if present

    let credentials = match load_credentials() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "missing credentials");
            std::process::exit(1);
        }
    };

    let config = WooxConfig {
        base_url: cli.base_url.clone(),
        ..Default::default()
    };
    let client = match WooxHttpClient::new(&config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, base_url = %cli.base_url, "failed to build HTTP client");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Fetch(args) => run_fetch(client, credentials, args, cancel).await,
        Command::Watch(args) => run_watch(client, credentials, args, cancel).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "woo-pnl fatal error");
        std::process::exit(1);
    }
}

fn load_credentials() -> Result<Credentials, AppError> {
    let api_key = std::env::var(API_KEY_VAR).map_err(|_| AppError::MissingEnv(API_KEY_VAR))?;
    let api_secret =
        std::env::var(API_SECRET_VAR).map_err(|_| AppError::MissingEnv(API_SECRET_VAR))?;
    Ok(Credentials::new(api_key, api_secret))
}

/// Turn the window and pair options into scheduler inputs.
fn resolve_query(args: &QueryArgs) -> Result<(TimeRange, PairFilter), AppError> {
    let range = match (args.start, args.end, args.range) {
        (Some(start), Some(end), None) => {
            let window = QueryWindow::from_dates(start, end)?;
            TimeRange::fixed(window.start_ms, window.end_ms)?
        }
        (None, None, range) => range.unwrap_or(QuickRange::Today).into(),
        _ => {
            return Err(AppError::Args(
                "use either --start/--end or --range".into(),
            ))
        }
    };

    let pair = PairFilter::parse(&args.pair);
    if let Some(path) = &args.symbols {
        let symbols = symbols::load_symbols(path)?;
        debug!(count = symbols.len(), path = %path.display(), "symbol list loaded");
        symbols::validate_pair(&pair, &symbols)?;
    }

    Ok((range, pair))
}

fn print_report(report: &CycleReport, json_mode: bool) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    output::write_report(report, json_mode, &mut writer)
}

/// One cycle, printed, then exit.
async fn run_fetch(
    client: WooxHttpClient,
    credentials: Credentials,
    args: QueryArgs,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    let (range, pair) = resolve_query(&args)?;
    info!(range = ?range, pair = %pair, json = args.json, "fetch starting");

    let settings = RefreshSettings::new(credentials, range)
        .with_pair_filter(pair)
        .with_auto_refresh(false);
    let (scheduler, handle, mut reports) = RefreshScheduler::new(client, settings);
    let scheduler_cancel = cancel.child_token();
    let task = tokio::spawn(scheduler.run(scheduler_cancel.clone()));

    handle.trigger();
    let report = tokio::select! {
        _ = cancel.cancelled() => None,
        report = reports.recv() => report,
    };

    scheduler_cancel.cancel();
    join_scheduler(task).await;

    let Some(report) = report else {
        if cancel.is_cancelled() {
            return Ok(());
        }
        return Err(AppError::SchedulerStopped);
    };

    print_report(&report, args.json)?;
    match report.error {
        Some(info) => Err(AppError::CycleFailed {
            kind: info.kind,
            message: info.message,
        }),
        None => Ok(()),
    }
}

/// Scheduler loop until shutdown. Each stdin line requests a refresh.
async fn run_watch(
    client: WooxHttpClient,
    credentials: Credentials,
    args: WatchArgs,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    let (range, pair) = resolve_query(&args.query)?;
    let settings = RefreshSettings::new(credentials, range)
        .with_pair_filter(pair)
        .with_auto_refresh(!args.no_auto_refresh)
        .with_interval(Duration::from_secs(args.interval));

    info!(
        range = ?settings.range,
        pair = %settings.pair_filter,
        auto_refresh = settings.auto_refresh,
        interval_secs = settings.interval().as_secs(),
        "watch starting"
    );
    if args.interval != settings.interval().as_secs() {
        warn!(
            requested = args.interval,
            used = settings.interval().as_secs(),
            "refresh interval clamped"
        );
    }

    let (scheduler, handle, mut reports) = RefreshScheduler::new(client, settings);
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let result = loop {
        tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            report = reports.recv() => match report {
                Some(report) => {
                    if let Err(e) = print_report(&report, args.query.json) {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(_)) => {
                    debug!(state = ?handle.state(), "manual refresh requested");
                    handle.trigger();
                }
                Ok(None) => {
                    debug!("stdin closed, manual triggers disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!(error = %e, "stdin read failed, manual triggers disabled");
                    stdin_open = false;
                }
            },
        }
    };

    cancel.cancel();
    join_scheduler(task).await;
    result
}

/// Wait for the scheduler task; returns `false` if it panicked or was aborted.
async fn join_scheduler(task: tokio::task::JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, panic = e.is_panic(), "refresh scheduler task failed");
            false
        }
    }
}

/// Register SIGINT and SIGTERM handlers that trigger the returned token.
fn setup_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT, shutting down");
        cancel_clone.cancel();
    });

    #[cfg(unix)]
    {
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("received SIGTERM, shutting down");
                    cancel_clone.cancel();
                }
                Err(e) => warn!(error = %e, "failed to register SIGTERM handler"),
            }
        });
    }

    cancel
}
