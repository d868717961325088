use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use nfc_kiosk::application::dispatcher::TransactionDispatcher;
use nfc_kiosk::application::startup;
use nfc_kiosk::application::terminal::Terminal;
use nfc_kiosk::config::{Config, log_directive};
use nfc_kiosk::domain::ports::{CardReader, FeedbackSinkBox};
use nfc_kiosk::infrastructure::feedback::{CommandFeedback, LogFeedback};
use nfc_kiosk::infrastructure::http::HttpTransactionApi;
use nfc_kiosk::infrastructure::pcsc_reader::PcscReader;
use nfc_kiosk::interfaces::cli::{Cli, Mode};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::try_from(&cli).into_diagnostic()?;
    let api = HttpTransactionApi::new(config.api.clone()).into_diagnostic()?;
    let feedback: FeedbackSinkBox = match &config.feedback_command {
        Some(program) => {
            Box::new(CommandFeedback::new(program).with_timeout(config.feedback_timeout))
        }
        None => Box::new(LogFeedback),
    };

    match cli.mode() {
        Mode::Run => run(api, feedback, config).await,
        Mode::Check => check(&api).await,
        Mode::Dispatch { token } => dispatch_once(api, feedback, &config, &token).await,
    }
}

/// `LOG_LEVEL` wins over `RUST_LOG`; defaults to `info`. Level names such as
/// `WARNING` are accepted in `LOG_LEVEL`.
fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(log_directive(&level)).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(api: HttpTransactionApi, feedback: FeedbackSinkBox, config: Config) -> Result<()> {
    if let Err(e) = startup::check_health(&api).await {
        error!(error = %e, "Health check failed, exiting");
        return Err(e).into_diagnostic();
    }
    info!("API health check succeeded");

    let version = startup::fetch_version(&api).await;

    let mut reader = match PcscReader::open(&config.reader_families) {
        Ok(reader) => reader,
        Err(e) => {
            error!(error = %e, "No usable reader");
            return Err(e).into_diagnostic();
        }
    };
    info!(
        reader = reader.name(),
        version = version.as_deref().unwrap_or("unknown"),
        "Ready"
    );

    if config.disable_buzzer {
        info!("Disabling reader buzzer");
        startup::disable_buzzer(&mut reader);
    }

    let dispatcher = TransactionDispatcher::new(Box::new(api), config.terminal_name.clone());
    let mut terminal = Terminal::new(
        Box::new(reader),
        dispatcher,
        feedback,
        config.token_delay,
        config.poll_interval,
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    terminal.run(stop_rx).await;
    info!("Terminal shut down");
    Ok(())
}

async fn check(api: &HttpTransactionApi) -> Result<()> {
    let health = startup::check_health(api).await.into_diagnostic()?;
    println!("health: {health}");
    match startup::fetch_version(api).await {
        Some(version) => println!("version: {version}"),
        None => println!("version: unknown"),
    }
    Ok(())
}

async fn dispatch_once(
    api: HttpTransactionApi,
    feedback: FeedbackSinkBox,
    config: &Config,
    token: &str,
) -> Result<()> {
    let dispatcher = TransactionDispatcher::new(Box::new(api), config.terminal_name.clone());
    let outcome = dispatcher.dispatch_hex(token).await;

    let (cue, message) = outcome.feedback();
    feedback.signal(cue, Some(message.as_str())).await;
    println!("{outcome}");

    if outcome.is_accepted() {
        Ok(())
    } else {
        Err(miette!("transaction not booked: {outcome}"))
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown requested");
}
