//! Command-line front end: translates page snapshots against an OpenIDCS
//! backend.

use std::io::Write;
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::{
    Parser,
    Subcommand,
};
use openidcs_i18n::config::{
    ConfigError,
    ConfigManager,
    LoggingConfig,
    OverlaySettings,
};
use openidcs_i18n::dom::snapshot::{
    self,
    SnapshotError,
};
use openidcs_i18n::loader::locale::system_locale;
use openidcs_i18n::loader::{
    HttpTranslationSource,
    LoadError,
    TranslationSource,
};
use openidcs_i18n::storage::{
    FileStorage,
    MemoryStorage,
    PreferenceStorage,
};
use openidcs_i18n::{
    LoadOutcome,
    TranslationOverlay,
};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{
    EnvFilter,
    fmt,
};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "openidcs-i18n", version, about = "Translate OpenIDCS console pages")]
struct Cli {
    /// Directory holding `.openidcs-i18n.json`
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Overrides `backend.baseUrl`
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// What to do
    #[command(subcommand)]
    command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a page snapshot and print the result
    Translate {
        /// Page snapshot (JSON)
        page: PathBuf,

        /// Language to load instead of the saved or locale language
        #[arg(short, long)]
        lang: Option<String>,

        /// Locale used when no language was saved (defaults to the
        /// environment's)
        #[arg(long)]
        locale: Option<String>,

        /// Write the translated snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the languages offered by the backend
    Languages,
}

/// Errors ending the command.
#[derive(Error, Debug)]
enum CliError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unreadable page
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Backend failure
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Output failure
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(error) => {
            let _ = writeln!(std::io::stderr(), "Configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&settings.logging);

    match run(cli.command, &settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the workspace configuration and applies command-line overrides.
fn load_settings(cli: &Cli) -> Result<OverlaySettings, ConfigError> {
    let mut manager = ConfigManager::new();
    manager.load_settings(Some(cli.workspace.clone()))?;
    if let Some(url) = &cli.backend_url {
        let mut settings = manager.get_settings().clone();
        settings.backend.base_url.clone_from(url);
        manager.update_settings(settings)?;
    }
    Ok(manager.get_settings().clone())
}

/// stderr に加えて、設定があればファイルにも出力する。`RUST_LOG` が優先。
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match config.file.as_deref().and_then(split_log_path) {
        Some((directory, file_name)) => {
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(stderr_layer).with(file_layer).init();
    guard
}

/// Directory and file name of the log file.
fn split_log_path(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let file_name = path.file_name()?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Some((directory, PathBuf::from(file_name)))
}

/// Runs one subcommand.
async fn run(command: Command, settings: &OverlaySettings) -> Result<(), CliError> {
    let source = HttpTranslationSource::new(&settings.backend)?;
    match command {
        Command::Translate { page, lang, locale, output } => {
            let mut doc = snapshot::load_page(&page)?;
            let storage: Box<dyn PreferenceStorage> = match &settings.storage.path {
                Some(path) => Box::new(FileStorage::new(path)),
                None => Box::new(MemoryStorage::new()),
            };
            let mut overlay = TranslationOverlay::new(settings, Box::new(source), storage)
                .with_locale(locale.or_else(system_locale));
            if let Some(code) = lang {
                overlay = overlay.with_startup_language(code);
            }

            if let LoadOutcome::Failed { code, error } = overlay.bootstrap(&mut doc).await {
                tracing::warn!(language = code, %error, "Page left untranslated");
            }

            let rendered = snapshot::render_page(&doc)?;
            match output {
                Some(path) => std::fs::write(path, rendered + "\n")?,
                None => writeln!(std::io::stdout().lock(), "{rendered}")?,
            }
        }
        Command::Languages => {
            let languages = source.fetch_languages().await?;
            let mut stdout = std::io::stdout().lock();
            for language in languages {
                writeln!(stdout, "{}\t{}", language.code, language.native)?;
            }
        }
    }
    Ok(())
}
