//! ReviAI CLI - AI review of spreadsheet design documents

mod logging;
mod pipeline;
mod prompts;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reviai_core::config::{PathsConfig, DEFAULT_CONFIG_FILE};
use reviai_core::Config;
use reviai_excel::{BridgeLauncher, ExcelBridgeConfig, ExcelExporter};

#[derive(Parser)]
#[command(name = "reviai")]
#[command(
    author,
    version,
    about = "Export design workbooks to PDF, review them with Gemini and save the results"
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "REVIAI_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Show debug output on the console
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to excel-com-bridge.exe (default: next to this binary)
    #[arg(long, global = true, env = "REVIAI_BRIDGE")]
    bridge: Option<PathBuf>,

    /// WINE binary used to run the bridge outside Windows
    #[arg(long, global = true, env = "REVIAI_WINE")]
    wine: Option<PathBuf>,

    /// WINEPREFIX for the bridge
    #[arg(long, global = true, env = "WINEPREFIX")]
    wine_prefix: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all sheets in a workbook
    Sheets {
        /// Excel workbook (xlsx, xlsm, xls)
        workbook: PathBuf,
    },

    /// Step 1: export selected sheets to PDF
    Export {
        /// Excel workbook
        workbook: PathBuf,

        /// Sheet to export (repeatable)
        #[arg(short, long = "sheet", required = true)]
        sheets: Vec<String>,

        /// Document version, used in the PDF file names
        #[arg(long)]
        version: u32,

        /// Output directory (default: <output_dir>/pdfs)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Step 2: review PDF or Markdown files with Gemini
    Review {
        /// Documents to review
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        prompt: pipeline::PromptArgs,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Where to write the review JSON (default: <output_dir>/review_<timestamp>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Step 3: write a review JSON file to a formatted workbook
    Save {
        /// Review JSON written by `review`
        review: PathBuf,

        /// Review round, used in the file name (第<round>回.xlsx)
        #[arg(short, long)]
        round: u32,

        /// Output directory (default: <output_dir>/results)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Run all three steps
    Run {
        /// Excel workbook
        workbook: PathBuf,

        /// Sheet to export (repeatable)
        #[arg(short, long = "sheet", required = true)]
        sheets: Vec<String>,

        /// Document version
        #[arg(long)]
        version: u32,

        /// Review round (default: the version)
        #[arg(short, long)]
        round: Option<u32>,

        #[command(flatten)]
        prompt: pipeline::PromptArgs,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Additional documents to review with the PDFs (e.g. the previous version)
        #[arg(long = "extra")]
        extra: Vec<PathBuf>,
    },

    /// Manage prompt templates
    #[command(subcommand)]
    Prompts(prompts::PromptCommand),

    /// Show or change the configuration
    #[command(subcommand)]
    Config(settings::ConfigCommand),

    /// List available Gemini models
    Models,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = Config::load_or_default(&cli.config);
    let log_dir = match &config {
        Ok(config) => config.paths.log_dir.clone(),
        Err(_) => PathsConfig::default().log_dir,
    };
    logging::init(&log_dir, cli.verbose);

    let result = config
        .with_context(|| format!("Failed to load '{}'", cli.config.display()))
        .and_then(|config| run(&cli, config));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            if let Some(hint) = hint(&e) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, mut config: Config) -> Result<()> {
    match &cli.command {
        Commands::Sheets { workbook } => pipeline::sheets(&mut exporter(cli), workbook),
        Commands::Export {
            workbook,
            sheets,
            version,
            output_dir,
        } => {
            let output_dir = output_dir.clone().unwrap_or_else(|| config.pdf_dir());
            pipeline::export(&mut exporter(cli), workbook, sheets, *version, &output_dir)
                .map(|_| ())
        }
        Commands::Review {
            files,
            prompt,
            model,
            output,
        } => {
            pipeline::apply_model(&mut config, model.as_deref());
            pipeline::review(&config, files, prompt, output.as_deref()).map(|_| ())
        }
        Commands::Save {
            review,
            round,
            output_dir,
        } => {
            let output_dir = output_dir.clone().unwrap_or_else(|| config.results_dir());
            pipeline::save(review, *round, &output_dir).map(|_| ())
        }
        Commands::Run {
            workbook,
            sheets,
            version,
            round,
            prompt,
            model,
            extra,
        } => {
            pipeline::apply_model(&mut config, model.as_deref());
            let request = pipeline::RunRequest {
                workbook,
                sheets,
                version: *version,
                round: round.unwrap_or(*version),
                prompt,
                extra,
            };
            pipeline::run_all(&config, &mut exporter(cli), &request)
        }
        Commands::Prompts(command) => prompts::run(&config, command),
        Commands::Config(command) => settings::run(&cli.config, &config, command),
        Commands::Models => {
            settings::list_models(config.model());
            Ok(())
        }
    }
}

fn exporter(cli: &Cli) -> ExcelExporter {
    let mut launcher = BridgeLauncher::default();
    if let BridgeLauncher::Wine {
        wine_path,
        wine_prefix,
    } = &mut launcher
    {
        if let Some(wine) = &cli.wine {
            *wine_path = wine.clone();
        }
        *wine_prefix = cli.wine_prefix.clone();
    }

    ExcelExporter::new(ExcelBridgeConfig {
        bridge_exe_path: cli.bridge.clone(),
        launcher,
    })
}

/// Next step for the failures users can fix themselves.
fn hint(err: &anyhow::Error) -> Option<&'static str> {
    use reviai_excel::{BridgeError, ExportError};
    use reviai_review::ReviewError;

    for cause in err.chain() {
        if let Some(ReviewError::InvalidApiKey) = cause.downcast_ref::<ReviewError>() {
            return Some("set a key with `reviai config set-key <KEY>` or GEMINI_API_KEY");
        }
        if let Some(ReviewError::UnreadableDocument { .. }) = cause.downcast_ref::<ReviewError>() {
            return Some("the PDF has no extractable text; export it again or pass a Markdown version");
        }
        let bridge = match cause.downcast_ref::<ExportError>() {
            Some(ExportError::Bridge(e)) => Some(e),
            _ => cause.downcast_ref::<BridgeError>(),
        };
        match bridge {
            Some(BridgeError::WineNotFound) => {
                return Some("install WINE or pass --wine <path>")
            }
            Some(BridgeError::BridgeExeNotFound(_)) => {
                return Some("build excel-com-bridge for x86_64-pc-windows-gnu or pass --bridge <path>")
            }
            Some(_) => return Some("check that Microsoft Excel is installed and can be started"),
            None => {}
        }
    }
    None
}
