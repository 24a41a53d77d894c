// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use tiergrid::app_config::{self, Config};
use tiergrid::app_controller::Controller;
use tiergrid::io::TextgridFormat;
use tiergrid::textgrid::{CropMode, ShiftMode};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TextgridFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    Long,
    Short,
    Json,
    TextgridJson,
}

impl From<CliFormat> for TextgridFormat {
    fn from(cli_format: CliFormat) -> Self {
        match cli_format {
            CliFormat::Long => TextgridFormat::LongTextgrid,
            CliFormat::Short => TextgridFormat::ShortTextgrid,
            CliFormat::Json => TextgridFormat::Json,
            CliFormat::TextgridJson => TextgridFormat::TextgridJson,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCropMode {
    Strict,
    Lax,
    Truncated,
}

impl From<CliCropMode> for CropMode {
    fn from(mode: CliCropMode) -> Self {
        match mode {
            CliCropMode::Strict => CropMode::Strict,
            CliCropMode::Lax => CropMode::Lax,
            CliCropMode::Truncated => CropMode::Truncated,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a document, or every document in a folder, to another format
    Convert {
        /// Input file or directory
        input_path: PathBuf,

        /// Output format
        #[arg(short = 't', long, value_enum, default_value = "long")]
        to: CliFormat,

        /// Output directory (defaults to next to each input)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Print the tiers of a TextGrid or KlattGrid
    Info { input_path: PathBuf },

    /// Check a document without repairing it
    Validate { input_path: PathBuf },

    /// Keep only a time range
    Crop {
        input_path: PathBuf,
        start: f64,
        end: f64,

        #[arg(short, long, value_enum, default_value = "truncated")]
        mode: CliCropMode,

        /// Move the cropped range to start at zero
        #[arg(short, long)]
        rebase: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Move every timestamp by an offset in seconds
    Shift {
        input_path: PathBuf,

        #[arg(allow_hyphen_values = true)]
        offset: f64,

        /// Clamp timestamps at zero instead of failing
        #[arg(long)]
        clamp: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Snap boundaries of all tiers onto a reference tier
    Dejitter {
        input_path: PathBuf,

        /// Reference tier name
        #[arg(short = 't', long)]
        reference_tier: String,

        /// Largest distance in seconds a boundary is moved
        #[arg(short, long, default_value_t = 0.001)]
        max_distance: f64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Move boundaries to the nearest zero crossing of a mono WAV file
    Snap {
        input_path: PathBuf,
        audio_path: PathBuf,

        /// Search window in seconds either side of each boundary
        #[arg(short, long, default_value_t = 0.02)]
        window: f64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Measure pitch and intensity with Praat
    Pitch {
        audio_path: PathBuf,

        /// CSV output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for tiergrid
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// tiergrid - tiered time-aligned annotations
///
/// Reads, edits and writes Praat TextGrid and KlattGrid files and their JSON forms.
#[derive(Parser, Debug)]
#[command(name = "tiergrid")]
#[command(version)]
#[command(about = "Tiered annotation toolkit for Praat TextGrids")]
#[command(long_about = "tiergrid reads, edits and converts Praat TextGrid files in the long and short text forms and two JSON forms.

EXAMPLES:
    tiergrid info words.TextGrid                       # List tiers
    tiergrid convert -t json corpus/                   # Convert a folder to JSON
    tiergrid crop words.TextGrid 1.5 3.0 --rebase      # Keep 1.5s to 3.0s
    tiergrid shift --clamp words.TextGrid -- -0.25     # Move everything 250ms earlier
    tiergrid dejitter -t phones words.TextGrid         # Align tiers on the phone tier
    tiergrid pitch speech.wav -o pitch.csv             # Pitch track through Praat
    tiergrid completions bash > tiergrid.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json", env = "TIERGRID_CONFIG")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {:<5} {}\x1B[0m", color, now, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    // the level is refined once the configuration is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "tiergrid", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    run(&controller, cli.command)
}

fn run(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Convert { input_path, to, output_dir, force_overwrite } => {
            let summary = controller.convert(&input_path, output_dir.as_deref(), to.into(), force_overwrite)?;
            if summary.failed > 0 {
                return Err(anyhow::anyhow!("{} of {} files failed", summary.failed, summary.converted + summary.skipped + summary.failed));
            }
        }
        Commands::Info { input_path } => {
            print!("{}", controller.describe(&input_path)?);
        }
        Commands::Validate { input_path } => controller.validate(&input_path)?,
        Commands::Crop { input_path, start, end, mode, rebase, output } => {
            controller.crop(&input_path, output.as_deref(), start, end, mode.into(), rebase)?;
        }
        Commands::Shift { input_path, offset, clamp, output } => {
            let mode = if clamp { ShiftMode::Clamp } else { ShiftMode::Error };
            controller.shift(&input_path, output.as_deref(), offset, mode)?;
        }
        Commands::Dejitter { input_path, reference_tier, max_distance, output } => {
            controller.dejitter(&input_path, output.as_deref(), &reference_tier, max_distance)?;
        }
        Commands::Snap { input_path, audio_path, window, output } => {
            controller.snap_to_zero_crossings(&input_path, &audio_path, output.as_deref(), window)?;
        }
        Commands::Pitch { audio_path, output } => {
            let runner = controller.config().praat_runner();
            let measures = controller.pitch(&runner, &audio_path, output.as_deref())?;
            if output.is_none() {
                for m in &measures {
                    println!("{}\t{}\t{}", m.time, m.pitch, m.intensity);
                }
            }
            info!("{} measurements", measures.len());
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}
