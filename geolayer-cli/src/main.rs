//! GeoLayer CLI - Command-line interface
//!
//! Drives the geolayer library against the built-in headless engine:
//! load GeoJSON files as overlay layers, reconcile them onto a styled
//! basemap, and optionally exercise a theme switch.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::{inspect, render};

#[derive(Parser)]
#[command(name = "geolayer")]
#[command(about = "Reconcile GeoJSON overlay layers onto a styled basemap", long_about = None)]
struct Cli {
    /// Write logs to this directory in addition to stdout
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Overlay GeoJSON files onto the headless engine and report the result
    Render(render::RenderArgs),
    /// Classify a GeoJSON file and report its geometry class and extent
    Inspect(inspect::InspectArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the file-appender guard alive for the process lifetime.
    let _logging_guard = match &cli.log_dir {
        Some(dir) => match geolayer::logging::init_logging(dir, geolayer::logging::default_log_file())
        {
            Ok(guard) => Some(guard),
            Err(e) => error::CliError::LoggingInit(e.to_string()).exit(),
        },
        None => {
            if let Err(e) = geolayer::logging::init_console_logging() {
                error::CliError::LoggingInit(e.to_string()).exit();
            }
            None
        }
    };

    let result = match cli.command {
        Command::Render(args) => render::run(args).await,
        Command::Inspect(args) => inspect::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
