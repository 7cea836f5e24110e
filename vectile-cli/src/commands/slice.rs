//! The main command: render a complete tile pyramid.
//!
//! Resolution order for every option is flag, then config file, then
//! built-in default. Ctrl-C stops the run after the tiles in flight
//! finish; whatever was rendered stays on disk together with
//! `metadata.json`.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};

use vectile::batch::{CancelFlag, ProgressCallback};
use vectile::config::ConfigFile;
use vectile::logging::{default_log_dir, default_log_file, init_logging};
use vectile::pyramid::{build_pyramid, PyramidSummary};

use crate::commands::common::{build_rasterizer, FormatArg, RasterizerArgs};
use crate::error::CliError;

/// Arguments for `vectile slice`.
#[derive(Debug, clap::Args)]
pub struct Args {
    /// SVG source file to slice
    pub source: PathBuf,

    /// Output directory for the pyramid
    #[arg(default_value = "tiles")]
    pub directory: PathBuf,

    /// Number of zoom levels to generate
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Final tile format
    #[arg(long, value_enum)]
    pub filetype: Option<FormatArg>,

    /// Tile edge length in pixels
    #[arg(long)]
    pub tilesize: Option<u32>,

    /// Drop fully transparent tiles (true) or keep them (false)
    #[arg(long, value_name = "BOOL")]
    pub ignore_transparent: Option<bool>,

    /// Render each layer into its own pyramid (accepted, not implemented)
    #[arg(long)]
    pub split_layers: bool,

    /// Worker threads rendering in parallel
    #[arg(long)]
    pub workers: Option<usize>,

    #[command(flatten)]
    pub rasterizer: RasterizerArgs,

    /// Suppress the progress bar
    #[arg(long)]
    pub quiet: bool,
}

/// Run the slice command.
pub fn run(args: Args) -> Result<(), CliError> {
    let _logging = init_logging(&default_log_dir(), default_log_file())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let file = ConfigFile::load().map_err(CliError::ConfigFile)?;

    let mut config = file.to_run_config(&args.source, &args.directory);
    if let Some(zoom) = args.zoom {
        config.max_zoom = zoom;
    }
    if let Some(filetype) = args.filetype {
        config.format = filetype.into();
    }
    if let Some(tilesize) = args.tilesize {
        config.tile_size = tilesize;
    }
    if let Some(ignore) = args.ignore_transparent {
        config.ignore_transparent = ignore;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.split_layers = args.split_layers;

    let rasterizer = build_rasterizer(&args.rasterizer, &file.render, &config.source)?;

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Interrupt received, finishing tiles in flight...");
        tracing::warn!("interrupt received, cancelling run");
        handler_flag.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let bar = if args.quiet { None } else { Some(make_bar()) };
    let progress = bar.as_ref().map(|bar| {
        let bar = bar.clone();
        Box::new(move |done: usize, total: usize| {
            if bar.length() != Some(total as u64) {
                bar.set_length(total as u64);
            }
            bar.set_position(done as u64);
        }) as ProgressCallback
    });

    let summary = build_pyramid(&config, rasterizer, cancel, progress).map_err(CliError::Build)?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    print_summary(&summary, &config.directory);

    if !summary.report.failed.is_empty() {
        return Err(CliError::TilesFailed {
            failed: summary.report.failed.len(),
            total: summary.planned,
        });
    }
    Ok(())
}

fn make_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} tiles ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    bar
}

fn print_summary(summary: &PyramidSummary, root: &std::path::Path) {
    let report = &summary.report;

    println!(
        "Rendered {} of {} tiles in {:.1}s",
        report.completed(),
        summary.planned,
        report.elapsed.as_secs_f64()
    );
    println!("  written:   {}", report.written);
    println!("  discarded: {}", report.discarded);
    if !report.failed.is_empty() {
        println!("  failed:    {}", report.failed.len());
    }
    if report.cancelled > 0 {
        println!("  cancelled: {} (interrupted)", report.cancelled);
    }
    println!("Pyramid written to {}", root.display());
}
