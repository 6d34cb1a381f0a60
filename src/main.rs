use clap::{Parser, Subcommand};
use photoedit::dispatch::{self, Action};
use photoedit::imaging::{self, RustBackend};
use photoedit::output::{self, BatchItem};
use photoedit::{cleanup, config, logging};
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photoedit")]
#[command(about = "Local photo editing: resize, crop, backgrounds, enhancement, conversion")]
#[command(long_about = "\
Local photo editing: resize, crop, backgrounds, enhancement, conversion

Every command reads one source image and writes a new file into the output
directory, named {operation}_{YYYYmmdd_HHMMSS}_{8 hex}.{ext}. The written
path is printed on stdout; logs go to stderr.

  photoedit resize photo.jpg 1920 1080     # fit inside 1920x1080
  photoedit smart-crop photo.jpg square    # square | portrait | landscape | smart
  photoedit remove-bg logo.png             # corner-color background → transparent PNG
  photoedit convert photo.png webp         # jpeg | png | webp
  photoedit dispatch resize_4k photo.jpg   # same callbacks as the bot menus
  photoedit cleanup --max-age-hours 6      # sweep old outputs

Run 'photoedit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Output directory (overrides output_dir from config.toml)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scale to fit inside WIDTH x HEIGHT, keeping the aspect ratio
    Resize {
        source: PathBuf,
        width: u32,
        height: u32,
    },
    /// Cut out a rectangle; out-of-bounds values are clamped
    #[command(allow_negative_numbers = true)]
    Crop {
        source: PathBuf,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// Crop by style: square, portrait (9:16), landscape (16:9), smart (10% margin)
    SmartCrop { source: PathBuf, style: String },
    /// Make the corner-colored background transparent (PNG)
    RemoveBg { source: PathBuf },
    /// Put the image over a generated gradient background
    GenerateBg { source: PathBuf },
    /// Sharpen and boost contrast, color, and brightness
    Enhance { source: PathBuf },
    /// Upscale to 720p, 1080p, 4k, 8k, or original (2x), then enhance
    EnhanceResolution { source: PathBuf, preset: String },
    /// Re-encode as jpeg, png, or webp
    Convert { source: PathBuf, format: String },
    /// Show format, color type, and dimensions
    Info {
        source: PathBuf,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete outputs older than the configured age
    Cleanup {
        /// Override [cleanup] max_age_hours
        #[arg(long)]
        max_age_hours: Option<u64>,
    },
    /// Act on a bot menu callback (e.g. resize_4k, crop_square, back)
    Dispatch {
        callback: String,
        /// Source image; required when the callback runs an operation
        source: Option<PathBuf>,
    },
    /// Run one operation callback over many images in parallel
    Batch {
        callback: String,
        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.config)?;
    logging::init_logging(&config.logging.level)?;

    let mut settings = config.output_settings();
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }
    let backend = RustBackend::new();

    match cli.command {
        Command::Resize {
            source,
            width,
            height,
        } => {
            let out = imaging::resize(&backend, &settings, &source, width, height)?;
            output::print_written(&out);
        }
        Command::Crop {
            source,
            x,
            y,
            width,
            height,
        } => {
            let out = imaging::crop(&backend, &settings, &source, x, y, width, height)?;
            output::print_written(&out);
        }
        Command::SmartCrop { source, style } => {
            let out = imaging::smart_crop(&backend, &settings, &source, &style)?;
            output::print_written(&out);
        }
        Command::RemoveBg { source } => {
            let out = imaging::remove_background(&backend, &settings, &source)?;
            output::print_written(&out);
        }
        Command::GenerateBg { source } => {
            let out = imaging::generate_background(&backend, &settings, &source)?;
            output::print_written(&out);
        }
        Command::Enhance { source } => {
            let out = imaging::enhance_quality(&backend, &settings, &source)?;
            output::print_written(&out);
        }
        Command::EnhanceResolution { source, preset } => {
            let out = imaging::enhance_resolution(&backend, &settings, &source, &preset)?;
            output::print_written(&out);
        }
        Command::Convert { source, format } => {
            let out = imaging::convert_format(&backend, &settings, &source, &format)?;
            output::print_written(&out);
        }
        Command::Info { source, json } => {
            let info = imaging::image_info(&backend, &source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                output::print_info(&source, &info);
            }
        }
        Command::Cleanup { max_age_hours } => {
            let max_age = max_age_hours.unwrap_or(config.cleanup.max_age_hours);
            let report =
                cleanup::cleanup_old_files(&settings.output_dir, max_age, &config.cleanup.reserved);
            output::print_cleanup(&settings.output_dir, &report);
        }
        Command::Dispatch { callback, source } => match dispatch::parse_callback(&callback)? {
            Action::Open(menu) => output::print_menu(menu),
            Action::Run(request) => {
                let source = source
                    .ok_or_else(|| format!("'{callback}' ({request}) needs a source image"))?;
                let out = request.run(&backend, &settings, &source)?;
                output::print_written(&out);
            }
        },
        Command::Batch { callback, sources } => {
            let Action::Run(request) = dispatch::parse_callback(&callback)? else {
                return Err(format!("'{callback}' opens a menu; batch needs an operation").into());
            };
            init_thread_pool(&config.processing);
            let items: Vec<BatchItem> = sources
                .par_iter()
                .map(|source| (source.clone(), request.run(&backend, &settings, source)))
                .collect();
            output::print_batch(&items);

            let failed = items.iter().filter(|(_, r)| r.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} images failed", items.len()).into());
            }
        }
        // Printed before config is loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
