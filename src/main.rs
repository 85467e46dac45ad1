use clap::{ArgAction, Parser, Subcommand};
use filterbooth::config::{self, BoothConfig};
use filterbooth::imaging::{self, BuiltinEffects, ExportFormat, RustEncoder};
use filterbooth::output;
use filterbooth::session::{FilterSession, SessionError};
use filterbooth::types::{BoundingBox, Dimensions};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "filterbooth")]
#[command(version, about = "Fit a photo into a working canvas, apply a filter, export it")]
#[command(long_about = "\
Fit a photo into a working canvas, apply a filter, export it

Images are scaled down (never up) to fit the canvas bounding box, keeping
their aspect ratio. Filters always start from that fitted original, so
switching filters never stacks effects.

Settings are read from filterbooth.toml in --config-dir (all optional).
Run 'filterbooth gen-config' to print a documented default file.")]
struct Cli {
    /// Directory containing filterbooth.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Override canvas.max_width
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Override canvas.max_height
    #[arg(long, global = true)]
    max_height: Option<u32>,

    /// More diagnostics on stderr (-v info, -vv debug); RUST_LOG wins if set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Machine-readable JSON output instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Image to load
    input: PathBuf,

    /// Filter to apply (see 'filterbooth filters')
    #[arg(short, long, default_value = "normal")]
    filter: String,

    /// Output file [default: <input stem>-<filter>.<ext>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export format: png, jpeg, webp [default: from config]
    #[arg(long)]
    format: Option<String>,

    /// Declared type of the input [default: guessed from extension]
    #[arg(long)]
    mime: Option<String>,

    /// Print a data: URL to stdout instead of writing a file
    #[arg(long)]
    data_url: bool,

    /// Export even when the filter applies no effect ('normal', names
    /// without an effect, or a failed effect); the original canvas is written
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the filters on offer
    Filters,
    /// Show the canvas size an image would be fitted to
    Fit {
        /// Image to measure
        input: PathBuf,
    },
    /// Load an image, apply a filter, and export the result
    ///
    /// Refuses to export when the filter applies no effect, unless --force.
    Apply(ApplyArgs),
    /// Print a stock filterbooth.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load_config(&cli.config_dir)?;
    if let Some(w) = cli.max_width {
        config.canvas.max_width = w;
    }
    if let Some(h) = cli.max_height {
        config.canvas.max_height = h;
    }
    config.validate()?;

    match cli.command {
        Command::Filters => {
            let registry = BuiltinEffects::new();
            let catalog = config.catalog(&registry);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&catalog)?);
            } else {
                output::print_catalog(&catalog, &registry);
            }
        }
        Command::Fit { input } => {
            let bounds = config.canvas.bounds();
            let (width, height) = image::image_dimensions(&input)?;
            let source = Dimensions { width, height };
            let fitted = imaging::fit(source, bounds)?;
            if cli.json {
                let report = serde_json::json!({ "source": source, "canvas": fitted });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_fit(source, fitted, bounds);
            }
        }
        Command::Apply(args) => apply(&config, args, cli.json)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn apply(
    config: &BoothConfig,
    args: ApplyArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = match &args.format {
        Some(name) => {
            let quality = config.export.quality.clamp(1, 100) as u8;
            ExportFormat::parse_with_quality(name, quality)?
        }
        None => config.export.format()?,
    };
    let mime = args
        .mime
        .as_deref()
        .or_else(|| imaging::mime_for_path(&args.input))
        .unwrap_or("application/octet-stream");
    let bytes = std::fs::read(&args.input)?;

    let registry = BuiltinEffects::new();
    let catalog = config.catalog(&registry);
    let bounds: BoundingBox = config.canvas.bounds();

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if json {
                // One JSON object per line.
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("failed to serialize event: {e}"),
                }
            } else {
                for line in output::format_session_event(&event) {
                    println!("{}", line);
                }
            }
        }
    });

    let mut session =
        FilterSession::new(registry, RustEncoder::new(), catalog, bounds).with_events(tx);
    session.load_bytes(&bytes, mime)?;
    session.select(args.filter.as_str())?;
    let encoded = if args.force {
        session.export_current(format)
    } else {
        session.export_if_available(format)
    };
    let selection = session
        .selection()
        .map(|s| s.to_string())
        .unwrap_or_default();
    // Closes the event channel so the printer can finish.
    drop(session);
    printer.join().map_err(|_| "event printer panicked")?;
    let encoded = match encoded {
        Err(SessionError::ExportUnavailable(name)) => {
            return Err(format!(
                "'{name}' applies no effect, nothing to export (use --force to write the original)"
            )
            .into());
        }
        other => other?,
    };

    if args.data_url {
        println!("{}", imaging::to_data_url(&encoded, format));
    } else {
        let path = args
            .output
            .unwrap_or_else(|| default_output_path(&args.input, &selection, format));
        std::fs::write(&path, &encoded)?;
        if json {
            let report = serde_json::json!({
                "exported": path.display().to_string(),
                "format": format.to_string(),
                "bytes": encoded.len(),
            });
            println!("{}", report);
        } else {
            println!("==> Exported {} ({})", path.display(), format);
        }
    }
    Ok(())
}

/// `<stem>-<filter>.<ext>` in the current directory.
fn default_output_path(input: &Path, selection: &str, format: ExportFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    PathBuf::from(format!("{}-{}.{}", stem, selection, format.extension()))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
