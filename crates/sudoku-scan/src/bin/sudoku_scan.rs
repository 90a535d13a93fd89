use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use sudoku_scan::core::{GrayImage, RoiSpec};
use sudoku_scan::grid::{stitch_cells, CellLayer, Grid};
use sudoku_scan::io::{GridSummary, ScanConfig, ScanReport};
use sudoku_scan::scan::load_gray;
use sudoku_scan::{DetectionResult, SudokuScanner};

#[cfg(not(feature = "tracing"))]
use log::{info, LevelFilter};
#[cfg(feature = "tracing")]
use tracing::info;

/// Locate sudoku puzzles in photos and cut them into cells.
#[derive(Parser)]
#[command(name = "sudoku-scan")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// JSON scanner config; defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the puzzle corners, normalized to the image size.
    Detect(DetectArgs),
    /// Detect (or take given corners) and cut the puzzle into 81 cells.
    Extract(ExtractArgs),
    /// Crop a region of interest, then detect and extract inside it.
    Roi(RoiArgs),
    /// Overwrite the image with its detection threshold.
    DebugDetect(DebugDetectArgs),
    /// Overwrite the image with the stitched thresholded cells.
    DebugExtract(DebugExtractArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct DetectArgs {
    image: PathBuf,
    #[command(flatten)]
    out: ReportArgs,
}

#[derive(Args)]
struct ExtractArgs {
    image: PathBuf,
    /// JSON file holding a `DetectionResult` (or a report containing one).
    #[arg(long)]
    corners: Option<PathBuf>,
    /// Save the stitched thresholded cells as an image.
    #[arg(long)]
    stitched: Option<PathBuf>,
    #[command(flatten)]
    out: ReportArgs,
}

#[derive(Args)]
struct RoiArgs {
    image: PathBuf,
    /// Fixed ROI side in pixels.
    #[arg(long, conflicts_with = "size_pct")]
    size_px: Option<u32>,
    /// Fixed ROI vertical offset in pixels, positive moves up.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset_px: i32,
    /// Relative ROI side as a fraction of the fitted width.
    #[arg(long)]
    size_pct: Option<f64>,
    /// Relative ROI vertical offset as a fraction of the fitted height.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset_pct: f64,
    /// Height / width of the fitted frame for relative ROIs.
    #[arg(long, default_value_t = 1.0)]
    aspect_ratio: f64,
    #[arg(long)]
    stitched: Option<PathBuf>,
    #[command(flatten)]
    out: ReportArgs,
}

#[derive(Args)]
struct DebugDetectArgs {
    image: PathBuf,
}

#[derive(Args)]
struct DebugExtractArgs {
    image: PathBuf,
    /// JSON file holding a `DetectionResult`; detected when omitted.
    #[arg(long)]
    corners: Option<PathBuf>,
}

fn main() -> CliResult {
    let cli = Cli::parse();

    #[cfg(not(feature = "tracing"))]
    {
        let level = cli.log_level.parse().unwrap_or(LevelFilter::Warn);
        sudoku_scan::core::init_with_level(level)?;
    }
    #[cfg(feature = "tracing")]
    sudoku_scan::core::init_tracing(false);

    let config = match &cli.config {
        Some(path) => ScanConfig::load_json(path)?,
        None => ScanConfig::default(),
    };
    let scanner = config.build_scanner();

    match cli.command {
        Commands::Detect(args) => run_detect(&scanner, args),
        Commands::Extract(args) => run_extract(&scanner, args),
        Commands::Roi(args) => run_roi(&scanner, &config, args),
        Commands::DebugDetect(args) => {
            report_flag(scanner.debug_grid_detection(&args.image), &args.image)
        }
        Commands::DebugExtract(args) => {
            let corners = match &args.corners {
                Some(path) => load_corners(path)?,
                None => scanner.detect_grid(&args.image)?,
            };
            report_flag(
                scanner.debug_grid_extraction(&args.image, &corners),
                &args.image,
            )
        }
    }
}

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

fn run_detect(scanner: &SudokuScanner, args: DetectArgs) -> CliResult {
    with_report(&args.image, args.out.report.as_deref(), |report| {
        let detection = scanner.detect_grid(&args.image)?;
        info!("corners: {detection:?}");
        report.detection = Some(detection);
        Ok(())
    })
}

fn run_extract(scanner: &SudokuScanner, args: ExtractArgs) -> CliResult {
    with_report(&args.image, args.out.report.as_deref(), |report| {
        let corners = match &args.corners {
            Some(path) => load_corners(path)?,
            None => scanner.detect_grid(&args.image)?,
        };
        report.detection = Some(corners);
        let grid = scanner.extract_grid(&args.image, &corners)?;
        info!("extracted {} cells of {} px", grid.cells().len(), grid.cell_size());

        report.grid = Some(GridSummary::from(&grid));
        save_stitched(&grid, args.stitched.as_deref())
    })
}

fn run_roi(scanner: &SudokuScanner, config: &ScanConfig, args: RoiArgs) -> CliResult {
    let roi = match (args.size_px, args.size_pct, config.roi) {
        (Some(size_px), _, _) => RoiSpec::Fixed {
            size_px,
            offset_px: args.offset_px,
        },
        (None, Some(size_pct), _) => RoiSpec::Relative {
            size_pct,
            offset_pct: args.offset_pct,
            aspect_ratio: args.aspect_ratio,
        },
        (None, None, Some(roi)) => roi,
        (None, None, None) => return Err("roi needs --size-px, --size-pct or a config roi".into()),
    };

    with_report(&args.image, args.out.report.as_deref(), |report| {
        let scan = scanner.scan_roi(&args.image, &roi)?;
        report.roi = Some(scan.rect);
        report.detection = Some(scan.detection);
        report.corner_method = Some(scan.source.into());
        report.grid = Some(GridSummary::from(&scan.grid));
        save_stitched(&scan.grid, args.stitched.as_deref())
    })
}

/// Run `fill` against a fresh report and emit it.
///
/// On failure the report is still written to `out` (when given) with
/// `error` set, then the error is returned.
fn with_report(
    image: &Path,
    out: Option<&Path>,
    fill: impl FnOnce(&mut ScanReport) -> CliResult,
) -> CliResult {
    let mut report = base_report(image);
    match fill(&mut report) {
        Ok(()) => emit(&report, out),
        Err(err) => {
            report.error = Some(err.to_string());
            if let Some(path) = out {
                report.write_json(path)?;
            }
            Err(err)
        }
    }
}

fn base_report(image: &Path) -> ScanReport {
    let mut report = ScanReport::new(image.to_string_lossy());
    if let Ok(img) = load_gray(image) {
        report.image_width = img.width() as usize;
        report.image_height = img.height() as usize;
    }
    report
}

/// Accepts either a bare `DetectionResult` or a report that carries one.
fn load_corners(path: &Path) -> CliResult<DetectionResult> {
    let raw = std::fs::read_to_string(path)?;
    if let Ok(corners) = serde_json::from_str::<DetectionResult>(&raw) {
        return Ok(corners);
    }
    let report: ScanReport = serde_json::from_str(&raw)?;
    report
        .detection
        .ok_or_else(|| format!("{} has no detection", path.display()).into())
}

fn save_stitched(grid: &Grid, path: Option<&Path>) -> CliResult {
    let Some(path) = path else {
        return Ok(());
    };
    let GrayImage {
        width,
        height,
        data,
    } = stitch_cells(grid, CellLayer::Binary);
    image::GrayImage::from_raw(width as u32, height as u32, data)
        .ok_or("stitched buffer does not match its size")?
        .save(path)?;
    Ok(())
}

fn emit(report: &ScanReport, path: Option<&Path>) -> CliResult {
    match path {
        Some(path) => report.write_json(path)?,
        None => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn report_flag(ok: bool, image: &Path) -> CliResult {
    if ok {
        println!("wrote {}", image.display());
        Ok(())
    } else {
        Err(format!("could not write debug output to {}", image.display()).into())
    }
}
