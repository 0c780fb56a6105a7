use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use gridpop::{
    layouts_for, load_templates, CompositionState, EngineOptions, GridOptions, Layout,
    MaskFileSegmenter, Orientation, PopoutEngine, ProcessResult, SegmentationQuality, StickerStyle,
    Vec2,
};

#[derive(Parser)]
#[command(
    name = "gridpop",
    about = "Composite a person cutout over a 3x3 photo grid",
    version,
    after_help = "The person mask is a grayscale confidence raster produced by an\n\
                  external segmentation model (white = person). Example:\n\n\
                  gridpop -s person.jpg -m person_mask.png -o out.png g1.jpg g2.jpg g3.jpg"
)]
struct Cli {
    /// Photos tiling the background grid (up to 9, fewer cycle)
    grid: Vec<PathBuf>,

    /// Subject photo containing the person
    #[arg(short, long)]
    subject: Option<PathBuf>,

    /// Grayscale segmentation mask for the subject photo
    #[arg(short, long)]
    mask: Option<PathBuf>,

    /// Output file (default: {subject}_grid.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Cutout offset from the grid center, as a fraction of the grid edge
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    offset_x: f64,

    /// Cutout vertical offset, as a fraction of the grid edge
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    offset_y: f64,

    /// Cutout scale multiplier (default: adapted to the cutout's aspect)
    #[arg(long)]
    scale: Option<f64>,

    /// Grid raster edge in pixels
    #[arg(long, default_value = "1080")]
    grid_size: u32,

    /// Gap between grid cells in pixels
    #[arg(long, default_value = "4")]
    spacing: u32,

    /// EXIF orientation of the subject photo (1-8)
    #[arg(long, default_value = "1")]
    orientation: u16,

    /// Segmentation quality hint: fast, balanced, or accurate
    #[arg(long, default_value = "accurate")]
    quality: String,

    /// Print the built-in layouts for an image count and exit
    #[arg(long, value_name = "COUNT")]
    list_layouts: Option<usize>,

    /// Load layout templates from a directory instead of the built-ins
    #[arg(long, value_name = "DIR")]
    templates: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(count) = cli.list_layouts {
        list_layouts(count, cli.templates.as_deref());
        return;
    }

    let (Some(subject), Some(mask)) = (&cli.subject, &cli.mask) else {
        eprintln!("Error: --subject and --mask are required (or use --list-layouts)");
        process::exit(1);
    };
    if cli.grid.is_empty() {
        eprintln!("Error: at least one grid photo is required");
        process::exit(1);
    }
    for path in std::iter::once(subject).chain(cli.grid.iter()) {
        if !path.exists() {
            eprintln!("Error: input path does not exist: {}", path.display());
            process::exit(1);
        }
    }

    let Some(orientation) = Orientation::from_exif(cli.orientation) else {
        eprintln!("Error: orientation must be 1 through 8");
        process::exit(1);
    };

    let quality = match cli.quality.as_str() {
        "fast" => SegmentationQuality::Fast,
        "balanced" => SegmentationQuality::Balanced,
        "accurate" => SegmentationQuality::Accurate,
        other => {
            eprintln!("Error: unknown quality `{other}`");
            process::exit(1);
        }
    };

    let placement = cli.scale.map(|scale| CompositionState {
        offset: Vec2::new(cli.offset_x, cli.offset_y),
        scale,
    });

    let options = EngineOptions {
        quality,
        style: StickerStyle::default(),
        grid: GridOptions {
            size: cli.grid_size,
            spacing: cli.spacing,
        },
        orientation,
        placement,
    };

    let engine = PopoutEngine::with_options(Box::new(MaskFileSegmenter::new(mask)), options);

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(subject));

    let result = engine.process_file(subject, &cli.grid, &output);
    print_result(&result, cli.quiet);
    if !result.success {
        process::exit(1);
    }
}

fn list_layouts(count: usize, templates: Option<&Path>) {
    let layouts: Vec<Layout> = match templates {
        Some(dir) => match load_templates(dir, Some(count)) {
            Ok(templates) => templates.into_iter().map(Layout::from_template).collect(),
            Err(err) => {
                eprintln!("Error: could not read templates: {err}");
                process::exit(1);
            }
        },
        None => layouts_for(count),
    };

    if layouts.is_empty() {
        println!("no layouts for {count} images");
        return;
    }
    for layout in layouts {
        println!(
            "{} (aspect {:.3}, {} parameters)",
            layout.name(),
            layout.aspect_ratio(),
            layout.parameters().len()
        );
        for cell in layout.cells() {
            println!(
                "  ({:.3}, {:.3}) {:.3} x {:.3}",
                cell.frame.x, cell.frame.y, cell.frame.width, cell.frame.height
            );
        }
    }
}

/// `person.jpg` becomes `person_grid.png`: composites keep alpha-capable
/// output by default.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_grid.png"))
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!("[OK] {filename}: {}", result.message);
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}
