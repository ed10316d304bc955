//! Label the glyphs of a score image
//!
//! Binarizes the image, labels connected glyphs, links close glyphs and prints
//! a summary of the glyphs and of the connected sets of parts.
//!
//! Usage:
//!   cargo run --release --bin omr_glyphs -- score.png
//!   cargo run --release --bin omr_glyphs -- score.png --config glyphs.json --gap 3 --verbose

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use omr_glyphs::config::{GlyphConfig, LogLevel};
use omr_glyphs::glyph::{bounds_of, build_links, connected_sets, GlyphFactory};

struct CliConfig {
    image: Option<PathBuf>,
    config: Option<PathBuf>,
    gap: Option<f64>,
    verbose: bool,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self {
            image: None,
            config: None,
            gap: None,
            verbose: false,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        cli.config = Some(PathBuf::from(&args[i]));
                    }
                },
                "--gap" => {
                    i += 1;
                    if i < args.len() {
                        let gap = args[i]
                            .parse::<f64>()
                            .map_err(|e| format!("invalid gap '{}': {}", args[i], e))?;
                        cli.gap = Some(gap);
                    }
                },
                "--verbose" | "-v" => {
                    cli.verbose = true;
                },
                other if !other.starts_with('-') && cli.image.is_none() => {
                    cli.image = Some(PathBuf::from(other));
                },
                other => return Err(format!("unexpected argument '{}'", other)),
            }
            i += 1;
        }

        Ok(cli)
    }
}

fn print_usage() {
    eprintln!("Usage: omr_glyphs <image> [--config cfg.json] [--gap N] [--verbose]");
}

fn run(cli: &CliConfig, image_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => GlyphConfig::from_path(path)?,
        None => GlyphConfig::default(),
    };
    if let Some(gap) = cli.gap {
        config = config.with_max_gap(gap);
    }
    if cli.verbose {
        config = config.with_log_level(LogLevel::Debug);
    }
    config.validate()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_env("RUST_LOG")
        .init();

    let start = Instant::now();
    let image = image::open(image_path)?.to_luma8();
    let table = config.binarization.factory().create_table(&image);
    println!(
        "Image: {}x{}, {} runs, {} foreground pixels",
        image.width(),
        image.height(),
        table.run_count(),
        table.weight()
    );

    let glyphs = GlyphFactory::new(&table).build_glyphs()?;
    println!("Glyphs: {}", glyphs.len());
    if cli.verbose {
        for glyph in &glyphs {
            println!("  {}", glyph);
        }
    }

    let metric = config.links.distance();
    let graph = build_links(glyphs, config.links.max_gap, metric.as_ref())?;
    println!(
        "Links: {} (max gap {}, {:?})",
        graph.edge_count(),
        config.links.max_gap,
        config.links.metric
    );

    let sets = connected_sets(&graph);
    let multi: Vec<_> = sets.iter().filter(|set| set.len() > 1).collect();
    println!("Connected sets: {} ({} with several parts)", sets.len(), multi.len());
    for set in multi {
        if let Some(bounds) = bounds_of(set.iter().map(|&part| &graph[part])) {
            println!(
                "  {} parts at x:{} y:{} w:{} h:{}",
                set.len(),
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height
            );
        }
    }

    println!("Elapsed: {:.2?}", start.elapsed());
    Ok(())
}

fn main() -> ExitCode {
    let cli = match CliConfig::from_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::from(2);
        },
    };

    let Some(image_path) = cli.image.clone() else {
        print_usage();
        return ExitCode::from(2);
    };

    match run(&cli, &image_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
