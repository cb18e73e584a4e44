use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use track_align::config::{Config, ConfigFormat};
use track_align::visualization::print_result;
use track_align::*;

#[derive(Parser)]
#[command(name = "align")]
#[command(about = "Register a stitched mosaic against a vision image using chip track crosses")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Chip template file (x periods line, y periods line); overrides the config
    #[arg(long, global = true)]
    chip_template: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the rotation and offset between a transformed and a vision image
    Align {
        /// Transformed (stitched and rescaled) image
        #[arg(short, long)]
        transformed: PathBuf,

        /// Vision image generated from the expression matrix
        #[arg(short = 'V', long)]
        vision: PathBuf,

        /// Cross points of the transformed image (x y idx_x idx_y per line)
        #[arg(long)]
        transformed_points: PathBuf,

        /// Cross points of the vision image (x y idx_x idx_y per line)
        #[arg(long)]
        vision_points: PathBuf,

        /// Mirror the transformed image left to right before aligning
        #[arg(long)]
        flip: bool,

        /// Output file for the JSON result
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Map stitched-mosaic cross points into transformed-image pixels
    AdjustCross {
        /// Cross points in stitched-mosaic coordinates
        #[arg(short, long)]
        points: PathBuf,

        #[arg(long)]
        scale_x: f64,

        #[arg(long)]
        scale_y: f64,

        #[arg(long)]
        stitched_height: f64,

        #[arg(long)]
        stitched_width: f64,

        #[arg(long)]
        new_height: f64,

        #[arg(long)]
        new_width: f64,

        /// Rotation in degrees applied to the scaled mosaic
        #[arg(long, default_value = "0")]
        rotation: f64,

        #[arg(long)]
        flip: bool,

        /// Output file for the adjusted points
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default configuration
    InitConfig {
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value = "toml")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Toml,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    match cli.verbose {
        0 => {}
        1 => config.logging.global_level = "info".to_string(),
        2 => config.logging.global_level = "debug".to_string(),
        _ => config.logging.global_level = "trace".to_string(),
    }
    let _log_guard = logging::init_logging(&config.logging)?;

    // An explicitly passed config is never swapped for defaults.
    if let Err(errors) = config.validate() {
        for error in &errors {
            tracing::error!("configuration error: {}", error);
        }
        return Err(AlignError::InvalidConfig(errors).into());
    }

    if let Some(path) = &cli.chip_template {
        let template = load_chip_template(path)
            .with_context(|| format!("loading chip template {}", path.display()))?;
        config.chip_template = Some(template);
    }

    match cli.command {
        Commands::Align {
            transformed,
            vision,
            transformed_points,
            vision_points,
            flip,
            output,
        } => handle_align(
            &config,
            &transformed,
            &vision,
            &transformed_points,
            &vision_points,
            flip,
            output.as_deref(),
        ),
        Commands::AdjustCross {
            points,
            scale_x,
            scale_y,
            stitched_height,
            stitched_width,
            new_height,
            new_width,
            rotation,
            flip,
            output,
        } => {
            let chip_template = config
                .chip_template
                .as_ref()
                .context("adjust-cross needs a chip template (config or --chip-template)")?;
            let stitched = load_landmarks(&points)
                .with_context(|| format!("loading {}", points.display()))?;

            let adjusted = adjust_cross(
                &stitched,
                (scale_x, scale_y),
                Shape::new(stitched_height, stitched_width),
                Shape::new(new_height, new_width),
                chip_template,
                rotation,
                flip,
            );
            save_landmarks(&adjusted, &output)
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(count = adjusted.len(), output = %output.display(), "cross points adjusted");
            Ok(())
        }
        Commands::InitConfig { output, format } => {
            let format = match format {
                OutputFormat::Toml => ConfigFormat::Toml,
                OutputFormat::Json => ConfigFormat::Json,
            };
            Config::default()
                .save_to_file(&output, format)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Default configuration written to {}", output.display());
            Ok(())
        }
    }
}

fn handle_align(
    config: &Config,
    transformed_path: &Path,
    vision_path: &Path,
    transformed_points: &Path,
    vision_points: &Path,
    flip: bool,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let chip_template = config
        .chip_template
        .clone()
        .context("align needs a chip template (config or --chip-template)")?;

    let transformed = load_image(transformed_path)
        .with_context(|| format!("loading {}", transformed_path.display()))?;
    let vision = load_image(vision_path)
        .with_context(|| format!("loading {}", vision_path.display()))?;
    let stitch_tc = load_landmarks(transformed_points)
        .with_context(|| format!("loading {}", transformed_points.display()))?;
    let vision_cp = load_landmarks(vision_points)
        .with_context(|| format!("loading {}", vision_points.display()))?;

    tracing::info!(
        transformed = ?transformed.dim(),
        vision = ?vision.dim(),
        transformed_points = stitch_tc.len(),
        vision_points = vision_cp.len(),
        "inputs loaded"
    );

    let aligner = AlignByTrack::new(config.alignment.clone())?.with_chip_template(chip_template)?;
    let result = aligner.run(transformed.view(), vision.view(), &vision_cp, &stitch_tc, flip)?;

    print_result(&result);

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("writing {}", output_path.display()))?;
        println!("Result saved to {}", output_path.display());
    }

    Ok(())
}
