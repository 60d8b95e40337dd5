mod core;
mod decoder;
mod detector;
mod shared;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::core::{BatchPipeline, FileOutcome, MotionSequence};
use crate::decoder::OpenCvOpener;
use crate::detector::SubprocessDetector;
use crate::shared::constants;
use crate::utils::config::Settings;
use crate::utils::{file_utils, logger};

#[derive(Parser)]
#[command(author, version, about = "Extract per-frame body and hand landmarks from videos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DetectorArgs {
    /// Landmark helper executable (overrides `detector-command` in the config)
    #[arg(short, long)]
    detector: Option<String>,
    /// Extra argument for the helper, repeatable (overrides `detector-args`)
    #[arg(long = "detector-arg", allow_hyphen_values = true)]
    detector_args: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract landmarks for every video in a directory
    Extract {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Extract landmarks for a single video
    ExtractFile {
        #[arg(short, long)]
        video: PathBuf,
        /// Defaults to <video>.json next to the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Summarize an extracted motion file
    Inspect {
        #[arg(short, long)]
        json: PathBuf,
    },
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { input, detector } => {
            let settings = Settings::load();
            let input_dir = input
                .or_else(|| settings.input_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let detector = build_detector(&detector, &settings);

            logger::info(&format!("extract: dir={}", input_dir.display()));
            BatchPipeline::new(&OpenCvOpener, &detector)
                .process_directory(&input_dir, constants::VIDEO_EXTENSIONS)?;
        }
        Commands::ExtractFile { video, output, detector } => {
            let settings = Settings::load();
            let output = output.unwrap_or_else(|| file_utils::output_path_for(&video));
            let detector = build_detector(&detector, &settings);

            logger::info(&format!("extract-file: {} -> {}", video.display(), output.display()));
            match BatchPipeline::new(&OpenCvOpener, &detector).process_isolated(&video, &output) {
                FileOutcome::Saved(summary) => {
                    println!("Success! Processed {} frames.", summary.frames);
                    println!("Data saved to: {}", summary.output.display());
                }
                FileOutcome::Failed(reason) => {
                    eprintln!("Error: {}", reason);
                    logger::error(&reason);
                }
            }
        }
        Commands::Inspect { json } => inspect(&json)?,
    }

    Ok(())
}

fn build_detector(args: &DetectorArgs, settings: &Settings) -> SubprocessDetector {
    let program = args
        .detector
        .clone()
        .or_else(|| settings.detector_command.clone())
        .unwrap_or_else(|| constants::DEFAULT_DETECTOR_COMMAND.to_string());
    let extra = if args.detector_args.is_empty() {
        settings.detector_args.clone()
    } else {
        args.detector_args.clone()
    };
    SubprocessDetector::new(program, extra)
}

fn inspect(path: &Path) -> Result<()> {
    let sequence = MotionSequence::load(path)?;
    if sequence.is_empty() {
        println!("{}: no frames", path.display());
        return Ok(());
    }

    let coverage = sequence.coverage();
    let pct = |n: usize| n as f64 * 100.0 / coverage.frames as f64;
    let last = sequence.frames().last().map(|f| f.frame_index).unwrap_or(0);

    println!("{}: {} frames (last index {})", path.display(), coverage.frames, last);
    println!("  pose:       {:>6} ({:.1}%)", coverage.pose, pct(coverage.pose));
    println!("  left hand:  {:>6} ({:.1}%)", coverage.left_hand, pct(coverage.left_hand));
    println!("  right hand: {:>6} ({:.1}%)", coverage.right_hand, pct(coverage.right_hand));
    println!("  nothing:    {:>6} ({:.1}%)", coverage.empty, pct(coverage.empty));
    Ok(())
}
