use anyhow::{bail, Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::extractor;
use crate::core::motion::MotionSequence;
use crate::decoder::{FrameSource, VideoOpener};
use crate::detector::{DetectorSession, LandmarkDetector, SessionConfig};
use crate::shared::constants;
use crate::utils::{file_utils, logger, time_utils};

/// Why decoding of a video stopped. Both cases keep the frames read so far.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    EndOfStream,
    ReadFailure(String),
}

#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub frames: usize,
    pub stop: StopReason,
    pub output: PathBuf,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum FileOutcome {
    Saved(VideoSummary),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Saved(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn failed_names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Failed(_)))
            .map(|f| {
                f.path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| f.path.display().to_string())
            })
            .collect()
    }

    pub fn total_frames(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.outcome {
                FileOutcome::Saved(summary) => summary.frames,
                FileOutcome::Failed(_) => 0,
            })
            .sum()
    }
}

/// Drives open -> decode -> extract -> save for every video in a directory,
/// one video at a time.
pub struct BatchPipeline<'a> {
    opener: &'a dyn VideoOpener,
    detector: &'a dyn LandmarkDetector,
}

impl<'a> BatchPipeline<'a> {
    pub fn new(opener: &'a dyn VideoOpener, detector: &'a dyn LandmarkDetector) -> Self {
        Self { opener, detector }
    }

    /// Fails only when `input_dir` cannot be listed. Per-file problems end up
    /// in the returned report.
    pub fn process_directory(&self, input_dir: &Path, extensions: &[&str]) -> Result<BatchReport> {
        if !input_dir.is_dir() {
            bail!("The folder '{}' does not exist.", input_dir.display());
        }

        println!("Scanning for videos in: {}", input_dir.display());
        let videos = file_utils::list_files(input_dir, extensions)?;

        let mut report = BatchReport::default();
        if videos.is_empty() {
            println!("No video files found in the specified folder.");
            logger::info(&format!("no videos in {}", input_dir.display()));
            return Ok(report);
        }

        let names: Vec<String> = videos
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect();
        println!("Found {} videos: {:?}", videos.len(), names);

        for video in videos {
            let name = video
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| video.display().to_string());
            println!("\n--- Processing: {} ---", name);

            let output = file_utils::output_path_for(&video);
            let outcome = self.process_isolated(&video, &output);
            report_file(&video, &outcome);
            report.files.push(FileReport { path: video, outcome });
        }

        println!(
            "\nAll videos processed! {} succeeded, {} failed, {} frames total.",
            report.succeeded(),
            report.failed(),
            report.total_frames()
        );
        let failed = report.failed_names();
        if !failed.is_empty() {
            eprintln!("Failed: {}", failed.join(", "));
        }
        Ok(report)
    }

    /// Runs one video, turning errors and panics into a failed outcome so
    /// they never reach the batch loop.
    pub fn process_isolated(&self, video: &Path, output: &Path) -> FileOutcome {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process_video(video, output)));
        match result {
            Ok(Ok(summary)) => FileOutcome::Saved(summary),
            Ok(Err(e)) => FileOutcome::Failed(format!("{:#}", e)),
            Err(payload) => FileOutcome::Failed(format!("panicked: {}", panic_message(&*payload))),
        }
    }

    /// Decodes `video` into a [`MotionSequence`] and writes it to `output`.
    ///
    /// A read failure mid-stream ends the sequence early and is not an error.
    /// Open failures and detector errors are, and nothing is written for them.
    pub fn process_video(&self, video: &Path, output: &Path) -> Result<VideoSummary> {
        let timer = time_utils::Timer::new();

        let mut source = self
            .opener
            .open(video)
            .with_context(|| format!("Could not open video {}", video.display()))?;

        match source.frame_count_hint() {
            Some(n) => println!("Processing {} (~{} frames)...", video.display(), n),
            None => println!("Processing {}...", video.display()),
        }

        let mut session = self
            .detector
            .create_session(&SessionConfig::HOLISTIC)
            .context("failed to start landmark detector")?;

        let (sequence, stop) = read_sequence(source.as_mut(), session.as_mut())
            .with_context(|| format!("landmark extraction failed for {}", video.display()))?;

        // release decoder and model before touching the output
        drop(session);
        drop(source);

        if let StopReason::ReadFailure(reason) = &stop {
            logger::info(&format!(
                "{}: decoding stopped after {} frames: {}",
                video.display(),
                sequence.len(),
                reason
            ));
        }

        sequence.save(output)?;

        Ok(VideoSummary {
            frames: sequence.len(),
            stop,
            output: output.to_path_buf(),
            elapsed: timer.elapsed(),
        })
    }
}

fn read_sequence(
    source: &mut dyn FrameSource,
    session: &mut dyn DetectorSession,
) -> Result<(MotionSequence, StopReason)> {
    let mut sequence = MotionSequence::new();

    let stop = loop {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break StopReason::EndOfStream,
            Err(e) => break StopReason::ReadFailure(format!("{:#}", e)),
        };

        let frame_index = sequence.next_index();
        let record = extractor::extract(&frame, frame_index, &*source, session)
            .with_context(|| format!("frame {}", frame_index))?;
        sequence.push(record);

        if frame_index % constants::PROGRESS_INTERVAL == 0 {
            println!("Processed {} frames...", frame_index);
        }
    };

    Ok((sequence, stop))
}

fn report_file(video: &Path, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Saved(summary) => {
            println!(
                "Success! Processed {} frames ({:.1} fps).",
                summary.frames,
                time_utils::throughput(summary.frames, summary.elapsed)
            );
            if let StopReason::ReadFailure(reason) = &summary.stop {
                println!("Note: decoding stopped early ({}); partial data kept.", reason);
            }
            println!("Data saved to: {}", summary.output.display());
            logger::info(&format!(
                "{}: {} frames -> {}",
                video.display(),
                summary.frames,
                summary.output.display()
            ));
        }
        FileOutcome::Failed(reason) => {
            eprintln!("Error: {}", reason);
            logger::error(&format!("{}: {}", video.display(), reason));
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
