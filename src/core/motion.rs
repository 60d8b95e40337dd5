use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::shared::constants;

/// Rounds half away from zero to `decimals` places.
/// Applying it twice gives the same value as applying it once.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// One landmark, quantized for storage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(rename = "vis", alias = "visibility")]
    pub visibility: f64,
}

impl LandmarkPoint {
    /// Missing visibility defaults to full confidence.
    pub fn quantized(x: f64, y: f64, z: f64, visibility: Option<f64>) -> Self {
        Self {
            x: round_to(x, constants::COORD_DECIMALS),
            y: round_to(y, constants::COORD_DECIMALS),
            z: round_to(z, constants::COORD_DECIMALS),
            visibility: visibility
                .map(|v| round_to(v, constants::VISIBILITY_DECIMALS))
                .unwrap_or(1.0),
        }
    }
}

/// Index-significant points of one topology; empty when the group was not detected.
pub type LandmarkGroup = Vec<LandmarkPoint>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_index: u32,
    pub pose: LandmarkGroup,
    pub left_hand: LandmarkGroup,
    pub right_hand: LandmarkGroup,
}

impl FrameRecord {
    pub fn is_empty(&self) -> bool {
        self.pose.is_empty() && self.left_hand.is_empty() && self.right_hand.is_empty()
    }
}

/// All frames of one video, in decode order. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionSequence {
    frames: Vec<FrameRecord>,
}

impl MotionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next pushed record must carry.
    pub fn next_index(&self) -> u32 {
        self.frames.len() as u32 + 1
    }

    pub fn push(&mut self, record: FrameRecord) {
        debug_assert_eq!(record.frame_index, self.next_index(), "frame indices must be contiguous");
        self.frames.push(record);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Compact JSON, overwriting whatever is at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .with_context(|| format!("Failed to serialize motion data to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open motion file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse motion file: {}", path.display()))
    }

    pub fn coverage(&self) -> Coverage {
        let mut coverage = Coverage {
            frames: self.frames.len(),
            ..Coverage::default()
        };
        for frame in &self.frames {
            coverage.pose += usize::from(!frame.pose.is_empty());
            coverage.left_hand += usize::from(!frame.left_hand.is_empty());
            coverage.right_hand += usize::from(!frame.right_hand.is_empty());
            coverage.empty += usize::from(frame.is_empty());
        }
        coverage
    }
}

/// How many frames carry each landmark group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub frames: usize,
    pub pose: usize,
    pub left_hand: usize,
    pub right_hand: usize,
    pub empty: usize,
}
