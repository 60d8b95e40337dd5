pub const APP_NAME: &str = "motion-extract";

pub const CONFIG_FILE: &str = "motion-extract.config";
pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];
pub const OUTPUT_EXTENSION: &str = "json";

/// Print a progress line every N frames
pub const PROGRESS_INTERVAL: u32 = 100;

pub const MIN_DETECTION_CONFIDENCE: f32 = 0.5;
pub const MIN_TRACKING_CONFIDENCE: f32 = 0.5;
pub const MODEL_COMPLEXITY_BALANCED: u8 = 1;

/// Landmark counts per group, fixed by the holistic model topology
pub const POSE_LANDMARK_COUNT: usize = 33;
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const COORD_DECIMALS: u32 = 4;
pub const VISIBILITY_DECIMALS: u32 = 2;

/// Helper executable used when neither the CLI nor the config names one
pub const DEFAULT_DETECTOR_COMMAND: &str = "holistic-landmarker";
