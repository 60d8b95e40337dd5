//! Landmark detection collaborator.
//!
//! The holistic model is an external black box. The pipeline only sees the
//! [`LandmarkDetector`] / [`DetectorSession`] pair, so tests can plug in a
//! deterministic fake.

pub mod subprocess;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::decoder::FrameData;
use crate::shared::constants;

pub use subprocess::SubprocessDetector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    /// 0 = lite, 1 = balanced, 2 = heavy
    pub model_complexity: u8,
}

impl SessionConfig {
    /// The only configuration the pipeline uses; output parity depends on it.
    pub const HOLISTIC: SessionConfig = SessionConfig {
        min_detection_confidence: constants::MIN_DETECTION_CONFIDENCE,
        min_tracking_confidence: constants::MIN_TRACKING_CONFIDENCE,
        model_complexity: constants::MODEL_COMPLEXITY_BALANCED,
    };
}

/// Raw landmark as reported by the model, before quantization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

/// Per-frame detector output. `None` means the group was not found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub pose: Option<Vec<Landmark>>,
    #[serde(default)]
    pub left_hand: Option<Vec<Landmark>>,
    #[serde(default)]
    pub right_hand: Option<Vec<Landmark>>,
}

/// Creates stateful detection sessions, one per video.
pub trait LandmarkDetector {
    fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn DetectorSession>>;
}

/// A live model handle. May carry tracking context between consecutive frames;
/// dropping it closes the session.
pub trait DetectorSession {
    /// `frame` is always in RGB order.
    fn process(&mut self, frame: &FrameData) -> Result<DetectionResult>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holistic_config_is_fixed() {
        let config = SessionConfig::HOLISTIC;
        assert_eq!(config.min_detection_confidence, 0.5);
        assert_eq!(config.min_tracking_confidence, 0.5);
        assert_eq!(config.model_complexity, 1);
    }

    #[test]
    fn test_detection_result_accepts_null_and_missing_groups() {
        let json = r#"{"pose":[{"x":0.1,"y":0.2,"z":0.3}],"left_hand":null}"#;
        let result: DetectionResult = serde_json::from_str(json).unwrap();
        let pose = result.pose.unwrap();
        assert_eq!(pose.len(), 1);
        assert_eq!(pose[0].visibility, None);
        assert!(result.left_hand.is_none());
        assert!(result.right_hand.is_none());
    }
}
