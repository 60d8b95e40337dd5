use anyhow::{bail, Result};

use crate::core::motion::{FrameRecord, LandmarkGroup, LandmarkPoint};
use crate::decoder::{FrameData, FrameSource};
use crate::detector::{DetectorSession, Landmark};
use crate::shared::constants;

/// Runs the detector on one decoded frame and quantizes what it reports.
///
/// `source` is the stream the frame came from; it converts the frame from
/// its native channel order to the RGB the detector expects. Groups the
/// detector did not find become empty groups.
/// A present group whose size does not match its topology is a detector
/// contract violation and fails the call.
pub fn extract(
    frame: &FrameData,
    frame_index: u32,
    source: &dyn FrameSource,
    session: &mut dyn DetectorSession,
) -> Result<FrameRecord> {
    let rgb = source.rgb_view(frame)?;
    let result = session.process(&rgb)?;

    Ok(FrameRecord {
        frame_index,
        pose: convert_group("pose", result.pose.as_deref(), constants::POSE_LANDMARK_COUNT)?,
        left_hand: convert_group(
            "left_hand",
            result.left_hand.as_deref(),
            constants::HAND_LANDMARK_COUNT,
        )?,
        right_hand: convert_group(
            "right_hand",
            result.right_hand.as_deref(),
            constants::HAND_LANDMARK_COUNT,
        )?,
    })
}

fn convert_group(name: &str, landmarks: Option<&[Landmark]>, expected: usize) -> Result<LandmarkGroup> {
    let Some(landmarks) = landmarks else {
        return Ok(Vec::new());
    };

    if landmarks.len() != expected {
        bail!(
            "malformed detector result: {} has {} landmarks, expected {}",
            name,
            landmarks.len(),
            expected
        );
    }

    Ok(landmarks
        .iter()
        .map(|lm| LandmarkPoint::quantized(lm.x, lm.y, lm.z, lm.visibility))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::fake::FakeOpener;
    use crate::decoder::{ChannelOrder, VideoOpener};
    use crate::detector::fake::{self, FakeDetector};
    use crate::detector::{DetectionResult, LandmarkDetector, SessionConfig};
    use std::path::Path;

    /// A one-frame fake stream and its first (BGR) frame
    fn bgr_frame() -> (Box<dyn FrameSource>, FrameData) {
        let mut source = FakeOpener::default()
            .with("clip.mp4", 1, None)
            .open(Path::new("clip.mp4"))
            .unwrap();
        let frame = source.read_frame().unwrap().unwrap();
        (source, frame)
    }

    #[test]
    fn test_full_detection_is_quantized() {
        let detector = FakeDetector::always_full();
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();
        let (source, frame) = bgr_frame();

        let record = extract(&frame, 1, source.as_ref(), session.as_mut()).unwrap();
        assert_eq!(record.frame_index, 1);
        assert_eq!(record.pose.len(), constants::POSE_LANDMARK_COUNT);
        assert_eq!(record.left_hand.len(), constants::HAND_LANDMARK_COUNT);
        assert_eq!(record.right_hand.len(), constants::HAND_LANDMARK_COUNT);

        let p = record.pose[1];
        assert_eq!(p.x, 0.1012);
        assert_eq!(p.y, 0.499);
        assert_eq!(p.z, -0.1235);
        assert_eq!(p.visibility, 0.99);
    }

    #[test]
    fn test_absent_groups_become_empty() {
        let detector = FakeDetector::new(|_| DetectionResult {
            pose: Some(fake::group(constants::POSE_LANDMARK_COUNT, 0.4)),
            ..DetectionResult::default()
        });
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();
        let (source, frame) = bgr_frame();

        let record = extract(&frame, 5, source.as_ref(), session.as_mut()).unwrap();
        assert_eq!(record.frame_index, 5);
        assert!(!record.pose.is_empty());
        assert!(record.left_hand.is_empty());
        assert!(record.right_hand.is_empty());
    }

    #[test]
    fn test_nothing_detected_still_yields_record() {
        let detector = FakeDetector::new(|_| DetectionResult::default());
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();
        let (source, frame) = bgr_frame();

        let record = extract(&frame, 3, source.as_ref(), session.as_mut()).unwrap();
        assert_eq!(record.frame_index, 3);
        assert!(record.is_empty());
    }

    #[test]
    fn test_detector_receives_rgb_once_per_frame() {
        let detector = FakeDetector::always_full();
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();
        let (source, frame) = bgr_frame();

        extract(&frame, 1, source.as_ref(), session.as_mut()).unwrap();
        let counters = detector.counters.borrow();
        assert_eq!(counters.frames_seen, 1);
        assert_eq!(frame.order, ChannelOrder::Bgr);
        assert_eq!(counters.last_order, Some(ChannelOrder::Rgb));
        // fake pixel 1 is B=1 G=100 R=51
        assert_eq!(&counters.last_buffer[..3], &[51, 100, 1]);
    }

    #[test]
    fn test_wrong_group_size_is_rejected() {
        let detector = FakeDetector::new(|_| DetectionResult {
            left_hand: Some(fake::group(5, 0.1)),
            ..DetectionResult::default()
        });
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();
        let (source, frame) = bgr_frame();

        let err = extract(&frame, 1, source.as_ref(), session.as_mut()).unwrap_err();
        assert!(err.to_string().contains("left_hand"));
    }
}
