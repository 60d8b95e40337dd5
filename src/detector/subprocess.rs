use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::{DetectionResult, DetectorSession, LandmarkDetector, SessionConfig};
use crate::decoder::{ChannelOrder, FrameData};
use crate::utils::logger;

/// Runs the holistic model in a helper process.
///
/// Wire format, one exchange per frame:
/// - request: a JSON header line `{"width":W,"height":H,"format":"rgb24"}`
///   followed by exactly `W*H*3` raw bytes
/// - response: one JSON line holding a [`DetectionResult`]
pub struct SubprocessDetector {
    program: String,
    args: Vec<String>,
}

impl SubprocessDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn session_args(&self, config: &SessionConfig) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "--min-detection-confidence".to_string(),
            config.min_detection_confidence.to_string(),
            "--min-tracking-confidence".to_string(),
            config.min_tracking_confidence.to_string(),
            "--model-complexity".to_string(),
            config.model_complexity.to_string(),
        ]);
        args
    }
}

impl LandmarkDetector for SubprocessDetector {
    fn create_session(&self, config: &SessionConfig) -> Result<Box<dyn DetectorSession>> {
        let args = self.session_args(config);
        logger::debug(&format!("Starting detector: {} {}", self.program, args.join(" ")));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector '{}'", self.program))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("detector stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("detector stdout was not captured"))?;

        Ok(Box::new(SubprocessSession {
            child,
            stdin: Some(BufWriter::new(stdin)),
            stdout: BufReader::new(stdout),
            line: String::new(),
        }))
    }
}

#[derive(Serialize)]
struct FrameHeader<'a> {
    width: u32,
    height: u32,
    format: &'a str,
}

struct SubprocessSession {
    child: Child,
    // Option so Drop can close the pipe before waiting on the child
    stdin: Option<BufWriter<ChildStdin>>,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl DetectorSession for SubprocessSession {
    fn process(&mut self, frame: &FrameData) -> Result<DetectionResult> {
        if frame.order != ChannelOrder::Rgb {
            bail!("detector expects RGB frames, got {:?}", frame.order);
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("detector session already closed"))?;

        let header = FrameHeader {
            width: frame.width,
            height: frame.height,
            format: "rgb24",
        };
        serde_json::to_writer(&mut *stdin, &header)?;
        stdin.write_all(b"\n")?;
        stdin.write_all(&frame.buffer)?;
        stdin
            .flush()
            .context("failed to send frame to detector")?;

        self.line.clear();
        let read = self
            .stdout
            .read_line(&mut self.line)
            .context("failed to read detector response")?;
        if read == 0 {
            bail!("detector exited before answering");
        }

        serde_json::from_str(self.line.trim_end())
            .with_context(|| format!("malformed detector response: {}", self.line.trim_end()))
    }
}

impl Drop for SubprocessSession {
    fn drop(&mut self) {
        // closing stdin tells the helper there are no more frames
        drop(self.stdin.take());

        match self.child.wait() {
            Ok(status) => logger::debug(&format!("Detector exited with {}", status)),
            Err(e) => {
                logger::error(&format!("Failed to wait for detector: {}", e));
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_args_append_fixed_config() {
        let detector = SubprocessDetector::new("holistic", vec!["--quiet".to_string()]);
        let args = detector.session_args(&SessionConfig::HOLISTIC);
        assert_eq!(
            args,
            vec![
                "--quiet",
                "--min-detection-confidence",
                "0.5",
                "--min-tracking-confidence",
                "0.5",
                "--model-complexity",
                "1",
            ]
        );
    }

    #[test]
    fn test_missing_program_fails_to_start() {
        let detector = SubprocessDetector::new("motion-extract-no-such-detector", Vec::new());
        assert!(detector.create_session(&SessionConfig::HOLISTIC).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_through_shell_helper() {
        // Swallows the header and 3 pixel bytes, then answers with a pose-only result
        let script = r#"read header; head -c 3 >/dev/null; echo '{"pose":[{"x":0.5,"y":0.25,"z":0.0}],"left_hand":null,"right_hand":null}'"#;
        let detector = SubprocessDetector::new("sh", vec!["-c".to_string(), script.to_string()]);
        let mut session = detector.create_session(&SessionConfig::HOLISTIC).unwrap();

        let frame = FrameData::new(vec![1, 2, 3], 1, 1, ChannelOrder::Rgb).unwrap();
        let result = session.process(&frame).unwrap();
        assert_eq!(result.pose.as_ref().map(Vec::len), Some(1));
        assert!(result.left_hand.is_none());
        assert!(result.right_hand.is_none());
    }
}
