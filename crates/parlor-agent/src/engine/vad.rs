use super::VoiceActivityDetector;
use crate::config::VadConfig;
use crate::error::AgentError;
use std::sync::Mutex;
use tracing::info;
use voice_activity_detector::VoiceActivityDetector as SileroModel;

/// Silero VAD over fixed-size chunks.
pub struct SileroVad {
    model: Mutex<SileroModel>,
    chunk_size: usize,
    threshold: f32,
    sample_rate: u32,
}

impl SileroVad {
    pub fn new(config: &VadConfig) -> Result<Self, AgentError> {
        // Silero's window is 32 ms.
        let chunk_size: usize = match config.sample_rate {
            8000 => 256,
            16000 => 512,
            other => {
                return Err(AgentError::Config(format!(
                    "invalid VAD sample rate: {other}. Must be 8000 or 16000"
                )))
            }
        };

        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(AgentError::Config(format!(
                "VAD threshold must be between 0.0 and 1.0, got {}",
                config.threshold
            )));
        }

        let model = SileroModel::builder()
            .sample_rate(config.sample_rate as i32)
            .chunk_size(chunk_size)
            .build()
            .map_err(|e| AgentError::engine("vad", format!("failed to load Silero VAD: {e:?}")))?;

        info!(
            sample_rate = config.sample_rate,
            threshold = config.threshold,
            "loaded Silero VAD"
        );

        Ok(Self {
            model: Mutex::new(model),
            chunk_size,
            threshold: config.threshold,
            sample_rate: config.sample_rate,
        })
    }
}

impl VoiceActivityDetector for SileroVad {
    /// Highest per-chunk probability across the frame.
    fn speech_probability(&self, frame: &[i16]) -> f32 {
        let mut model = match self.model.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        frame
            .chunks(self.chunk_size)
            .map(|chunk| model.predict(chunk.iter().copied()))
            .fold(0.0_f32, f32::max)
    }

    fn threshold(&self) -> f32 {
        self.threshold
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_sample_rate() {
        let config = VadConfig {
            sample_rate: 44_100,
            threshold: 0.5,
        };
        let err = SileroVad::new(&config).err().expect("should reject");
        assert!(matches!(err, AgentError::Config(msg) if msg.contains("44100")));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let config = VadConfig {
            sample_rate: 16_000,
            threshold: 1.5,
        };
        assert!(matches!(
            SileroVad::new(&config),
            Err(AgentError::Config(_))
        ));
    }
}
