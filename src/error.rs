use thiserror::Error;

/// Errors raised on the control path. Nothing on the audio thread returns these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("maximum block size must be at least one sample")]
    InvalidBlockSize,

    #[error("a synth needs at least one voice")]
    NoVoices,

    #[error("waveform index {0} is out of range (expected 0..=3)")]
    InvalidWaveform(u8),

    #[error("note queue is full, event dropped")]
    QueueFull,

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to query output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
