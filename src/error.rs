use thiserror::Error;

/// Failures talking to an external service: the language model or the planner API.
/// The dialogue keeps its phase and payload when one of these surfaces.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but the body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("transcription came back empty")]
    EmptyTranscript,

    #[error("service not configured: {0}")]
    NotConfigured(&'static str),
}

impl TransportError {
    /// Malformed output is the model's fault, not the network's; it downgrades
    /// to an `Unknown` intent instead of a retry prompt.
    pub fn is_malformed(&self) -> bool {
        matches!(self, TransportError::Malformed(_))
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoInputDevice,

    #[error("input device error: {0}")]
    Device(String),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("wav encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("capture task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Anything that can stop a controller call outright.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
