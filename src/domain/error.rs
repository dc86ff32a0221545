use thiserror::Error;

/// SerProbe unified error type
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open serial port {path}: {source}")]
    PortOpen {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid data format: {0}")]
    InvalidData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

impl ProbeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
