//! Errors surfaced by the command line tool.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid hex dump: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("no serial port given; pass --port or set `port` in the config file")]
    NoPort,

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("command was not queued")]
    CommandRejected,
}

pub type Result<T> = std::result::Result<T, RunnerError>;
