use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabsmokeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Docker error: {0}")]
    Docker(String),

    #[error("containers not found: {0} — create the lab containers before running smoke tests")]
    MissingContainers(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Cron error: {0}")]
    Cron(String),

    #[error("System error: {0}")]
    System(String),
}

pub type Result<T> = std::result::Result<T, LabsmokeError>;
