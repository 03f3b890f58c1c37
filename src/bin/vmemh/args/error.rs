use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Image(#[from] vmemh::Error),
    #[error(transparent)]
    Format(#[from] vmemh::FormatError),
    #[error(transparent)]
    Backdoor(#[from] vmemh::BackdoorError),
    #[error(transparent)]
    Endpoint(#[from] vmemh::EndpointError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{path}:{line}: {message}")]
    Config {
        path: String,
        line: usize,
        message: String,
    },
    #[error("{0}")]
    Other(String),
}
