pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid arguments: {0}")]
    Arguments(#[from] clap::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Data access error: {0}")]
    Dal(#[from] vastrayl_dal::Error),

    #[error("Token error: {0}")]
    Token(#[from] vastrayl_auth::error::Error),
}
