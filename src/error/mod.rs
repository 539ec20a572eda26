use crate::config::ConfigError;
use crate::readiness::GateError;
use crate::session::SessionError;
use thiserror::Error;

pub type TagResult<T> = std::result::Result<T, TagError>;

#[derive(Debug, Error)]
pub enum TagError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
