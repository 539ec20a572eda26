use crate::region::RegionId;
use thiserror::Error;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("pointer input is ignored until image readiness settles")]
    NotInteractive,
    #[error("unknown region {0:?}")]
    UnknownRegion(RegionId),
    #[error("region {0:?} is still being shaped by the active drag session")]
    RegionBusy(RegionId),
}
