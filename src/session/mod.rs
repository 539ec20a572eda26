pub mod error;
pub mod machine;

pub use error::{SessionError, SessionResult};
pub use machine::{DragController, DragSession, SessionId, SessionState, SessionUpdate};
