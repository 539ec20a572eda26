pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod readiness;
pub mod region;
pub mod replay;
pub mod session;
pub mod surface;

pub use config::{load_settings, DotsConfig, EngineSettings, ImageInput, TagConfig};
pub use engine::{Engine, PointerEvent, TagEvent, TagEventKind};
pub use error::{TagError, TagResult};
pub use geometry::{PointerPoint, RegionGeometry};
pub use readiness::{FileImageLoader, ImageLoader, ImageRef};
pub use region::{Handle, HandleSet, Region, RegionId};
pub use surface::{HeadlessSurface, NodeId, SurfaceRenderer};
