//! Rendering seam between the interaction engine and the host surface.

mod headless;

use crate::geometry::ContainerBox;
use serde::{Deserialize, Serialize};

pub use headless::HeadlessSurface;

pub const CROPTAG_ERROR: &str = "crop-tag-error";
pub const CROPTAG_MASK: &str = "crop-tag-mask";
pub const CROPTAG_WRAP: &str = "crop-tag-wrap";
pub const CROPTAG_TAG: &str = "crop-tag-element";
pub const CROPTAG_DOT: &str = "crop-tag-dot";
pub const CROPTAG_EDGE: &str = "crop-tag-edge";

pub(crate) const WRAP_STYLE: &str = "position: relative; width: 100%; height: 100%;";
pub(crate) const MASK_STYLE: &str =
    "position: absolute; top: 0; left: 0; width: 100%; height: 100%; z-index: 1;";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// Load status of an image node as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStatus {
    pub src: String,
    pub complete: bool,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// Node construction and layout queries the engine needs from its host.
///
/// Implementations are driven from the host's event-loop thread only.
pub trait SurfaceRenderer {
    fn create_element(
        &mut self,
        tag: &str,
        attributes: &[(&str, &str)],
        inner_html: Option<&str>,
    ) -> NodeId;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId);
    fn remove_child(&mut self, parent: NodeId, child: NodeId);
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn contains(&self, node: NodeId) -> bool;
    fn tag_name(&self, node: NodeId) -> Option<String>;
    fn image_status(&self, node: NodeId) -> Option<ImageStatus>;
    fn bounding_box(&self, node: NodeId) -> ContainerBox;
    fn add_class(&mut self, node: NodeId, class: &str);
    fn remove_class(&mut self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn add_global_listener(&mut self, kind: PointerEventKind) -> ListenerId;
    fn remove_global_listener(&mut self, listener: ListenerId) -> bool;
}
