//! Gesture replay: drives an [`Engine`] over a [`HeadlessSurface`] from a
//! recorded script and reports the resulting regions.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ImageInput, TagConfig};
use crate::engine::Engine;
use crate::error::TagResult;
use crate::geometry::{ContainerBox, PointerPoint};
use crate::readiness::{FileImageLoader, ImageLoader, ImageRef};
use crate::region::Region;
use crate::surface::{HeadlessSurface, SurfaceRenderer};

/// Images are stacked vertically in script order, each starting at `x = 0`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GestureScript {
    pub images: Vec<ScriptImage>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptImage {
    pub src: String,
    /// Rendered size; defaults to the natural size once the image settles.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Pointer-down on the mask of the image at `image`.
    Down { image: usize, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub images: Vec<ImageRef>,
    pub regions: Vec<Region>,
    pub ignored_events: usize,
}

pub fn parse_script(contents: &str) -> serde_json::Result<GestureScript> {
    serde_json::from_str(contents)
}

/// Replays `script` with images resolved relative to `base_dir`.
pub fn replay(script: &GestureScript, config: TagConfig, base_dir: &Path) -> TagResult<ReplayReport> {
    replay_with(script, config, Arc::new(FileImageLoader::with_base_dir(base_dir)))
}

pub fn replay_with<L: ImageLoader + 'static>(
    script: &GestureScript,
    config: TagConfig,
    loader: Arc<L>,
) -> TagResult<ReplayReport> {
    let mut surface = HeadlessSurface::new();
    let root = surface.root();
    let mut figures = Vec::with_capacity(script.images.len());
    let mut nodes = Vec::with_capacity(script.images.len());
    for image in &script.images {
        let figure = surface.create_element("figure", &[], None);
        surface.append_child(root, figure);
        let node = surface.create_element("img", &[("src", image.src.as_str())], None);
        surface.append_child(figure, node);
        figures.push(figure);
        nodes.push(node);
    }

    let mut engine = Engine::new(config.with_image(ImageInput::Collection(nodes)), surface)?;
    let settled = engine.settle(loader)?.to_vec();

    let mut top = 0.0;
    for ((figure, image), settled) in figures.iter().zip(&script.images).zip(&settled) {
        let width = image.width.unwrap_or(f64::from(settled.natural_width));
        let height = image.height.unwrap_or(f64::from(settled.natural_height));
        engine
            .surface_mut()
            .set_layout(*figure, ContainerBox::new(0.0, top, width, height));
        top += height;
    }

    let mut ignored_events = 0;
    for event in &script.events {
        let applied = match *event {
            ScriptEvent::Down { image, x, y } => match engine.containers().get(image) {
                Some(container) => {
                    let mask = container.mask;
                    engine.pointer_down(mask, PointerPoint::new(x, y))?.is_some()
                }
                None => false,
            },
            ScriptEvent::Move { x, y } => engine.pointer_move(PointerPoint::new(x, y))?.is_some(),
            ScriptEvent::Up => engine.pointer_up()?.is_some(),
        };
        if !applied {
            tracing::debug!(?event, "script event had no effect");
            ignored_events += 1;
        }
    }
    if engine.pointer_up()?.is_some() {
        tracing::warn!("script ended during an active drag; session closed");
    }

    let regions = engine.get_all().into_iter().cloned().collect();
    Ok(ReplayReport {
        images: settled,
        regions,
        ignored_events,
    })
}
