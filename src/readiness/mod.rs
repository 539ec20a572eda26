//! Image readiness gate: nothing becomes interactive until every managed
//! image has either loaded or failed.

mod loader;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, ConfigResult, ImageInput, TagConfig};
use crate::region::{Container, ContainerId};
use crate::surface::{
    NodeId, SurfaceRenderer, CROPTAG_ERROR, CROPTAG_MASK, CROPTAG_WRAP, MASK_STYLE, WRAP_STYLE,
};

pub use loader::{FileImageLoader, ImageLoader, LoadError, LoadResult};

pub type GateResult<T> = std::result::Result<T, GateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("image readiness stalled after {waited:?}; still pending: {pending:?}")]
    Stalled {
        waited: Duration,
        pending: Vec<String>,
    },
    #[error("image readiness already settled")]
    AlreadySettled,
    #[error("image readiness stalled earlier; the gate cannot be settled again")]
    Abandoned,
}

/// Settled snapshot of one managed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    #[serde(skip)]
    pub node: NodeId,
    pub source: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub has_error: bool,
}

impl ImageRef {
    fn loaded(node: NodeId, source: String, width: u32, height: u32) -> Self {
        Self {
            node,
            source,
            natural_width: width,
            natural_height: height,
            has_error: width == 0 || height == 0,
        }
    }

    fn failed(node: NodeId, source: String) -> Self {
        Self {
            node,
            source,
            natural_width: 0,
            natural_height: 0,
            has_error: true,
        }
    }
}

/// Images accepted for management, waiting to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessGate {
    images: Vec<NodeId>,
    timeout: Option<Duration>,
}

/// Result of a settled gate: one image snapshot and one container per input.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledImages {
    pub images: Vec<ImageRef>,
    pub containers: Vec<Container>,
}

impl ReadinessGate {
    /// Validates the configured image input. A URL input creates an `img`
    /// node under the configured target first.
    pub fn open<R: SurfaceRenderer + ?Sized>(
        renderer: &mut R,
        config: &TagConfig,
    ) -> ConfigResult<Self> {
        let images = collect_images(renderer, config)?;
        tracing::debug!(count = images.len(), "readiness gate opened");
        Ok(Self {
            images,
            timeout: config.load_timeout,
        })
    }

    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    /// Waits for every image to load or fail, then wraps and masks each one.
    ///
    /// Images already complete settle immediately; the rest are handed to
    /// `loader` on worker threads. Output order follows input order. With a
    /// timeout configured, images that never report make the gate fail with
    /// [`GateError::Stalled`].
    pub fn settle<R, L>(self, renderer: &mut R, loader: Arc<L>) -> GateResult<SettledImages>
    where
        R: SurfaceRenderer + ?Sized,
        L: ImageLoader + 'static,
    {
        let images = resolve_images(renderer, &self.images, loader, self.timeout)?;
        let mut containers = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            if image.has_error {
                tracing::warn!(source = %image.source, "image failed to load");
                renderer.add_class(image.node, CROPTAG_ERROR);
            }
            containers.push(wrap_and_mask(renderer, ContainerId(index), image.node));
        }
        tracing::info!(
            images = images.len(),
            errors = images.iter().filter(|image| image.has_error).count(),
            "image readiness settled"
        );
        Ok(SettledImages { images, containers })
    }
}

fn collect_images<R: SurfaceRenderer + ?Sized>(
    renderer: &mut R,
    config: &TagConfig,
) -> ConfigResult<Vec<NodeId>> {
    let is_image = |renderer: &R, node: NodeId| renderer.image_status(node).is_some();
    match &config.image {
        ImageInput::Element(node) if is_image(renderer, *node) => Ok(vec![*node]),
        ImageInput::Collection(nodes)
            if !nodes.is_empty() && nodes.iter().all(|node| is_image(renderer, *node)) =>
        {
            Ok(nodes.clone())
        }
        ImageInput::Url(url) if !url.trim().is_empty() => {
            let Some(target) = config.target.filter(|target| renderer.contains(*target)) else {
                return Err(ConfigError::TargetUnavailable { url: url.clone() });
            };
            let image = renderer.create_element(
                "img",
                &[("src", url.as_str()), ("alt", config.image_alt())],
                None,
            );
            renderer.append_child(target, image);
            Ok(vec![image])
        }
        other => {
            tracing::warn!(input = ?other, "rejecting image input");
            Err(ConfigError::InvalidImageInput)
        }
    }
}

fn resolve_images<R, L>(
    renderer: &R,
    nodes: &[NodeId],
    loader: Arc<L>,
    timeout: Option<Duration>,
) -> GateResult<Vec<ImageRef>>
where
    R: SurfaceRenderer + ?Sized,
    L: ImageLoader + 'static,
{
    let started = Instant::now();
    let (tx, rx) = mpsc::channel::<(usize, LoadResult<(u32, u32)>)>();
    let mut settled = Vec::with_capacity(nodes.len());
    let mut pending = Vec::new();

    for (index, node) in nodes.iter().copied().enumerate() {
        let Some(status) = renderer.image_status(node) else {
            settled.push(ImageRef::failed(node, String::new()));
            continue;
        };
        if status.complete {
            settled.push(ImageRef::loaded(
                node,
                status.src,
                status.natural_width,
                status.natural_height,
            ));
            continue;
        }

        settled.push(ImageRef::failed(node, status.src.clone()));
        pending.push(index);
        let tx = tx.clone();
        let loader = Arc::clone(&loader);
        std::thread::spawn(move || {
            let outcome = loader.load(&status.src);
            let _ = tx.send((index, outcome));
        });
    }
    drop(tx);

    let deadline = timeout.map(|timeout| started + timeout);
    while !pending.is_empty() {
        let received = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((index, outcome)) => {
                pending.retain(|candidate| *candidate != index);
                let slot = &mut settled[index];
                *slot = match outcome {
                    Ok((width, height)) => {
                        ImageRef::loaded(slot.node, std::mem::take(&mut slot.source), width, height)
                    }
                    Err(err) => {
                        tracing::warn!(%err, "image load reported an error");
                        ImageRef::failed(slot.node, std::mem::take(&mut slot.source))
                    }
                };
            }
            Err(RecvTimeoutError::Timeout) => {
                let pending = pending
                    .iter()
                    .map(|index| settled[*index].source.clone())
                    .collect::<Vec<_>>();
                tracing::warn!(?pending, "image readiness timed out");
                return Err(GateError::Stalled {
                    waited: started.elapsed(),
                    pending,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                for index in &pending {
                    let err = LoadError::WorkerLost {
                        url: settled[*index].source.clone(),
                    };
                    tracing::warn!(%err, "image load worker exited without a result");
                }
                break;
            }
        }
    }

    Ok(settled)
}

fn wrap_and_mask<R: SurfaceRenderer + ?Sized>(
    renderer: &mut R,
    id: ContainerId,
    image: NodeId,
) -> Container {
    let wrapper = renderer.create_element("div", &[("style", WRAP_STYLE), ("class", CROPTAG_WRAP)], None);
    if let Some(parent) = renderer.parent(image) {
        renderer.insert_before(parent, wrapper, image);
    }
    renderer.append_child(wrapper, image);
    let mask = renderer.create_element("div", &[("style", MASK_STYLE), ("class", CROPTAG_MASK)], None);
    renderer.append_child(wrapper, mask);
    Container::new(id, image, wrapper, mask)
}
