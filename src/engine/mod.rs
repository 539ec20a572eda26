//! Tag engine: wires the readiness gate, the drag controller and event
//! delivery around one host surface.

pub mod events;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TagConfig;
use crate::error::TagResult;
use crate::geometry::{PointerPoint, RegionGeometry};
use crate::readiness::{GateError, ImageLoader, ImageRef, ReadinessGate};
use crate::region::{Container, Region, RegionId, RegionOptions};
use crate::session::{DragController, SessionError, SessionResult, SessionState, SessionUpdate};
use crate::surface::{ListenerId, NodeId, PointerEventKind, SurfaceRenderer};

pub use events::{EventBus, HandlerId, TagEvent, TagEventKind, CROPTAG_READY};

pub const CROPTAG_FOCUS: &str = "crop-tag-element--focus";

/// Pointer input forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { target: NodeId, x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
}

#[derive(Debug)]
enum Readiness {
    Pending(ReadinessGate),
    Settled,
    Stalled,
}

#[derive(Debug)]
pub struct Engine<R: SurfaceRenderer> {
    config: TagConfig,
    renderer: R,
    readiness: Readiness,
    images: Vec<ImageRef>,
    containers: Vec<Container>,
    controller: DragController,
    events: EventBus,
    focused: Option<RegionId>,
    global_listeners: Vec<ListenerId>,
}

impl<R: SurfaceRenderer> Engine<R> {
    /// Validates the configuration against `renderer` and prepares the
    /// readiness gate. Pointer input is ignored until [`Engine::settle`].
    pub fn new(config: TagConfig, mut renderer: R) -> TagResult<Self> {
        let gate = ReadinessGate::open(&mut renderer, &config)?;
        let controller = DragController::new(RegionOptions::from_config(&config));
        Ok(Self {
            config,
            renderer,
            readiness: Readiness::Pending(gate),
            images: Vec::new(),
            containers: Vec::new(),
            controller,
            events: EventBus::new(),
            focused: None,
            global_listeners: Vec::new(),
        })
    }

    /// Waits for every image to settle, mounts one container per image,
    /// broadcasts the ready event once per image and starts accepting input.
    pub fn settle<L: ImageLoader + 'static>(&mut self, loader: Arc<L>) -> TagResult<&[ImageRef]> {
        let gate = match std::mem::replace(&mut self.readiness, Readiness::Stalled) {
            Readiness::Pending(gate) => gate,
            Readiness::Settled => {
                self.readiness = Readiness::Settled;
                return Err(GateError::AlreadySettled.into());
            }
            Readiness::Stalled => return Err(GateError::Abandoned.into()),
        };
        let settled = gate.settle(&mut self.renderer, loader)?;
        self.images = settled.images;
        self.containers = settled.containers;

        for image in &self.images {
            self.events.emit(&TagEvent::Ready {
                image: image.node,
                payload: &self.images,
                bubbles: true,
                cancelable: true,
            });
        }

        self.global_listeners = vec![
            self.renderer.add_global_listener(PointerEventKind::Down),
            self.renderer.add_global_listener(PointerEventKind::Up),
        ];
        self.readiness = Readiness::Settled;
        tracing::info!(containers = self.containers.len(), "tag engine is interactive");
        Ok(&self.images)
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.readiness, Readiness::Settled)
    }

    pub fn on(
        &mut self,
        kind: TagEventKind,
        handler: impl FnMut(&TagEvent<'_>) + 'static,
    ) -> HandlerId {
        self.events.on(kind, handler)
    }

    pub fn off(&mut self, id: HandlerId) -> bool {
        self.events.off(id)
    }

    pub fn dispatch(&mut self, event: PointerEvent) -> SessionResult<()> {
        match event {
            PointerEvent::Down { target, x, y } => {
                self.pointer_down(target, PointerPoint::new(x, y))?;
            }
            PointerEvent::Move { x, y } => {
                self.pointer_move(PointerPoint::new(x, y))?;
            }
            PointerEvent::Up => {
                self.pointer_up()?;
            }
        }
        Ok(())
    }

    pub fn pointer_down(&mut self, target: NodeId, point: PointerPoint) -> SessionResult<Option<RegionId>> {
        self.ensure_interactive()?;
        let Some(SessionUpdate::Started { region, .. }) = self.controller.pointer_down(
            &mut self.renderer,
            &mut self.containers,
            target,
            point,
        ) else {
            return Ok(None);
        };

        if self.config.focused_tags {
            self.focus(region);
        }
        if let Some(created) = find_region(&self.containers, region) {
            self.events.emit(&TagEvent::DragStart { region: created });
        }
        Ok(Some(region))
    }

    pub fn pointer_move(&mut self, point: PointerPoint) -> SessionResult<Option<RegionGeometry>> {
        self.ensure_interactive()?;
        let Some(SessionUpdate::Moved {
            region,
            geometry,
            resized,
            ..
        }) = self
            .controller
            .pointer_move(&mut self.renderer, &mut self.containers, point)
        else {
            return Ok(None);
        };

        if let Some(moved) = find_region(&self.containers, region) {
            self.events.emit(&TagEvent::Drag { region: moved });
            if resized {
                self.events.emit(&TagEvent::Resize { region: moved });
            }
        }
        Ok(Some(geometry))
    }

    pub fn pointer_up(&mut self) -> SessionResult<Option<RegionId>> {
        self.ensure_interactive()?;
        let Some(SessionUpdate::Finished { region, .. }) =
            self.controller.pointer_up(&mut self.renderer, &self.containers)
        else {
            return Ok(None);
        };

        if let Some(finished) = find_region(&self.containers, region) {
            self.events.emit(&TagEvent::DragStop { region: finished });
        }
        Ok(Some(region))
    }

    /// All regions across every container, in creation order.
    pub fn get_all(&self) -> Vec<&Region> {
        let mut regions = self
            .containers
            .iter()
            .flat_map(|container| container.regions())
            .collect::<Vec<_>>();
        regions.sort_by_key(|region| region.id);
        regions
    }

    /// Focused region in focus mode, otherwise the region at creation `index`.
    pub fn get(&self, index: usize) -> Option<&Region> {
        if self.config.focused_tags {
            return self.focused.and_then(|id| self.region(id));
        }
        self.get_all().into_iter().nth(index)
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        find_region(&self.containers, id)
    }

    pub fn focused(&self) -> Option<RegionId> {
        self.focused
    }

    /// Detaches a finished region from its container.
    pub fn remove(&mut self, id: RegionId) -> SessionResult<Region> {
        if self
            .controller
            .active_session()
            .is_some_and(|session| session.region == id)
        {
            return Err(SessionError::RegionBusy(id));
        }
        let region = self
            .containers
            .iter_mut()
            .find(|container| container.region(id).is_some())
            .and_then(|container| container.remove_region(&mut self.renderer, id))
            .ok_or(SessionError::UnknownRegion(id))?;
        if self.focused == Some(id) {
            self.focused = None;
        }
        tracing::debug!(region = id.0, "region removed");
        Ok(region)
    }

    pub fn session_state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    pub fn surface(&self) -> &R {
        &self.renderer
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Ends any active session, detaches the global listeners and hands the
    /// surface back to the host.
    pub fn into_surface(mut self) -> R {
        self.controller.pointer_up(&mut self.renderer, &self.containers);
        for listener in self.global_listeners.drain(..) {
            self.renderer.remove_global_listener(listener);
        }
        self.renderer
    }

    fn ensure_interactive(&self) -> SessionResult<()> {
        if self.is_interactive() {
            Ok(())
        } else {
            tracing::debug!("pointer input before readiness settled");
            Err(SessionError::NotInteractive)
        }
    }

    fn focus(&mut self, id: RegionId) {
        if let Some(previous) = self.focused.and_then(|previous| find_region(&self.containers, previous)) {
            self.renderer.remove_class(previous.node, CROPTAG_FOCUS);
        }
        if let Some(next) = find_region(&self.containers, id) {
            self.renderer.add_class(next.node, CROPTAG_FOCUS);
        }
        self.focused = Some(id);
    }
}

fn find_region(containers: &[Container], id: RegionId) -> Option<&Region> {
    containers.iter().find_map(|container| container.region(id))
}
