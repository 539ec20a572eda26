use serde::ser::{Serialize, Serializer};

use crate::config::{ConfigError, ConfigResult};

/// Compass position of a resize dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::TopLeft => "TL",
            Self::Top => "T",
            Self::TopRight => "TR",
            Self::Right => "R",
            Self::BottomRight => "BR",
            Self::Bottom => "B",
            Self::BottomLeft => "BL",
            Self::Left => "L",
        }
    }

    pub const fn position(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::Top => "top",
            Self::TopRight => "top-right",
            Self::Right => "right",
            Self::BottomRight => "bottom-right",
            Self::Bottom => "bottom",
            Self::BottomLeft => "bottom-left",
            Self::Left => "left",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|handle| handle.key() == key)
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of resize dots, always iterated in canonical compass order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleSet {
    bits: u8,
}

impl Default for HandleSet {
    fn default() -> Self {
        Self::canonical()
    }
}

impl HandleSet {
    pub const fn canonical() -> Self {
        Self { bits: u8::MAX }
    }

    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn from_handles(handles: impl IntoIterator<Item = Handle>) -> Self {
        let bits = handles
            .into_iter()
            .fold(0u8, |bits, handle| bits | handle.bit());
        Self { bits }
    }

    /// Builds a subset from user-supplied identifiers such as `"TL"`.
    ///
    /// Every key must name a canonical handle; the error lists the accepted
    /// identifiers.
    pub fn from_keys<I, S>(keys: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        let mut rejected = Vec::new();
        for key in keys {
            let key = key.as_ref();
            match Handle::from_key(key) {
                Some(handle) => set.insert(handle),
                None => rejected.push(key.to_string()),
            }
        }
        if !rejected.is_empty() {
            tracing::warn!(?rejected, "dots configuration contains unknown handles");
            return Err(ConfigError::InvalidHandleSet {
                rejected,
                accepted: accepted_handle_keys(),
            });
        }
        Ok(set)
    }

    pub fn insert(&mut self, handle: Handle) {
        self.bits |= handle.bit();
    }

    pub const fn contains(&self, handle: Handle) -> bool {
        self.bits & handle.bit() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub const fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Handle> + '_ {
        Handle::ALL
            .into_iter()
            .filter(move |handle| self.contains(*handle))
    }
}

impl Serialize for HandleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(Handle::position))
    }
}

pub fn accepted_handle_keys() -> String {
    Handle::ALL
        .iter()
        .map(|handle| handle.key())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Side of a region that carries a drag edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Left,
    Bottom,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Self::Top, Self::Left, Self::Bottom, Self::Right];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Left => "left",
            Self::Bottom => "bottom",
            Self::Right => "right",
        }
    }
}
