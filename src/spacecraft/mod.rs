//! Spacecraft directory interface.
//!
//! The frame engine never knows which spacecraft exist or how their payload bits are
//! laid out. It asks a [`SpacecraftDirectory`] once per frame, right after the header
//! is frozen. An unconfigured id is a normal answer (`None`), and it marks the frame
//! corrupt instead of raising an error.
//!
//! [`SpacecraftRegistry`] is the YAML-backed directory shipped with the crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::BitArrayLayout;

pub mod registry;

pub use registry::SpacecraftRegistry;

/// Spacecraft families that change the frame variant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacecraftKind {
    /// Separate radiation experiment and WOD radiation segments
    #[default]
    Standard,
    /// Combined experiment carrying bus packets in place of the radiation segments
    UwExperiment,
}

/// Named layouts a spacecraft can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    #[serde(rename = "rttelemetry")]
    RealTime,
    #[serde(rename = "maxtelemetry")]
    MaxValues,
    #[serde(rename = "mintelemetry")]
    MinValues,
    #[serde(rename = "radtelemetry")]
    RadExp,
    #[serde(rename = "wodtelemetry")]
    Wod,
    #[serde(rename = "wodradtelemetry")]
    WodRad,
}

impl LayoutKind {
    pub const fn name(&self) -> &'static str {
        match self {
            LayoutKind::RealTime => "rttelemetry",
            LayoutKind::MaxValues => "maxtelemetry",
            LayoutKind::MinValues => "mintelemetry",
            LayoutKind::RadExp => "radtelemetry",
            LayoutKind::Wod => "wodtelemetry",
            LayoutKind::WodRad => "wodradtelemetry",
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured spacecraft.
#[derive(Debug, Clone)]
pub struct Spacecraft {
    /// Id as carried in frame headers
    pub id: u32,
    pub name: String,
    pub kind: SpacecraftKind,
    /// Bus packets from this spacecraft are forwarded to a local packet server
    pub send_to_local_server: bool,
    pub layouts: HashMap<LayoutKind, Arc<BitArrayLayout>>,
}

impl Spacecraft {
    pub fn new(id: u32, name: impl Into<String>, kind: SpacecraftKind) -> Self {
        Self { id, name: name.into(), kind, send_to_local_server: false, layouts: HashMap::new() }
    }

    pub fn with_local_server(mut self, enabled: bool) -> Self {
        self.send_to_local_server = enabled;
        self
    }

    pub fn with_layout(mut self, kind: LayoutKind, layout: BitArrayLayout) -> Self {
        self.layouts.insert(kind, Arc::new(layout));
        self
    }

    pub fn layout(&self, kind: LayoutKind) -> Option<Arc<BitArrayLayout>> {
        self.layouts.get(&kind).cloned()
    }
}

/// Lookup service mapping header ids to spacecraft and their layouts.
pub trait SpacecraftDirectory: Send + Sync + 'static {
    /// Returns the spacecraft for a header id, or None if it is not configured.
    fn spacecraft_by_header_id(&self, id: u32) -> Option<Arc<Spacecraft>>;

    /// Returns a named layout for a spacecraft.
    fn layout(&self, id: u32, kind: LayoutKind) -> Option<Arc<BitArrayLayout>> {
        self.spacecraft_by_header_id(id).and_then(|spacecraft| spacecraft.layout(kind))
    }
}
