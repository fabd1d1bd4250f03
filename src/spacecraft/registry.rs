//! YAML-configured spacecraft directory
//!
//! ```yaml
//! spacecraft:
//!   - id: 1
//!     name: AO-85
//!     kind: standard
//!     layouts:
//!       rttelemetry:
//!         - { name: BATT_A_V, bits: 12, units: V, conversion: { type: linear, scale: 0.01, offset: 0.0 } }
//!         - { name: PANEL_TEMP, bits: 8, conversion: { type: signed } }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{LayoutKind, Spacecraft, SpacecraftDirectory, SpacecraftKind};
use crate::types::{BitArrayLayout, LayoutField};
use crate::{Result, TelemetryError};

#[derive(Debug, Deserialize)]
struct RegistryFile {
    spacecraft: Vec<SpacecraftEntry>,
}

#[derive(Debug, Deserialize)]
struct SpacecraftEntry {
    id: u32,
    name: String,
    #[serde(default)]
    kind: SpacecraftKind,
    #[serde(default)]
    send_to_local_server: bool,
    #[serde(default)]
    layouts: HashMap<LayoutKind, Vec<LayoutField>>,
}

/// In-memory directory of spacecraft, usually loaded from YAML.
#[derive(Debug, Clone, Default)]
pub struct SpacecraftRegistry {
    spacecraft: HashMap<u32, Arc<Spacecraft>>,
}

impl SpacecraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml_ng::from_str(yaml)?;
        let mut registry = Self::new();

        for entry in file.spacecraft {
            let mut spacecraft = Spacecraft::new(entry.id, entry.name, entry.kind)
                .with_local_server(entry.send_to_local_server);
            for (kind, fields) in entry.layouts {
                let layout = BitArrayLayout::new(kind.name(), fields)?;
                debug!(
                    spacecraft = entry.id,
                    layout = %kind,
                    bits = layout.bit_len(),
                    "Loaded layout"
                );
                spacecraft = spacecraft.with_layout(kind, layout);
            }
            registry.insert(spacecraft)?;
        }

        info!("Loaded {} spacecraft", registry.len());
        Ok(registry)
    }

    /// Load a registry from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml(&yaml)
    }

    /// Add a spacecraft. Ids must be unique.
    pub fn insert(&mut self, spacecraft: Spacecraft) -> Result<()> {
        if self.spacecraft.contains_key(&spacecraft.id) {
            return Err(TelemetryError::config(
                "spacecraft directory",
                format!("duplicate spacecraft id {}", spacecraft.id),
            ));
        }
        self.spacecraft.insert(spacecraft.id, Arc::new(spacecraft));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.spacecraft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spacecraft.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.spacecraft.keys().copied()
    }
}

impl SpacecraftDirectory for SpacecraftRegistry {
    fn spacecraft_by_header_id(&self, id: u32) -> Option<Arc<Spacecraft>> {
        self.spacecraft.get(&id).cloned()
    }
}
