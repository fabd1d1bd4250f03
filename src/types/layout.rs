//! Bit-array layouts describing how segment bytes map to named fields

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::bits::{BitReader, BitWriter, sign_extend};
use super::fields::{FieldSet, FieldValue};
use crate::{Result, TelemetryError};

/// Conversion applied to a raw field value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Conversion {
    /// `value = raw * scale + offset`
    Linear { scale: f64, offset: f64 },
    /// Raw bits are a two's complement integer of the field width.
    Signed,
}

impl Conversion {
    fn apply(&self, raw: u32, width: u32) -> f64 {
        match self {
            Conversion::Linear { scale, offset } => raw as f64 * scale + offset,
            Conversion::Signed => sign_extend(raw, width) as f64,
        }
    }
}

/// One field of a layout, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutField {
    /// Field name as used by downstream consumers
    pub name: String,
    /// Width on the wire, 1 to 32 bits
    pub bits: u32,
    /// Units of the converted value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion: Option<Conversion>,
}

impl LayoutField {
    pub fn new(name: impl Into<String>, bits: u32) -> Self {
        Self { name: name.into(), bits, units: None, conversion: None }
    }

    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

/// Ordered list of fields packed MSB-first from bit 0 of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct BitArrayLayout {
    name: String,
    fields: Vec<LayoutField>,
    bit_len: usize,
}

impl BitArrayLayout {
    /// Create a layout with validation.
    pub fn new(name: impl Into<String>, fields: Vec<LayoutField>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashMap::new();

        for (index, field) in fields.iter().enumerate() {
            if field.bits == 0 || field.bits > 32 {
                return Err(TelemetryError::config(
                    format!("layout '{}'", name),
                    format!("field '{}' has width {} (must be 1..=32)", field.name, field.bits),
                ));
            }
            if seen.insert(field.name.as_str(), index).is_some() {
                return Err(TelemetryError::config(
                    format!("layout '{}'", name),
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }

        let bit_len = fields.iter().map(|f| f.bits as usize).sum();
        Ok(Self { name, fields, bit_len })
    }

    /// A layout with no fields, for segments whose bytes are interpreted elsewhere.
    pub fn empty(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new(), bit_len: 0 }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    /// Total width of all fields in bits.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Total width rounded up to whole bytes.
    pub fn byte_len(&self) -> usize {
        self.bit_len.div_ceil(8)
    }

    /// Decode named values from raw segment bytes.
    ///
    /// Fails if the layout is wider than the data supplied.
    pub fn decode(&self, data: &[u8]) -> Result<FieldSet> {
        if self.bit_len > data.len() * 8 {
            return Err(TelemetryError::segment_decode(
                self.name.clone(),
                format!("layout needs {} bits but segment holds {}", self.bit_len, data.len() * 8),
            ));
        }

        let mut reader = BitReader::new(data);
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw = reader.read(field.bits).ok_or_else(|| {
                TelemetryError::segment_decode(
                    self.name.clone(),
                    format!("field '{}' runs past bit {}", field.name, reader.position()),
                )
            })?;
            let value = match &field.conversion {
                Some(conversion) => conversion.apply(raw, field.bits),
                None => raw as f64,
            };
            values.push(FieldValue { name: field.name.clone(), raw, value, units: field.units.clone() });
        }

        Ok(FieldSet::new(values))
    }

    /// Encode raw field values in layout order. Missing trailing values are zero.
    pub fn encode(&self, raw_values: &[u32]) -> Result<Vec<u8>> {
        if raw_values.len() > self.fields.len() {
            return Err(TelemetryError::segment_decode(
                self.name.clone(),
                format!("{} values supplied for {} fields", raw_values.len(), self.fields.len()),
            ));
        }

        let mut writer = BitWriter::new();
        for (index, field) in self.fields.iter().enumerate() {
            writer.write(raw_values.get(index).copied().unwrap_or(0), field.bits);
        }
        Ok(writer.into_bytes())
    }
}
