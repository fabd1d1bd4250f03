//! Core types shared by headers, payload segments and the store.
//!
//! - [`BitReader`] / [`BitWriter`] implement the MSB-first bit packing used on the wire
//! - [`BitArrayLayout`] maps a segment's bits to named fields with optional conversions
//! - [`FieldSet`] holds decoded values with O(1) lookup by name
//! - [`SpacecraftStamp`] is the (spacecraft id, resets, uptime) identity of a record
//!
//! ## Usage Example
//!
//! ```rust
//! use foxtlm::types::{BitArrayLayout, Conversion, LayoutField};
//!
//! let layout = BitArrayLayout::new(
//!     "rttelemetry",
//!     vec![
//!         LayoutField::new("BATT_A_V", 12).with_conversion(Conversion::Linear { scale: 0.01, offset: 0.0 }),
//!         LayoutField::new("RESETS_SINCE_DEPLOY", 4),
//!     ],
//! )
//! .unwrap();
//!
//! let bytes = layout.encode(&[412, 3]).unwrap();
//! let fields = layout.decode(&bytes).unwrap();
//! assert_eq!(fields.raw("RESETS_SINCE_DEPLOY"), Some(3));
//! assert!((fields.value("BATT_A_V").unwrap() - 4.12).abs() < 1e-9);
//! ```

mod bits;
mod fields;
mod layout;
mod stamp;

pub use bits::{BitReader, BitWriter, sign_extend};
pub use fields::{FieldSet, FieldValue};
pub use layout::{BitArrayLayout, Conversion, LayoutField};
pub use stamp::SpacecraftStamp;
