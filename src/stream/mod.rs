//! Splitting unframed byte streams into frames

mod deframer;

pub use deframer::Deframer;
