//! Pixel-level building blocks of the sticker pipeline.
//!
//! Every operation here is a pure function of (buffer, parameters) -> buffer;
//! decoding, persistence and console output live in [`crate::processor`].

pub mod alpha;
pub mod background;
pub mod mask;
pub mod padding;
pub mod segment;
