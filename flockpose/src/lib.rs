//! Scene-graph transform resolution and skeleton flattening for instanced, skinned models.
//!
//! The crate turns a materialized node tree into world transforms, and the skin's joints into
//! flat, layer-ordered buffers that a non-recursive parallel pose kernel can walk. Asset decoding
//! and GPU plumbing live outside of it.

#![forbid(unsafe_code)]

mod error;
mod model;
mod rotation;
mod runtime;

pub use error::*;
pub use model::*;
pub use rotation::*;
pub use runtime::*;

#[cfg(test)]
mod rotation_tests;

#[cfg(test)]
mod model_tests;

#[cfg(all(test, feature = "serde"))]
mod serde_tests;
