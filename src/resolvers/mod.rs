//! The three per-photo metadata resolvers.
//!
//! Each resolver is a stateless one-shot function: raw inputs in, one
//! metadata field out. Failures never escape as errors past the coordinator;
//! they become the field's "unresolved" state.

pub mod error;
pub mod location;
pub mod qr;
pub mod temperature;
