//! Shared core of the templating workspace.
//!
//! Everything in this crate is free of network and UI concerns so it can be
//! used both by the actix backend and by the Yew frontend compiled to wasm.

pub mod field_store;
pub mod generator;
pub mod highlight;
pub mod ids;
pub mod import;
pub mod jobs;
pub mod model;
pub mod overlap;
pub mod position_map;
pub mod preview;
pub mod requests;
pub mod selection;
pub mod text;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
