//! Vellum Core
//!
//! This crate contains the building blocks shared by the Vellum asset pipeline:
//! hashed collections, interned resource paths, stable content hashing, the job
//! facility used for asynchronous asset initialization, and logging/profiling setup.

pub mod alloc;
pub mod hash;
pub mod jobs;
pub mod logging;
pub mod path;
pub mod profiling;

pub use path::{PathId, ResourcePath};
