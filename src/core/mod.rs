//! Core library components.
//!
//! Everything needed to address, store and fetch secrets, independent of
//! the command-line surface.

pub mod cache;
pub mod collate;
pub mod config;
pub mod constants;
pub mod domain;
pub mod envsec;
pub mod federation;
pub(crate) mod runtime;
pub mod store;
pub mod types;
pub mod validation;
