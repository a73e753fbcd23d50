//! Fetch, harden and collect Tiny Tapeout projects.
//!
//! - [`fetch`]: clone a project and rename it after its `info.yaml`
//! - [`pipeline`]: the full fetch → harden → submit → copy → record run
//! - [`copy`]: gather a hardened project's outputs into a projects tree
//! - [`manifest`]: the append-only CSV log of processed projects

pub mod command;
pub mod config;
pub mod copy;
pub mod fetch;
pub mod manifest;
pub mod metadata;
pub mod models;
pub mod pipeline;
pub mod sound;
