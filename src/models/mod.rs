//! Domain models for tt-project.
//!
//! # Core Concepts
//!
//! - [`ProjectInfo`]: The `project` section of a Tiny Tapeout `info.yaml`.
//! - [`ProjectKind`]: A validated Wokwi or Verilog identity. Its
//!   [`directory_name`](ProjectKind::directory_name) is the canonical local
//!   name of the project.
//! - [`ManifestEntry`]: One row of the append-only processed-projects log.
//! - [`CopyReport`]: Per-item results of copying a hardened project, with the
//!   aggregate counts that decide the copier's exit status.

mod entry;
mod project;
mod report;

pub use entry::*;
pub use project::*;
pub use report::*;
