//! # Photoedit
//!
//! Local photo editing for a chat bot: resize, crop, background removal and
//! generation, enhancement, and format conversion. Every operation reads one
//! source image and writes one new, uniquely named file into an output
//! directory; nothing is edited in place.
//!
//! ```text
//! photo.jpg ──► operation ──► processed/{prefix}_{YYYYmmdd_HHMMSS}_{8 hex}.{ext}
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The operations, their geometry, pixel effects, and the `image`-backed backend |
//! | [`naming`] | Unique output filename generator |
//! | [`cleanup`] | Age-based sweep of old outputs |
//! | [`dispatch`] | Menu tree and callback strings mapped to operations |
//! | [`config`] | `config.toml` loading, validation, and stock defaults |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Output Settings
//!
//! Operations never read the output directory or encoder qualities from
//! global state. Callers pass an [`imaging::OutputSettings`], usually built
//! with [`config::Config::output_settings`]. Tests point each run at its own
//! temporary directory.
//!
//! ## Names Instead of Locks
//!
//! Concurrent operations share one output directory without coordination.
//! Each name combines the wall-clock second with 32 random bits, so two
//! writers never pick the same path. The cleanup sweep may run alongside
//! writers; the worst case is a fresh file surviving one more sweep.
//!
//! ## Local Heuristics
//!
//! Background removal and generation are deliberately simple: a corner-color
//! threshold and a fixed diagonal gradient. They are the offline fallback
//! for a bot that would otherwise call a segmentation service, and their
//! exact output is pinned by tests.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling, and encoding use the `image` crate only; per-pixel
//! passes run over raw sample slices with `rayon`. No system libraries.

pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
