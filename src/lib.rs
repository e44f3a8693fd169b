// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// Tests may unwrap
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Budgeted GPU shader backgrounds for web pages.
//!
//! Shadefall runs fullscreen fragment-shader effects behind page sections
//! while keeping two promises: the page never holds more GPU contexts than
//! its budget allows, and an effect that cannot keep up is replaced by
//! static CSS instead of dragging the page down.
//!
//! # Key entry points
//!
//! - [`registry::ResourceRegistry`] - priority-based admission and eviction
//!   under a hard instance cap
//! - [`monitor::PerformanceMonitor`] - sliding-window FPS check that
//!   triggers a one-shot downgrade
//! - [`surface::RenderSurface`] - the per-canvas lifecycle state machine
//!   (mount, draw, context loss and recovery, fallback, disposal)
//! - [`noise::generate`] - seeded fractal simplex-noise textures
//! - [`theme::ThemeConfig`] - theme documents and built-in presets
//! - [`effects`] - mesh gradient, noise grain, and glow orb
//!
//! # Architecture
//!
//! Everything is single-threaded and event-driven. A surface talks to the
//! platform only through [`surface::SurfaceHost`] and to the GPU only
//! through [`gpu::GraphicsContext`], so the whole lifecycle runs natively
//! against [`gpu::HeadlessContext`]. The `web` feature provides the
//! browser implementations of both traits.

pub mod effects;
pub mod error;
pub mod gpu;
pub mod monitor;
pub mod noise;
pub mod registry;
pub mod surface;
pub mod theme;
#[cfg(feature = "web")]
pub mod web;

pub use error::ShadefallError;
