#![forbid(unsafe_code)]
//! roadmap-core library.
//!
//! Business requests, features, epics, and stories form a strictly levelled
//! hierarchy ([`model`]). Flat snapshot exports are assembled into that
//! hierarchy by [`ingest`]; [`rollup`] derives completion bottom-up and the
//! [`tree`] and [`timeline`] modules project it for display.
//!
//! # Conventions
//!
//! - **Errors**: library entry points return `Result<_, RoadmapError>`;
//!   config loading uses `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Purity**: computations never mutate their input and always return
//!   fresh values.

pub mod breakdown;
pub mod check;
pub mod config;
pub mod error;
pub mod filter;
pub mod index;
pub mod ingest;
pub mod model;
pub mod rollup;
pub mod timeline;
pub mod tree;

pub use breakdown::{StatusBreakdown, compute_breakdown};
pub use error::{ErrorCode, RoadmapError};
pub use rollup::compute_completion;
pub use timeline::{Interval, flatten_to_intervals};
pub use tree::{TreeNode, build_tree};
