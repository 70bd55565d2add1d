//! # Bike Sharing Dashboard
//!
//! Presentation shell over [`bikeshare_graphs`]: owns the dashboard
//! selections, runs a pass over the loaded dataset and writes a
//! self-contained HTML page plus one SVG per chart. Watch mode re-runs the
//! pass whenever the configuration file changes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod error;
pub mod page;
pub mod watch;

pub use app::*;
pub use error::*;
pub use page::*;
pub use watch::*;
