//! # Bikeshare Graphs
//!
//! Data processing and chart rendering for the bike sharing dashboard.
//!
//! The pipeline for one pass is:
//!
//! 1. [`Dataset`] holds the cleaned CSV in memory.
//! 2. [`ResolvedColumns`] maps logical fields onto the hourly or daily columns.
//! 3. [`select_view`] and [`select_metrics`] describe what to show.
//! 4. [`prepare_chart`] aggregates the rows behind each chart.
//! 5. A [`ChartRenderer`] (by default [`SvgRenderer`], using plotters) draws it.
//!
//! [`GraphManager`] runs the whole sequence.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod dataset;
pub mod manager;
pub mod palette;
pub mod prepare;
pub mod renderer;
pub mod resolver;
pub mod types;
pub mod view;

pub use aggregator::*;
pub use dataset::*;
pub use manager::*;
pub use palette::*;
pub use prepare::*;
pub use renderer::*;
pub use resolver::*;
pub use types::*;
pub use view::*;
