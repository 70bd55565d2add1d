//! Graph manager running one full dashboard pass.

use crate::aggregator::sum_column;
use crate::dataset::Dataset;
use crate::prepare::prepare_chart;
use crate::renderer::ChartRenderer;
use crate::resolver::ResolvedColumns;
use crate::types::{ChartSpec, MetricSpec};
use crate::view::{question_heading, select_metrics, select_view};
use bikeshare_common::{format_thousands, BusinessQuestion, Result, TimeFrame};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A metric callout with its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    /// Label and source column
    #[serde(flatten)]
    pub spec: MetricSpec,
    /// Column sum truncated to an integer
    pub value: i64,
    /// Value with thousands separators
    pub display: String,
}

/// A chart together with its rendered document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    /// What was drawn
    #[serde(flatten)]
    pub spec: ChartSpec,
    /// Rendered document, written to its own file
    #[serde(skip)]
    pub document: String,
}

/// Everything produced by one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Selected business question
    pub question: BusinessQuestion,
    /// Selected time frame
    pub time_frame: TimeFrame,
    /// Question heading, if the question has one
    pub heading: Option<String>,
    /// Concrete columns behind the logical fields
    pub columns: ResolvedColumns,
    /// Metric callouts with numeric totals
    pub metrics: Vec<MetricValue>,
    /// Charts in page order
    pub charts: Vec<RenderedChart>,
    /// When the pass ran
    pub generated_at: DateTime<Utc>,
}

/// Runs resolve, select, aggregate and render for a selection.
pub struct GraphManager {
    renderer: Box<dyn ChartRenderer>,
}

impl GraphManager {
    /// Creates a manager drawing with `renderer`.
    pub fn new(renderer: impl ChartRenderer + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
        }
    }

    /// Builds the full view for one selection.
    ///
    /// The first chart that cannot be prepared or rendered aborts the pass.
    #[instrument(skip(self, dataset), fields(rows = dataset.row_count()))]
    pub fn build_view(
        &self,
        dataset: &Dataset,
        question: BusinessQuestion,
        time_frame: TimeFrame,
    ) -> Result<DashboardView> {
        let started = Instant::now();
        let columns = ResolvedColumns::resolve(dataset, time_frame);
        let specs = select_view(question, time_frame, &columns);

        let metrics = select_metrics(question, time_frame, &columns)
            .into_iter()
            .filter_map(|spec| metric_value(dataset, spec))
            .collect();

        let mut charts = Vec::with_capacity(specs.len());
        for spec in specs {
            let data = prepare_chart(dataset, &spec)?;
            let document = self.renderer.render(&spec, &data)?;
            charts.push(RenderedChart { spec, document });
        }

        info!(
            %question,
            %time_frame,
            charts = charts.len(),
            elapsed = ?started.elapsed(),
            "Built dashboard view"
        );

        Ok(DashboardView {
            question,
            time_frame,
            heading: question_heading(question).map(str::to_string),
            columns,
            metrics,
            charts,
            generated_at: Utc::now(),
        })
    }
}

/// Sums the metric column; `None` when it is missing or not numeric.
pub fn metric_value(dataset: &Dataset, spec: MetricSpec) -> Option<MetricValue> {
    let Some(total) = sum_column(dataset, &spec.column) else {
        debug!(column = %spec.column, "Skipping metric without a numeric column");
        return None;
    };
    #[allow(clippy::cast_possible_truncation)]
    let value = total.trunc() as i64;
    Some(MetricValue {
        display: format_thousands(value),
        value,
        spec,
    })
}
