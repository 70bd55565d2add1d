//! Declarative chart and metric descriptions produced by the view selector.

use serde::Serialize;

/// Mark drawn by a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    /// One bar per category
    Bar,
    /// Series stacked within each category bar
    StackedBar,
    /// Layers stacked around a centered baseline
    Stream,
    /// Weighted histogram with a density overlay
    Histogram,
    /// One line per series
    Line,
}

/// How the rows behind a chart are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aggregation {
    /// Mean per x value
    Mean,
    /// Sum per x value (and color group)
    Sum,
    /// Histogram of x weighted by the first series
    WeightedHistogram {
        /// Number of equal-width bins
        bins: usize,
    },
}

/// Palette slot used to color a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    /// One palette color per category or layer
    Categorical,
    /// The first palette color
    Primary,
    /// Casual side of the comparison pair
    CompareFirst,
    /// Registered side of the comparison pair
    CompareSecond,
}

/// Where a chart sits on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// Slot `index` of a row of `of` equal columns
    Column {
        /// Zero-based slot
        index: usize,
        /// Columns in the row
        of: usize,
    },
    /// Centered in the middle of a three-column row
    Centered,
    /// One tab of a tab group
    Tab {
        /// Tab caption
        label: String,
    },
}

impl Placement {
    /// Charts with the same section and layout kind share a page block.
    pub const fn layout_kind(&self) -> &'static str {
        match self {
            Self::Column { .. } => "columns",
            Self::Centered => "centered",
            Self::Tab { .. } => "tabs",
        }
    }
}

/// A column and its axis title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoding {
    /// Source column
    pub column: String,
    /// Axis title
    pub title: String,
}

/// A plotted value column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    /// Source column
    pub column: String,
    /// Legend and tooltip label
    pub label: String,
    /// Palette slot
    pub color: ColorRole,
}

/// Keep only rows whose `column` displays as `equals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFilter {
    /// Filtered column
    pub column: String,
    /// Required cell value
    pub equals: String,
}

/// Description of one chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    /// File-safe identifier, unique within a view
    pub id: String,
    /// Section title of the page block, if the block has one
    pub section: Option<String>,
    /// Heading shown above the chart
    pub heading: String,
    /// Caption drawn inside the chart
    pub caption: Option<String>,
    /// Page slot
    pub placement: Placement,
    /// Mark type
    pub mark: Mark,
    /// Horizontal encoding
    pub x: Encoding,
    /// Vertical series
    pub y: Vec<Series>,
    /// Vertical axis title
    pub y_title: String,
    /// Column splitting a stream into layers
    pub color_by: Option<String>,
    /// Legend title when a legend is drawn
    pub legend_title: Option<String>,
    /// Row filter applied before aggregation
    pub filter: Option<RowFilter>,
    /// Row reduction
    pub aggregation: Aggregation,
    /// Whether the chart spans a full row
    pub wide: bool,
}

impl ChartSpec {
    /// Every dataset column the chart reads.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = vec![self.x.column.as_str()];
        columns.extend(self.y.iter().map(|s| s.column.as_str()));
        columns.extend(self.color_by.as_deref());
        columns.extend(self.filter.as_ref().map(|f| f.column.as_str()));
        columns
    }
}

/// An "All-Time Statistics" callout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSpec {
    /// Callout label
    pub label: String,
    /// Summed column
    pub column: String,
}
