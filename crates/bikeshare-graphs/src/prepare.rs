//! Turns a [`ChartSpec`] plus the dataset into plot-ready values.

use crate::aggregator::{
    distinct_values, filter_eq, group_mean, group_sum, weighted_density, weighted_histogram,
    Histogram,
};
use crate::dataset::Dataset;
use crate::types::{Aggregation, ChartSpec, ColorRole, Mark};
use bikeshare_common::{DashboardError, Result};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, instrument};

/// Points evaluated along the density overlay.
pub const DENSITY_POINTS: usize = 200;

/// Values of one series over the chart's categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    /// Legend label
    pub label: String,
    /// Palette slot
    pub color: ColorRole,
    /// One value per category, nulls as zero
    pub values: Vec<f64>,
}

/// One layer of a stream chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamLayer {
    /// Color group value
    pub label: String,
    /// One value per x position, zero where the group has no rows
    pub values: Vec<f64>,
}

/// One line of a line chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineData {
    /// Legend label
    pub label: String,
    /// Palette slot
    pub color: ColorRole,
    /// Points sorted by x
    pub points: Vec<(f64, f64)>,
}

/// Plot-ready data for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    /// Categorical bars, stacked when `stacked` is set
    Bars {
        /// Category labels in group order
        categories: Vec<String>,
        /// One entry per y series
        series: Vec<BarSeries>,
        /// Whether series stack on top of each other
        stacked: bool,
    },
    /// Layers over a shared numeric x axis
    Stream {
        /// Sorted distinct x positions
        xs: Vec<f64>,
        /// Layers in first-occurrence order of the color column
        layers: Vec<StreamLayer>,
    },
    /// Weighted histogram with its density curve
    Histogram {
        /// Bin edges and weights
        histogram: Histogram,
        /// Density overlay in histogram units
        density: Vec<(f64, f64)>,
    },
    /// Lines over a numeric x axis
    Lines {
        /// One entry per y series
        series: Vec<LineData>,
    },
}

impl ChartData {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bars { categories, .. } => categories.is_empty(),
            Self::Stream { xs, .. } => xs.is_empty(),
            Self::Histogram { histogram, .. } => histogram.total_weight() <= 0.0,
            Self::Lines { series } => series.iter().all(|s| s.points.is_empty()),
        }
    }
}

/// Aggregates the rows behind `spec`.
///
/// Every column the chart reads must exist; a missing one fails with
/// [`DashboardError::MissingColumn`].
#[instrument(skip(dataset, spec), fields(chart = %spec.id))]
pub fn prepare_chart(dataset: &Dataset, spec: &ChartSpec) -> Result<ChartData> {
    for column in spec.columns() {
        dataset.column(column)?;
    }

    let table: Cow<'_, Dataset> = match &spec.filter {
        Some(filter) => Cow::Owned(filter_eq(dataset, &filter.column, &filter.equals)?),
        None => Cow::Borrowed(dataset),
    };
    let values: Vec<&str> = spec.y.iter().map(|s| s.column.as_str()).collect();

    let data = match spec.mark {
        Mark::Bar | Mark::StackedBar => {
            let grouped = reduce(&table, &[spec.x.column.as_str()], &values, spec.aggregation)?;
            bars(&grouped, spec, spec.mark == Mark::StackedBar)?
        }
        Mark::Stream => stream(&table, spec)?,
        Mark::Histogram => {
            let Aggregation::WeightedHistogram { bins } = spec.aggregation else {
                return Err(DashboardError::graph(format!(
                    "histogram '{}' needs a weighted histogram aggregation",
                    spec.id
                )));
            };
            let weights = first_series(spec)?;
            let histogram = weighted_histogram(&table, &spec.x.column, weights, bins)?;
            let density =
                weighted_density(&table, &spec.x.column, weights, &histogram, DENSITY_POINTS)?;
            ChartData::Histogram { histogram, density }
        }
        Mark::Line => {
            let grouped = reduce(&table, &[spec.x.column.as_str()], &values, spec.aggregation)?;
            lines(&grouped, spec)?
        }
    };

    debug!(rows = table.row_count(), "Prepared chart data");
    Ok(data)
}

fn first_series(spec: &ChartSpec) -> Result<&str> {
    spec.y
        .first()
        .map(|s| s.column.as_str())
        .ok_or_else(|| DashboardError::graph(format!("chart '{}' has no series", spec.id)))
}

fn reduce(
    table: &Dataset,
    keys: &[&str],
    values: &[&str],
    aggregation: Aggregation,
) -> Result<Dataset> {
    match aggregation {
        Aggregation::Mean => group_mean(table, keys, values),
        Aggregation::Sum => group_sum(table, keys, values),
        Aggregation::WeightedHistogram { .. } => Err(DashboardError::graph(
            "weighted histogram aggregation only applies to histograms",
        )),
    }
}

fn bars(grouped: &Dataset, spec: &ChartSpec, stacked: bool) -> Result<ChartData> {
    let categories = grouped.column(&spec.x.column)?.data().labels();
    let series = spec
        .y
        .iter()
        .map(|s| {
            Ok(BarSeries {
                label: s.label.clone(),
                color: s.color,
                values: grouped
                    .numeric_column(&s.column)?
                    .iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ChartData::Bars {
        categories,
        series,
        stacked,
    })
}

fn stream(table: &Dataset, spec: &ChartSpec) -> Result<ChartData> {
    let color_by = spec.color_by.as_deref().ok_or_else(|| {
        DashboardError::graph(format!("stream '{}' needs a color column", spec.id))
    })?;
    let value = first_series(spec)?;
    let grouped = group_sum(table, &[spec.x.column.as_str(), color_by], &[value])?;

    let x_cells = grouped.numeric_column(&spec.x.column)?;
    let groups = grouped.column(color_by)?.data().labels();
    let sums = grouped.numeric_column(value)?;

    let mut xs: Vec<f64> = x_cells.iter().flatten().copied().collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    let labels: Vec<String> = distinct_values(&grouped, color_by)?
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut layers: Vec<StreamLayer> = labels
        .into_iter()
        .map(|label| StreamLayer {
            label,
            values: vec![0.0; xs.len()],
        })
        .collect();

    for ((x, group), sum) in x_cells.iter().zip(&groups).zip(sums) {
        let (Some(x), Some(sum)) = (x, sum) else {
            continue;
        };
        let Ok(position) = xs.binary_search_by(|probe| probe.total_cmp(x)) else {
            continue;
        };
        if let Some(layer) = layers.iter_mut().find(|l| &l.label == group) {
            layer.values[position] += sum;
        }
    }

    Ok(ChartData::Stream { xs, layers })
}

fn lines(grouped: &Dataset, spec: &ChartSpec) -> Result<ChartData> {
    let xs = grouped.numeric_column(&spec.x.column)?;
    let series = spec
        .y
        .iter()
        .map(|s| {
            let ys = grouped.numeric_column(&s.column)?;
            let mut points: Vec<(f64, f64)> = xs
                .iter()
                .zip(ys)
                .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            Ok(LineData {
                label: s.label.clone(),
                color: s.color,
                points,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ChartData::Lines { series })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Encoding, Placement, RowFilter, Series};

    fn spec(mark: Mark, x: &str, y: &[&str], aggregation: Aggregation) -> ChartSpec {
        ChartSpec {
            id: "test".to_string(),
            section: None,
            heading: "Test".to_string(),
            caption: None,
            placement: Placement::Centered,
            mark,
            x: Encoding {
                column: x.to_string(),
                title: x.to_string(),
            },
            y: y
                .iter()
                .map(|c| Series {
                    column: (*c).to_string(),
                    label: (*c).to_string(),
                    color: ColorRole::Primary,
                })
                .collect(),
            y_title: "Rentals".to_string(),
            color_by: None,
            legend_title: None,
            filter: None,
            aggregation,
            wide: false,
        }
    }

    fn load(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_bar_means() {
        let table = load("Holiday,Casual,Registered\nNo,10,1\nNo,30,3\nYes,5,7\n");
        let data = prepare_chart(
            &table,
            &spec(Mark::StackedBar, "Holiday", &["Casual", "Registered"], Aggregation::Mean),
        )
        .unwrap();
        match data {
            ChartData::Bars {
                categories,
                series,
                stacked,
            } => {
                assert!(stacked);
                assert_eq!(categories, vec!["No", "Yes"]);
                assert_eq!(series[0].values, vec![20.0, 5.0]);
                assert_eq!(series[1].values, vec![2.0, 7.0]);
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_stream_layers() {
        let table = load("t,Season,n\n0.2,Fall,1\n0.1,Fall,2\n0.2,Spring,4\n0.2,Fall,3\n");
        let mut stream_spec = spec(Mark::Stream, "t", &["n"], Aggregation::Sum);
        stream_spec.color_by = Some("Season".to_string());

        match prepare_chart(&table, &stream_spec).unwrap() {
            ChartData::Stream { xs, layers } => {
                assert_eq!(xs, vec![0.1, 0.2]);
                assert_eq!(layers.len(), 2);
                assert_eq!(layers[0].label, "Fall");
                assert_eq!(layers[0].values, vec![2.0, 4.0]);
                assert_eq!(layers[1].label, "Spring");
                assert_eq!(layers[1].values, vec![0.0, 4.0]);
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_filtered_lines_sorted_by_x() {
        let table = load("Weekday,hr,n\nMonday,8,4\nMonday,0,1\nMonday,8,6\nTuesday,0,100\n");
        let mut line_spec = spec(Mark::Line, "hr", &["n"], Aggregation::Mean);
        line_spec.filter = Some(RowFilter {
            column: "Weekday".to_string(),
            equals: "Monday".to_string(),
        });

        match prepare_chart(&table, &line_spec).unwrap() {
            ChartData::Lines { series } => {
                assert_eq!(series[0].points, vec![(0.0, 1.0), (8.0, 5.0)]);
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_histogram_chart() {
        let table = load("hr,n\n0,1\n12,5\n23,2\n");
        let data = prepare_chart(
            &table,
            &spec(Mark::Histogram, "hr", &["n"], Aggregation::WeightedHistogram { bins: 24 }),
        )
        .unwrap();
        match data {
            ChartData::Histogram { histogram, density } => {
                assert_eq!(histogram.bins(), 24);
                assert!((histogram.total_weight() - 8.0).abs() < 1e-9);
                assert_eq!(density.len(), DENSITY_POINTS);
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_missing_column_fails_fast() {
        let table = load("Season,n\nFall,1\n");
        let err = prepare_chart(&table, &spec(Mark::Bar, "Holiday", &["n"], Aggregation::Mean))
            .unwrap_err();
        assert!(matches!(err, DashboardError::MissingColumn { column } if column == "Holiday"));
    }

    #[test]
    fn test_histogram_needs_matching_aggregation() {
        let table = load("hr,n\n0,1\n");
        assert!(prepare_chart(&table, &spec(Mark::Histogram, "hr", &["n"], Aggregation::Sum)).is_err());
        assert!(
            prepare_chart(&table, &spec(Mark::Line, "hr", &["n"], Aggregation::WeightedHistogram { bins: 2 }))
                .is_err()
        );
    }
}
