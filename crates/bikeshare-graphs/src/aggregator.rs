//! Summary statistics over a [`Dataset`]: sums, grouped means and sums,
//! row filters and the weighted hour histogram.

use crate::dataset::{CellValue, Column, Dataset};
use bikeshare_common::{DashboardError, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::trace;

/// Sum of a numeric column with nulls skipped.
///
/// Returns `None` when the column is missing or holds text, in which case
/// no metric should be shown.
pub fn sum_column(table: &Dataset, column: &str) -> Option<f64> {
    let values = table.get_column(column)?.as_numeric()?;
    Some(values.iter().flatten().sum())
}

#[derive(Clone, Copy)]
enum Reducer {
    Mean,
    Sum,
}

struct Group {
    keys: Vec<CellValue>,
    sums: Vec<f64>,
    counts: Vec<usize>,
}

/// Mean of each value column per distinct key combination.
///
/// Groups appear in order of first occurrence. Rows with a null key cell are
/// left out; a group whose values are all null gets a null mean.
pub fn group_mean(table: &Dataset, keys: &[&str], values: &[&str]) -> Result<Dataset> {
    group_by(table, keys, values, Reducer::Mean)
}

/// Sum of each value column per distinct key combination.
///
/// Same partitioning as [`group_mean`].
pub fn group_sum(table: &Dataset, keys: &[&str], values: &[&str]) -> Result<Dataset> {
    group_by(table, keys, values, Reducer::Sum)
}

fn group_by(table: &Dataset, keys: &[&str], values: &[&str], reducer: Reducer) -> Result<Dataset> {
    if keys.is_empty() {
        return Err(DashboardError::data("grouping needs at least one key column"));
    }

    let key_columns = keys
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<&Column>>>()?;
    let value_columns = values
        .iter()
        .map(|name| table.numeric_column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: Vec<Group> = Vec::new();
    let mut lookup: HashMap<Vec<CellValue>, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in 0..table.row_count() {
        let Some(key) = key_columns
            .iter()
            .map(|column| column.cell(row))
            .collect::<Option<Vec<CellValue>>>()
        else {
            dropped += 1;
            continue;
        };

        let idx = *lookup.entry(key).or_insert_with_key(|key| {
            groups.push(Group {
                keys: key.clone(),
                sums: vec![0.0; value_columns.len()],
                counts: vec![0; value_columns.len()],
            });
            groups.len() - 1
        });

        let group = &mut groups[idx];
        for (slot, column) in value_columns.iter().enumerate() {
            if let Some(value) = column[row] {
                group.sums[slot] += value;
                group.counts[slot] += 1;
            }
        }
    }

    if dropped > 0 {
        trace!(dropped, ?keys, "Dropped rows with null group keys");
    }

    let mut columns = Vec::with_capacity(keys.len() + values.len());
    for (position, source) in key_columns.iter().enumerate() {
        let cells = groups.iter().map(|g| &g.keys[position]);
        let column = if source.is_numeric() {
            Column::numeric(
                source.name(),
                cells
                    .map(|cell| match cell {
                        CellValue::Number(n) => Some(*n),
                        CellValue::Text(_) => None,
                    })
                    .collect(),
            )
        } else {
            Column::text(source.name(), cells.map(|cell| Some(cell.to_string())).collect())
        };
        columns.push(column);
    }

    for (slot, name) in values.iter().enumerate() {
        let reduced = groups
            .iter()
            .map(|g| match reducer {
                Reducer::Sum => Some(g.sums[slot]),
                #[allow(clippy::cast_precision_loss)]
                Reducer::Mean => (g.counts[slot] > 0).then(|| g.sums[slot] / g.counts[slot] as f64),
            })
            .collect();
        columns.push(Column::numeric(*name, reduced));
    }

    Dataset::new(columns)
}

/// Rows whose `column` cell displays as `value`.
pub fn filter_eq(table: &Dataset, column: &str, value: &str) -> Result<Dataset> {
    let source = table.column(column)?;
    let rows: Vec<usize> = (0..table.row_count())
        .filter(|&row| source.cell(row).is_some_and(|cell| cell.to_string() == value))
        .collect();
    Ok(table.take_rows(&rows))
}

/// Distinct cells of a column in first-occurrence order, nulls skipped.
pub fn distinct_values(table: &Dataset, column: &str) -> Result<Vec<CellValue>> {
    let source = table.column(column)?;
    let mut seen = Vec::new();
    for row in 0..table.row_count() {
        if let Some(cell) = source.cell(row) {
            if !seen.contains(&cell) {
                seen.push(cell);
            }
        }
    }
    Ok(seen)
}

/// Equal-width histogram with per-bin weight sums.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    /// Summed weight per bin
    pub weights: Vec<f64>,
}

impl Histogram {
    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.weights.len()
    }

    /// Width of every bin.
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            #[allow(clippy::cast_precision_loss)]
            (Some(lo), Some(hi)) if self.bins() > 0 => (hi - lo) / self.bins() as f64,
            _ => 0.0,
        }
    }

    /// Total weight over all bins.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Largest bin weight.
    pub fn max_weight(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }
}

/// Observations and weights of a weighted histogram, nulls removed.
fn weighted_pairs(table: &Dataset, column: &str, weights: &str) -> Result<Vec<(f64, f64)>> {
    let values = table.numeric_column(column)?;
    let weights = table.numeric_column(weights)?;
    Ok(values
        .iter()
        .zip(weights)
        .filter_map(|(v, w)| Some(((*v)?, (*w)?)))
        .collect())
}

/// Histogram of `column` weighted by `weights` over `bins` equal-width bins.
///
/// Bins span the column's min..max; the last bin is closed on the right.
/// A constant column gets the range `value - 0.5 .. value + 0.5`.
pub fn weighted_histogram(
    table: &Dataset,
    column: &str,
    weights: &str,
    bins: usize,
) -> Result<Histogram> {
    if bins == 0 {
        return Err(DashboardError::data("histogram needs at least one bin"));
    }
    let pairs = weighted_pairs(table, column, weights)?;

    let (mut lo, mut hi) = pairs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (v, _)| {
            (lo.min(*v), hi.max(*v))
        });
    if pairs.is_empty() {
        lo = 0.0;
        hi = 1.0;
    } else if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;
    #[allow(clippy::cast_precision_loss)]
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut totals = vec![0.0; bins];
    for (value, weight) in pairs {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let idx = (((value - lo) / width).floor() as usize).min(bins - 1);
        totals[idx] += weight;
    }

    Ok(Histogram {
        edges,
        weights: totals,
    })
}

/// Gaussian kernel density of `column` weighted by `weights`, evaluated at
/// `points` evenly spaced positions across the histogram's range and scaled
/// to the histogram's counts (total weight times bin width).
///
/// Bandwidth follows Scott's rule with the effective sample size of the
/// weights. Returns an empty curve when the data has no spread.
pub fn weighted_density(
    table: &Dataset,
    column: &str,
    weights: &str,
    histogram: &Histogram,
    points: usize,
) -> Result<Vec<(f64, f64)>> {
    let pairs = weighted_pairs(table, column, weights)?;
    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    let squares: f64 = pairs.iter().map(|(_, w)| w * w).sum();
    if pairs.len() < 2 || total <= 0.0 || points < 2 {
        return Ok(Vec::new());
    }

    let mean = pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total;
    let variance = pairs
        .iter()
        .map(|(v, w)| w * (v - mean).powi(2))
        .sum::<f64>()
        / total;
    let effective_n = total * total / squares;
    let bandwidth = variance.sqrt() * effective_n.powf(-0.2);
    if bandwidth <= f64::EPSILON {
        return Ok(Vec::new());
    }

    let (Some(&lo), Some(&hi)) = (histogram.edges.first(), histogram.edges.last()) else {
        return Ok(Vec::new());
    };
    let scale = histogram.total_weight() * histogram.bin_width();
    let norm = total * bandwidth * (2.0 * std::f64::consts::PI).sqrt();

    #[allow(clippy::cast_precision_loss)]
    let step = (hi - lo) / (points - 1) as f64;
    Ok((0..points)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = lo + step * i as f64;
            let density: f64 = pairs
                .iter()
                .map(|(v, w)| w * (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                / norm;
            (x, density * scale)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_holiday_group_mean() {
        let table = load("Holiday,Casual\nNo,10\nNo,30\nYes,5\n");
        let grouped = group_mean(&table, &["Holiday"], &["Casual"]).unwrap();
        assert_eq!(grouped.row_count(), 2);
        assert_eq!(
            grouped.column("Holiday").unwrap().data().labels(),
            vec!["No", "Yes"]
        );
        assert_eq!(grouped.numeric_column("Casual").unwrap(), &[Some(20.0), Some(5.0)]);
    }

    #[test]
    fn test_group_sum_two_keys() {
        let table = load("t,Season,n\n1,Fall,2\n2,Fall,3\n1,Fall,4\n1,Spring,1\n");
        let grouped = group_sum(&table, &["t", "Season"], &["n"]).unwrap();
        assert_eq!(grouped.row_count(), 3);
        assert!(grouped.column("t").unwrap().is_numeric());
        assert_eq!(grouped.numeric_column("t").unwrap(), &[Some(1.0), Some(2.0), Some(1.0)]);
        assert_eq!(grouped.numeric_column("n").unwrap(), &[Some(6.0), Some(3.0), Some(1.0)]);
    }

    #[test]
    fn test_null_keys_dropped() {
        let table = load("k,v\na,1\n,5\na,3\n");
        let grouped = group_mean(&table, &["k"], &["v"]).unwrap();
        assert_eq!(grouped.row_count(), 1);
        assert_eq!(grouped.numeric_column("v").unwrap(), &[Some(2.0)]);
    }

    #[test]
    fn test_null_values_skipped() {
        let table = load("k,v\na,\na,4\nb,\n");
        let mean = group_mean(&table, &["k"], &["v"]).unwrap();
        assert_eq!(mean.numeric_column("v").unwrap(), &[Some(4.0), None]);
        let sum = group_sum(&table, &["k"], &["v"]).unwrap();
        assert_eq!(sum.numeric_column("v").unwrap(), &[Some(4.0), Some(0.0)]);
    }

    #[test]
    fn test_group_errors() {
        let table = load("k,v,label\na,1,x\n");
        assert!(matches!(
            group_mean(&table, &["missing"], &["v"]),
            Err(DashboardError::MissingColumn { .. })
        ));
        assert!(matches!(
            group_mean(&table, &["k"], &["label"]),
            Err(DashboardError::NonNumericColumn { .. })
        ));
        assert!(group_sum(&table, &[], &["v"]).is_err());
    }

    #[test]
    fn test_sum_column() {
        let table = load("n,label\n1.5,a\n,b\n2.5,c\n");
        assert_eq!(sum_column(&table, "n"), Some(4.0));
        assert_eq!(sum_column(&table, "label"), None);
        assert_eq!(sum_column(&table, "absent"), None);
    }

    #[test]
    fn test_filter_eq() {
        let table = load("Weekday,hr\nMonday,1\nTuesday,2\nMonday,3\n");
        let monday = filter_eq(&table, "Weekday", "Monday").unwrap();
        assert_eq!(monday.numeric_column("hr").unwrap(), &[Some(1.0), Some(3.0)]);
        let numeric = filter_eq(&table, "hr", "2").unwrap();
        assert_eq!(numeric.row_count(), 1);
        assert!(filter_eq(&table, "Month", "Jan").is_err());
    }

    #[test]
    fn test_distinct_values() {
        let table = load("Season\nFall\nSpring\nFall\n\n");
        let values = distinct_values(&table, "Season").unwrap();
        assert_eq!(
            values,
            vec![CellValue::Text("Fall".into()), CellValue::Text("Spring".into())]
        );
    }

    #[test]
    fn test_weighted_histogram() {
        let table = load("hr,n\n0,1\n1,2\n2,3\n3,4\n");
        let hist = weighted_histogram(&table, "hr", "n", 3).unwrap();
        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0]);
        // The closing edge belongs to the last bin.
        assert_eq!(hist.weights, vec![1.0, 2.0, 7.0]);
        assert!((hist.total_weight() - 10.0).abs() < 1e-9);
        assert!((hist.bin_width() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_histogram() {
        let table = load("hr,n\n5,2\n5,3\n");
        let hist = weighted_histogram(&table, "hr", "n", 2).unwrap();
        assert_eq!(hist.edges, vec![4.5, 5.0, 5.5]);
        assert_eq!(hist.weights, vec![0.0, 5.0]);
        assert!(weighted_density(&table, "hr", "n", &hist, 10).unwrap().is_empty());
    }

    #[test]
    fn test_density_scaled_to_counts() {
        let table = load("hr,n\n0,4\n1,8\n2,8\n3,4\n4,2\n");
        let hist = weighted_histogram(&table, "hr", "n", 4).unwrap();
        let curve = weighted_density(&table, "hr", "n", &hist, 50).unwrap();
        assert_eq!(curve.len(), 50);
        assert!((curve[0].0 - 0.0).abs() < 1e-9);
        assert!((curve[49].0 - 4.0).abs() < 1e-9);
        assert!(curve.iter().all(|(_, y)| *y >= 0.0));
        // The area under the scaled curve stays below total weight times bin width.
        let area: f64 = curve.windows(2).map(|w| (w[1].0 - w[0].0) * (w[0].1 + w[1].1) / 2.0).sum();
        assert!(area > 0.0 && area <= hist.total_weight() * hist.bin_width());
    }
}
