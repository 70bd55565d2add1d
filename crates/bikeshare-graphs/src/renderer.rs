//! Chart rendering trait and the plotters SVG implementation.

use crate::aggregator::Histogram;
use crate::palette::ChartStyle;
use crate::prepare::{BarSeries, ChartData, LineData, StreamLayer};
use crate::types::{ChartSpec, ColorRole};
use bikeshare_common::{truncate_string, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use tracing::{debug, instrument};

type Root<'s> = DrawingArea<SVGBackend<'s>, Shift>;
type Chart<'a, 's> = ChartContext<'a, SVGBackend<'s>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Turns prepared chart data into a rendered artifact.
pub trait ChartRenderer: Send + Sync {
    /// Render one chart to a self-contained document.
    fn render(&self, spec: &ChartSpec, data: &ChartData) -> Result<String>;

    /// File extension of rendered documents.
    fn file_extension(&self) -> &'static str {
        "svg"
    }
}

/// Renders charts as SVG with plotters.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    style: ChartStyle,
}

impl SvgRenderer {
    /// Creates a renderer with the given style.
    pub const fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    /// Current style.
    pub const fn style(&self) -> &ChartStyle {
        &self.style
    }

    fn text(&self, size: f64) -> TextStyle<'_> {
        (self.style.font_family.as_str(), size)
            .into_font()
            .color(&self.style.text)
    }

    fn builder<'a, 'b, 's>(&'b self, root: &'a Root<'s>, spec: &ChartSpec) -> ChartBuilder<'a, 'b, SVGBackend<'s>> {
        let mut builder = ChartBuilder::on(root);
        builder
            .margin(12)
            .x_label_area_size(44)
            .y_label_area_size(64);
        if let Some(caption) = &spec.caption {
            builder.caption(caption, self.text(16.0));
        }
        builder
    }

    fn draw_mesh(&self, chart: &mut Chart<'_, '_>, spec: &ChartSpec, categories: Option<&[String]>) -> Result<()> {
        let formatter = |x: &f64| match categories {
            Some(categories) => category_label(categories, *x),
            None => format_tick(*x),
        };

        let mut mesh = chart.configure_mesh();
        mesh.bold_line_style(self.style.grid.stroke_width(1))
            .light_line_style(self.style.grid.mix(0.35).stroke_width(1))
            .axis_style(self.style.grid.stroke_width(1))
            .label_style(self.text(12.0))
            .axis_desc_style(self.text(13.0))
            .x_desc(spec.x.title.as_str())
            .y_desc(spec.y_title.as_str())
            .x_label_formatter(&formatter);
        if let Some(categories) = categories {
            mesh.disable_x_mesh().x_labels(categories.len());
        }
        mesh.draw()?;
        Ok(())
    }

    fn draw_legend<'a>(&self, root: &Root<'_>, chart: &mut Chart<'a, 'a>, spec: &ChartSpec) -> Result<()> {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(self.style.background.mix(0.85).filled())
            .border_style(self.style.grid.stroke_width(1))
            .label_font(self.text(12.0))
            .draw()?;

        if let Some(title) = &spec.legend_title {
            let (width, _) = root.dim_in_pixel();
            #[allow(clippy::cast_possible_wrap)]
            let x = width as i32 - 150;
            root.draw_text(title, &self.text(12.0), (x.max(0), 2))?;
        }
        Ok(())
    }

    fn draw_bars(
        &self,
        root: &Root<'_>,
        spec: &ChartSpec,
        categories: &[String],
        series: &[BarSeries],
        stacked: bool,
    ) -> Result<()> {
        let (y_min, y_max) = bar_extent(series, stacked);
        #[allow(clippy::cast_precision_loss)]
        let x_range = -0.5..(categories.len() as f64 - 0.5);

        let mut chart = self
            .builder(root, spec)
            .build_cartesian_2d(x_range, padded(y_min, y_max))?;
        self.draw_mesh(&mut chart, spec, Some(categories))?;

        let mut base = vec![0.0; categories.len()];
        for series in series {
            let color = self.style.palette.resolve(series.color, 0);
            let bars = series.values.iter().enumerate().map(|(idx, value)| {
                let fill = match series.color {
                    ColorRole::Categorical => self.style.palette.categorical(idx),
                    _ => color,
                };
                let bottom = if stacked { base[idx] } else { 0.0 };
                #[allow(clippy::cast_precision_loss)]
                let center = idx as f64;
                Rectangle::new(
                    [(center - 0.4, bottom), (center + 0.4, bottom + value)],
                    fill.filled(),
                )
            });
            let drawn = chart.draw_series(bars.collect::<Vec<_>>())?;
            if stacked {
                drawn.label(series.label.as_str()).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
                for (slot, value) in base.iter_mut().zip(&series.values) {
                    *slot += value;
                }
            }
        }

        if stacked {
            self.draw_legend(root, &mut chart, spec)?;
        }
        Ok(())
    }

    fn draw_stream(
        &self,
        root: &Root<'_>,
        spec: &ChartSpec,
        xs: &[f64],
        layers: &[StreamLayer],
    ) -> Result<()> {
        let bands = stream_bands(layers, xs.len());
        let half = bands
            .iter()
            .flatten()
            .fold(0.0_f64, |acc, (lower, upper)| acc.max(lower.abs()).max(upper.abs()));

        let x_range = padded_domain(xs);
        let mut chart = self
            .builder(root, spec)
            .build_cartesian_2d(x_range, padded(-half, half))?;
        self.draw_mesh(&mut chart, spec, None)?;

        for (idx, (layer, band)) in layers.iter().zip(&bands).enumerate() {
            let color = self.style.palette.categorical(idx);
            let mut outline: Vec<(f64, f64)> = xs
                .iter()
                .zip(band)
                .map(|(x, (_, upper))| (*x, *upper))
                .collect();
            outline.extend(xs.iter().zip(band).rev().map(|(x, (lower, _))| (*x, *lower)));

            chart
                .draw_series(std::iter::once(Polygon::new(
                    outline,
                    color.mix(0.9).filled(),
                )))?
                .label(layer.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        self.draw_legend(root, &mut chart, spec)
    }

    fn draw_histogram(
        &self,
        root: &Root<'_>,
        spec: &ChartSpec,
        histogram: &Histogram,
        density: &[(f64, f64)],
    ) -> Result<()> {
        let peak = density
            .iter()
            .map(|(_, y)| *y)
            .fold(histogram.max_weight(), f64::max);
        let x_range = padded_domain(&histogram.edges);

        let mut chart = self
            .builder(root, spec)
            .build_cartesian_2d(x_range, padded(0.0, peak))?;
        self.draw_mesh(&mut chart, spec, None)?;

        let color = spec
            .y
            .first()
            .map_or_else(|| self.style.palette.primary(), |s| self.style.palette.resolve(s.color, 0));
        chart.draw_series(histogram.edges.windows(2).zip(&histogram.weights).map(
            |(edge, weight)| {
                Rectangle::new([(edge[0], 0.0), (edge[1], *weight)], color.mix(0.6).filled())
            },
        ))?;
        if !density.is_empty() {
            chart.draw_series(LineSeries::new(
                density.iter().copied(),
                color.stroke_width(2),
            ))?;
        }
        Ok(())
    }

    fn draw_lines(&self, root: &Root<'_>, spec: &ChartSpec, series: &[LineData]) -> Result<()> {
        let points = series.iter().flat_map(|s| s.points.iter());
        let (x_lo, x_hi, y_hi) = points.fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
            |(x_lo, x_hi, y_hi), (x, y)| (x_lo.min(*x), x_hi.max(*x), y_hi.max(*y)),
        );
        let x_range = padded_domain(&[x_lo, x_hi]);

        let mut chart = self
            .builder(root, spec)
            .build_cartesian_2d(x_range, padded(0.0, y_hi))?;
        self.draw_mesh(&mut chart, spec, None)?;

        for (idx, line) in series.iter().enumerate() {
            let color = self.style.palette.resolve(line.color, idx);
            chart
                .draw_series(LineSeries::new(
                    line.points.iter().copied(),
                    color.stroke_width(2),
                ))?
                .label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
        }

        if series.len() > 1 {
            self.draw_legend(root, &mut chart, spec)?;
        }
        Ok(())
    }
}

impl ChartRenderer for SvgRenderer {
    #[instrument(skip(self, spec, data), fields(chart = %spec.id))]
    fn render(&self, spec: &ChartSpec, data: &ChartData) -> Result<String> {
        let size = self.style.size(spec.wide);
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            root.fill(&self.style.background)?;

            if data.is_empty() {
                let (w, h) = size;
                #[allow(clippy::cast_possible_wrap)]
                let center = (w as i32 / 2 - 30, h as i32 / 2);
                root.draw_text("No data", &self.text(14.0), center)?;
            } else {
                match data {
                    ChartData::Bars {
                        categories,
                        series,
                        stacked,
                    } => self.draw_bars(&root, spec, categories, series, *stacked)?,
                    ChartData::Stream { xs, layers } => self.draw_stream(&root, spec, xs, layers)?,
                    ChartData::Histogram { histogram, density } => {
                        self.draw_histogram(&root, spec, histogram, density)?;
                    }
                    ChartData::Lines { series } => self.draw_lines(&root, spec, series)?,
                }
            }
            root.present()?;
        }
        debug!(bytes = svg.len(), "Rendered chart");
        Ok(svg)
    }
}

/// Lower and upper edge of every layer at every x position, stacked around a
/// baseline that keeps each column centered on zero.
pub fn stream_bands(layers: &[StreamLayer], len: usize) -> Vec<Vec<(f64, f64)>> {
    let mut lower: Vec<f64> = (0..len)
        .map(|i| -layers.iter().map(|l| l.values.get(i).copied().unwrap_or(0.0)).sum::<f64>() / 2.0)
        .collect();

    layers
        .iter()
        .map(|layer| {
            lower
                .iter_mut()
                .enumerate()
                .map(|(i, base)| {
                    let bottom = *base;
                    *base += layer.values.get(i).copied().unwrap_or(0.0);
                    (bottom, *base)
                })
                .collect()
        })
        .collect()
}

/// Smallest and largest bar end, stacking series when asked.
pub fn bar_extent(series: &[BarSeries], stacked: bool) -> (f64, f64) {
    let len = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let tops = (0..len).flat_map(|i| {
        let column = series.iter().map(move |s| s.values.get(i).copied().unwrap_or(0.0));
        if stacked {
            vec![column.sum::<f64>()]
        } else {
            column.collect()
        }
    });
    tops.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Value range with ten percent headroom; never empty.
pub fn padded(lo: f64, hi: f64) -> Range<f64> {
    let span = hi - lo;
    if !span.is_finite() || span <= f64::EPSILON {
        return (lo.min(0.0))..(lo.max(0.0) + 1.0);
    }
    let pad = span * 0.1;
    let lo = if lo < 0.0 { lo - pad } else { lo };
    lo..(hi + pad)
}

/// Range spanning the values, widened by one unit when they coincide.
pub fn padded_domain(values: &[f64]) -> Range<f64> {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if hi - lo <= f64::EPSILON {
        return (lo - 0.5)..(hi + 0.5);
    }
    lo..hi
}

/// Longest category label drawn under a tick.
pub const MAX_CATEGORY_LABEL: usize = 16;

/// Category under an integer tick, blank elsewhere.
pub fn category_label(categories: &[String], x: f64) -> String {
    let rounded = x.round();
    if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let idx = rounded as usize;
    categories
        .get(idx)
        .map(|c| truncate_string(c, MAX_CATEGORY_LABEL))
        .unwrap_or_default()
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Aggregation, Encoding, Mark, Placement, Series};
    use bikeshare_config::DEFAULT_PALETTE as DEFAULT_COLORS;

    fn layer(label: &str, values: &[f64]) -> StreamLayer {
        StreamLayer {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_stream_bands_centered() {
        let layers = [layer("Fall", &[2.0, 4.0]), layer("Spring", &[2.0, 0.0])];
        let bands = stream_bands(&layers, 2);
        assert_eq!(bands[0], vec![(-2.0, 0.0), (-2.0, 2.0)]);
        assert_eq!(bands[1], vec![(0.0, 2.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_bar_extent() {
        let series = vec![
            BarSeries {
                label: "Casual".into(),
                color: ColorRole::CompareFirst,
                values: vec![1.0, 5.0],
            },
            BarSeries {
                label: "Registered".into(),
                color: ColorRole::CompareSecond,
                values: vec![4.0, 2.0],
            },
        ];
        assert_eq!(bar_extent(&series, false), (0.0, 5.0));
        assert_eq!(bar_extent(&series, true), (0.0, 7.0));
    }

    #[test]
    fn test_ranges() {
        let range = padded(0.0, 10.0);
        assert!((range.end - 11.0).abs() < 1e-9);
        assert_eq!(padded(0.0, 0.0), 0.0..1.0);
        assert_eq!(padded_domain(&[3.0, 3.0]), 2.5..3.5);
        assert_eq!(padded_domain(&[]), 0.0..1.0);
        assert_eq!(padded_domain(&[0.0, 23.0]), 0.0..23.0);
    }

    #[test]
    fn test_category_labels() {
        let categories = vec!["No".to_string(), "Yes".to_string()];
        assert_eq!(category_label(&categories, 1.0), "Yes");
        assert_eq!(category_label(&categories, 0.5), "");
        assert_eq!(category_label(&categories, -1.0), "");
        assert_eq!(category_label(&categories, 7.0), "");

        let long = vec!["Light Snow, Light Rain + Thunderstorm".to_string()];
        assert_eq!(category_label(&long, 0.0), "Light Snow, L...");
        assert_eq!(format_tick(4.0), "4");
        assert_eq!(format_tick(0.25), "0.25");
    }

    fn chart_spec(mark: Mark, color: ColorRole, legend_title: Option<&str>) -> ChartSpec {
        ChartSpec {
            id: "chart".to_string(),
            section: None,
            heading: "Chart".to_string(),
            caption: Some("Average Number of Rentals".to_string()),
            placement: Placement::Centered,
            mark,
            x: Encoding {
                column: "x".to_string(),
                title: "Day Type".to_string(),
            },
            y: vec![Series {
                column: "y".to_string(),
                label: "Casual".to_string(),
                color,
            }],
            y_title: "Rentals".to_string(),
            color_by: None,
            legend_title: legend_title.map(str::to_string),
            filter: None,
            aggregation: Aggregation::Mean,
            wide: false,
        }
    }

    fn render(spec: &ChartSpec, data: &ChartData) -> String {
        let svg = SvgRenderer::default().render(spec, data).unwrap();
        assert!(svg.starts_with("<svg"), "not an svg document: {svg:.80}");
        assert!(svg.trim_end().ends_with("</svg>"));
        svg.to_ascii_lowercase()
    }

    #[test]
    fn test_render_stacked_bars() {
        let spec = chart_spec(Mark::StackedBar, ColorRole::CompareFirst, Some("User Type"));
        let data = ChartData::Bars {
            categories: vec!["No".to_string(), "Yes".to_string()],
            series: vec![
                BarSeries {
                    label: "Casual".to_string(),
                    color: ColorRole::CompareFirst,
                    values: vec![20.0, 5.0],
                },
                BarSeries {
                    label: "Registered".to_string(),
                    color: ColorRole::CompareSecond,
                    values: vec![60.0, 40.0],
                },
            ],
            stacked: true,
        };

        let svg = render(&spec, &data);
        assert!(svg.contains("#8fbf4d"));
        assert!(svg.contains("#f2c14e"));
        assert!(svg.contains("#0e1117"));
        assert!(svg.contains("average number of rentals"));
        assert!(svg.contains("user type"));
        assert!(svg.contains("registered"));
    }

    #[test]
    fn test_render_categorical_bars_cycle_palette() {
        let spec = chart_spec(Mark::Bar, ColorRole::Categorical, None);
        let data = ChartData::Bars {
            categories: vec!["Clear".to_string(), "Mist".to_string(), "Rain".to_string()],
            series: vec![BarSeries {
                label: "Rentals".to_string(),
                color: ColorRole::Categorical,
                values: vec![200.0, 150.0, 40.0],
            }],
            stacked: false,
        };

        let svg = render(&spec, &data);
        for color in &DEFAULT_COLORS[..3] {
            assert!(svg.contains(color), "missing {color}");
        }
    }

    #[test]
    fn test_render_stream() {
        let mut spec = chart_spec(Mark::Stream, ColorRole::Categorical, Some("Season"));
        spec.color_by = Some("Season".to_string());
        let data = ChartData::Stream {
            xs: vec![0.2, 0.4, 0.6],
            layers: vec![layer("Fall", &[10.0, 30.0, 20.0]), layer("Spring", &[5.0, 0.0, 15.0])],
        };

        let svg = render(&spec, &data);
        assert!(svg.contains("<polygon"));
        assert!(svg.contains(DEFAULT_COLORS[0]));
        assert!(svg.contains(DEFAULT_COLORS[1]));
        assert!(svg.contains("spring"));
        assert!(svg.contains("season"));
    }

    #[test]
    fn test_render_histogram_with_density() {
        let spec = chart_spec(Mark::Histogram, ColorRole::Primary, None);
        let histogram = Histogram {
            edges: vec![0.0, 6.0, 12.0, 18.0, 24.0],
            weights: vec![10.0, 40.0, 55.0, 20.0],
        };
        let density = vec![(0.0, 8.0), (6.0, 35.0), (12.0, 50.0), (18.0, 30.0), (24.0, 9.0)];
        let data = ChartData::Histogram { histogram, density };

        let svg = render(&spec, &data);
        assert!(svg.contains("<rect"));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains(DEFAULT_COLORS[0]));
    }

    #[test]
    fn test_render_lines() {
        let spec = chart_spec(Mark::Line, ColorRole::CompareFirst, Some("User Type"));
        let data = ChartData::Lines {
            series: vec![
                LineData {
                    label: "Casual".to_string(),
                    color: ColorRole::CompareFirst,
                    points: vec![(0.0, 5.0), (1.0, 7.0), (2.0, 4.0)],
                },
                LineData {
                    label: "Registered".to_string(),
                    color: ColorRole::CompareSecond,
                    points: vec![(0.0, 20.0), (1.0, 23.0), (2.0, 26.0)],
                },
            ],
        };

        let svg = render(&spec, &data);
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("#8fbf4d"));
        assert!(svg.contains("#f2c14e"));
        assert!(svg.contains("registered"));
    }

    #[test]
    fn test_render_empty_data_notice() {
        let spec = chart_spec(Mark::Line, ColorRole::Primary, None);
        let svg = render(&spec, &ChartData::Lines { series: Vec::new() });
        assert!(svg.contains("no data"));
        assert!(!svg.contains("<polyline"));
    }
}
