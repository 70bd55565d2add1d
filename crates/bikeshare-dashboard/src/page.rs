//! HTML page and output files for a dashboard view.
//!
//! The page is self-contained: charts are inlined as SVG, styling lives in a
//! `<style>` block and tab groups use exclusive `<details>` elements, so the
//! output directory can be opened straight from disk.

use crate::error::{AppError, AppResult};
use bikeshare_common::{escape_html, format_timestamp, slugify, BusinessQuestion, TimeFrame};
use bikeshare_graphs::{DashboardView, Placement, RenderedChart};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Name of the page written into the output directory.
pub const INDEX_FILE: &str = "index.html";

/// Name of the JSON description of a pass.
pub const VIEW_FILE: &str = "view.json";

const STATISTICS_HEADING: &str = "All-Time Statistics";

const STYLE: &str = r#"
body { margin: 0; display: flex; background: #0e1117; color: #fafafa; font-family: sans-serif; }
aside.sidebar { width: 16rem; padding: 1.5rem; background: #262730; min-height: 100vh; }
aside.sidebar dt { color: #8b949e; font-size: 0.85rem; margin-top: 1rem; }
aside.sidebar dd { margin: 0.25rem 0 0; font-weight: 600; }
main { flex: 1; padding: 1.5rem 3rem; min-width: 0; }
.metrics { display: flex; gap: 3rem; }
.metric .label { display: block; color: #8b949e; font-size: 0.9rem; }
.metric .value { display: block; font-size: 2.2rem; }
.columns { display: grid; gap: 1.5rem; }
.centered { display: grid; grid-template-columns: 1fr 3fr 1fr; }
.centered > .chart { grid-column: 2; }
.chart svg { max-width: 100%; height: auto; }
.tabs details { border-bottom: 1px solid #1e2228; }
.tabs summary { cursor: pointer; padding: 0.5rem 0; }
footer { margin-top: 3rem; color: #8b949e; font-size: 0.8rem; }
"#;

/// Files written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFiles {
    /// The HTML page
    pub index: PathBuf,
    /// One SVG per chart, in page order
    pub charts: Vec<PathBuf>,
    /// JSON description of the view
    pub view: PathBuf,
}

/// Consecutive charts sharing a section and layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PageBlock<'a> {
    /// Section title shown above the block
    pub section: Option<&'a str>,
    /// Layout kind, see [`Placement::layout_kind`]
    pub kind: &'static str,
    /// Charts in the block
    pub charts: Vec<&'a RenderedChart>,
}

/// Splits the charts of a view into page blocks.
///
/// A block ends when the section or layout kind changes, or when a column
/// placement starts a new row at index 0.
pub fn page_blocks(charts: &[RenderedChart]) -> Vec<PageBlock<'_>> {
    let mut blocks: Vec<PageBlock<'_>> = Vec::new();
    for chart in charts {
        let section = chart.spec.section.as_deref();
        let kind = chart.spec.placement.layout_kind();
        let new_row = matches!(chart.spec.placement, Placement::Column { index: 0, .. });

        match blocks.last_mut() {
            Some(block) if block.section == section && block.kind == kind && !new_row => {
                block.charts.push(chart);
            }
            _ => blocks.push(PageBlock {
                section,
                kind,
                charts: vec![chart],
            }),
        }
    }
    blocks
}

/// Intro paragraph naming the lower-cased time frame.
pub fn intro_text(time_frame: TimeFrame) -> String {
    format!(
        "This dashboard provides insights into the bike-sharing dataset, focusing on factors \
         influencing the {} count of rentals and the rental patterns of casual vs. registered users.",
        time_frame.to_string().to_lowercase()
    )
}

/// Renders the full HTML page for a view.
pub fn render_page(title: &str, view: &DashboardView) -> String {
    let mut html = String::with_capacity(
        8 * 1024 + view.charts.iter().map(|c| c.document.len()).sum::<usize>(),
    );
    let title = escape_html(title);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );
    write_sidebar(&mut html, view.question, view.time_frame);

    let _ = writeln!(html, "<main>\n<h1>{title}</h1>");
    let _ = writeln!(html, "<p class=\"intro\">{}</p>", escape_html(&intro_text(view.time_frame)));

    if let Some(heading) = &view.heading {
        let _ = writeln!(html, "<h2>{}</h2>", escape_html(heading));
    }

    let _ = writeln!(html, "<h2>{STATISTICS_HEADING}</h2>\n<div class=\"metrics\">");
    for metric in &view.metrics {
        let _ = writeln!(
            html,
            "<div class=\"metric\"><span class=\"label\">{}</span><span class=\"value\">{}</span></div>",
            escape_html(&metric.spec.label),
            escape_html(&metric.display)
        );
    }
    html.push_str("</div>\n");

    for (idx, block) in page_blocks(&view.charts).iter().enumerate() {
        write_block(&mut html, idx, block);
    }

    let _ = write!(
        html,
        "<footer>Generated {}</footer>\n</main>\n</body>\n</html>\n",
        format_timestamp(view.generated_at)
    );
    html
}

fn write_sidebar(html: &mut String, question: BusinessQuestion, time_frame: TimeFrame) {
    let _ = write!(
        html,
        "<aside class=\"sidebar\">\n<dl>\n\
         <dt>Select Business Question</dt><dd>{}</dd>\n\
         <dt>Select time frame</dt><dd>{}</dd>\n\
         </dl>\n</aside>\n",
        escape_html(question.label()),
        time_frame
    );
}

fn write_block(html: &mut String, idx: usize, block: &PageBlock<'_>) {
    let _ = writeln!(html, "<section class=\"block\">");
    if let Some(section) = block.section {
        let _ = writeln!(html, "<h2>{}</h2>", escape_html(section));
    }

    match block.kind {
        "columns" => {
            let _ = writeln!(
                html,
                "<div class=\"columns\" style=\"grid-template-columns: repeat({}, 1fr)\">",
                block.charts.len()
            );
            for chart in &block.charts {
                write_chart(html, chart);
            }
            html.push_str("</div>\n");
        }
        "centered" => {
            html.push_str("<div class=\"centered\">\n");
            for chart in &block.charts {
                write_chart(html, chart);
            }
            html.push_str("</div>\n");
        }
        _ => {
            let group = format!(
                "tabs-{idx}-{}",
                slugify(block.section.unwrap_or("charts"))
            );
            html.push_str("<div class=\"tabs\">\n");
            for (tab, chart) in block.charts.iter().enumerate() {
                let label = match &chart.spec.placement {
                    Placement::Tab { label } => label.as_str(),
                    _ => chart.spec.heading.as_str(),
                };
                let open = if tab == 0 { " open" } else { "" };
                let _ = writeln!(
                    html,
                    "<details name=\"{group}\"{open}><summary>{}</summary>",
                    escape_html(label)
                );
                write_chart(html, chart);
                html.push_str("</details>\n");
            }
            html.push_str("</div>\n");
        }
    }
    html.push_str("</section>\n");
}

fn write_chart(html: &mut String, chart: &RenderedChart) {
    let _ = writeln!(
        html,
        "<div class=\"chart\" id=\"{}\">\n<h3>{}</h3>\n{}\n</div>",
        escape_html(&chart.spec.id),
        escape_html(&chart.spec.heading),
        chart.document
    );
}

/// Writes `index.html`, one `<chart-id>.<extension>` per chart and
/// `view.json` into `output_dir`, creating it when needed.
///
/// Chart files of an earlier pass that are not part of `view` are removed,
/// so the directory always matches `view.json`.
#[instrument(skip(title, view), fields(charts = view.charts.len()))]
pub fn write_outputs(
    output_dir: &Path,
    title: &str,
    view: &DashboardView,
    extension: &str,
) -> AppResult<OutputFiles> {
    fs::create_dir_all(output_dir).map_err(|e| AppError::io(output_dir, e))?;
    remove_stale_charts(output_dir, view, extension)?;

    let mut charts = Vec::with_capacity(view.charts.len());
    for chart in &view.charts {
        let path = output_dir.join(format!("{}.{extension}", chart.spec.id));
        fs::write(&path, &chart.document).map_err(|e| AppError::io(&path, e))?;
        debug!(path = %path.display(), "Wrote chart");
        charts.push(path);
    }

    let view_path = output_dir.join(VIEW_FILE);
    let json = serde_json::to_string_pretty(view)?;
    fs::write(&view_path, json).map_err(|e| AppError::io(&view_path, e))?;

    let index = output_dir.join(INDEX_FILE);
    fs::write(&index, render_page(title, view)).map_err(|e| AppError::io(&index, e))?;

    info!(path = %index.display(), "Wrote dashboard page");
    Ok(OutputFiles {
        index,
        charts,
        view: view_path,
    })
}

/// Deletes `*.<extension>` files in `output_dir` whose stem is not a chart id
/// of `view`. Returns how many were removed.
pub fn remove_stale_charts(output_dir: &Path, view: &DashboardView, extension: &str) -> AppResult<usize> {
    let current: HashSet<&str> = view.charts.iter().map(|c| c.spec.id.as_str()).collect();
    let entries = fs::read_dir(output_dir).map_err(|e| AppError::io(output_dir, e))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry.map_err(|e| AppError::io(output_dir, e))?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let stale = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| !current.contains(stem));
        if stale {
            fs::remove_file(&path).map_err(|e| AppError::io(&path, e))?;
            debug!(path = %path.display(), "Removed stale chart");
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_graphs::{Aggregation, ChartSpec, Encoding, Mark, MetricSpec, MetricValue, ResolvedColumns};
    use chrono::{TimeZone, Utc};

    fn chart(id: &str, section: Option<&str>, placement: Placement) -> RenderedChart {
        RenderedChart {
            spec: ChartSpec {
                id: id.to_string(),
                section: section.map(str::to_string),
                heading: format!("Heading {id}"),
                caption: None,
                placement,
                mark: Mark::Bar,
                x: Encoding {
                    column: "Season".to_string(),
                    title: "Season".to_string(),
                },
                y: Vec::new(),
                y_title: "Rentals".to_string(),
                color_by: None,
                legend_title: None,
                filter: None,
                aggregation: Aggregation::Mean,
                wide: false,
            },
            document: format!("<svg id=\"{id}\"></svg>"),
        }
    }

    fn view(charts: Vec<RenderedChart>) -> DashboardView {
        let names: HashSet<String> = HashSet::new();
        DashboardView {
            question: BusinessQuestion::RentalFactors,
            time_frame: TimeFrame::Hourly,
            heading: None,
            columns: ResolvedColumns::resolve(&names, TimeFrame::Hourly),
            metrics: vec![MetricValue {
                spec: MetricSpec {
                    label: "Total Rentals (Hourly)".to_string(),
                    column: "Hourly Total Rentals".to_string(),
                },
                value: 3_292_679,
                display: "3,292,679".to_string(),
            }],
            charts,
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn column(index: usize, of: usize) -> Placement {
        Placement::Column { index, of }
    }

    #[test]
    fn test_blocks_split_on_section_and_row() {
        let charts = vec![
            chart("a", Some("By Category"), column(0, 2)),
            chart("b", Some("By Category"), column(1, 2)),
            chart("c", None, column(0, 2)),
            chart("d", None, column(1, 2)),
            chart("e", None, Placement::Centered),
            chart("f", Some("Days"), Placement::Tab { label: "Sunday".to_string() }),
            chart("g", Some("Days"), Placement::Tab { label: "Monday".to_string() }),
        ];
        let blocks = page_blocks(&charts);

        let shape: Vec<_> = blocks
            .iter()
            .map(|b| (b.section, b.kind, b.charts.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (Some("By Category"), "columns", 2),
                (None, "columns", 2),
                (None, "centered", 1),
                (Some("Days"), "tabs", 2),
            ]
        );
    }

    #[test]
    fn test_new_row_starts_block_in_same_section() {
        let charts = vec![
            chart("a", None, column(0, 1)),
            chart("b", None, column(0, 1)),
        ];
        assert_eq!(page_blocks(&charts).len(), 2);
    }

    #[test]
    fn test_intro_names_lowercase_time_frame() {
        assert!(intro_text(TimeFrame::Daily).contains("the daily count of rentals"));
        assert!(intro_text(TimeFrame::Hourly).contains("the hourly count of rentals"));
    }

    #[test]
    fn test_page_layout() {
        let page = render_page(
            "Bike Sharing Analysis Dashboard",
            &view(vec![
                chart("bars", Some("By Category"), column(0, 1)),
                chart("sun", Some("Days"), Placement::Tab { label: "Sunday".to_string() }),
                chart("mon", Some("Days"), Placement::Tab { label: "Monday".to_string() }),
            ]),
        );

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1>Bike Sharing Analysis Dashboard</h1>"));
        assert!(page.contains("<dd>Factors Influencing Total Rentals</dd>"));
        assert!(page.contains("<dd>Hourly</dd>"));
        assert!(page.contains("<h2>All-Time Statistics</h2>"));
        assert!(page.contains("<span class=\"value\">3,292,679</span>"));
        assert!(page.contains("repeat(1, 1fr)"));
        assert!(page.contains("<svg id=\"bars\"></svg>"));
        assert!(page.contains("<details name=\"tabs-1-days\" open><summary>Sunday</summary>"));
        assert!(page.contains("<details name=\"tabs-1-days\"><summary>Monday</summary>"));
        assert!(page.contains("<footer>Generated 2024-05-01 12:00:00 UTC</footer>"));
    }

    #[test]
    fn test_page_escapes_text() {
        let page = render_page("Rentals <&> Weather", &view(Vec::new()));
        assert!(page.contains("<title>Rentals &lt;&amp;&gt; Weather</title>"));
        assert!(!page.contains("<section class=\"block\">"));
    }

    #[test]
    fn test_write_outputs_removes_stale_charts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path();
        fs::write(out.join("notes.txt"), "kept").unwrap();

        write_outputs(
            out,
            "Dashboard",
            &view(vec![
                chart("rentals-on-monday", None, column(0, 2)),
                chart("rentals-by-season", None, column(1, 2)),
            ]),
            "svg",
        )
        .unwrap();
        let files = write_outputs(
            out,
            "Dashboard",
            &view(vec![chart("rentals-by-season", None, column(0, 1))]),
            "svg",
        )
        .unwrap();

        let mut svgs: Vec<_> = fs::read_dir(out)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|e| e == "svg"))
            .collect();
        svgs.sort();
        assert_eq!(svgs, files.charts);
        assert!(!out.join("rentals-on-monday.svg").exists());
        assert!(out.join("notes.txt").exists());
    }

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("dashboard");
        let files = write_outputs(
            &out,
            "Dashboard",
            &view(vec![chart("bars", None, column(0, 1))]),
            "svg",
        )
        .unwrap();

        assert_eq!(files.index, out.join(INDEX_FILE));
        assert_eq!(files.charts, vec![out.join("bars.svg")]);
        assert_eq!(fs::read_to_string(out.join("bars.svg")).unwrap(), "<svg id=\"bars\"></svg>");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.view).unwrap()).unwrap();
        assert_eq!(json["question"], "rental-factors");
        assert_eq!(json["charts"][0]["id"], "bars");
        assert_eq!(json["metrics"][0]["value"], 3_292_679);
    }
}
