//! Maps the two dashboard controls onto the charts and metrics to show.

use crate::resolver::ResolvedColumns;
use crate::types::{
    Aggregation, ChartSpec, ColorRole, Encoding, Mark, MetricSpec, Placement, RowFilter, Series,
};
use bikeshare_common::{slugify, BusinessQuestion, TimeFrame};

/// Raw dataset columns that never carry a time frame prefix.
pub mod columns {
    /// Hour of day
    pub const HOUR: &str = "hr";
    /// Day name
    pub const WEEKDAY: &str = "Weekday";
    /// Season name
    pub const SEASON: &str = "Season";
    /// Holiday flag
    pub const HOLIDAY: &str = "Holiday";
    /// Working day flag
    pub const WORKING_DAY: &str = "Working Day";
    /// Month name
    pub const MONTH: &str = "Month";
}

/// Weekdays in tab order.
pub const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Bins of the rentals-by-hour histogram, one per hour.
pub const HOUR_BINS: usize = 24;

const CATEGORY_SECTION: &str = "Total Rentals by Category";
const WEEKDAY_SECTION: &str = "Hourly Rentals by Day of the Week";
const USER_WEEKDAY_SECTION: &str = "Average Number of Rentals per Hour for Each Day";
const USER_TYPE: &str = "User Type";

/// Heading shown under the page intro for a question, if any.
pub const fn question_heading(question: BusinessQuestion) -> Option<&'static str> {
    match question {
        BusinessQuestion::RentalFactors => None,
        BusinessQuestion::UserPatterns => Some("Casual vs Registered User Rental Patterns"),
    }
}

/// Ordered chart specs for a question and time frame.
///
/// Pure: the same inputs always give the same sequence.
pub fn select_view(
    question: BusinessQuestion,
    mode: TimeFrame,
    resolved: &ResolvedColumns,
) -> Vec<ChartSpec> {
    match question {
        BusinessQuestion::RentalFactors => rental_factor_charts(mode, resolved),
        BusinessQuestion::UserPatterns => user_pattern_charts(mode, resolved),
    }
}

/// "All-Time Statistics" callouts for a question and time frame.
pub fn select_metrics(
    question: BusinessQuestion,
    mode: TimeFrame,
    resolved: &ResolvedColumns,
) -> Vec<MetricSpec> {
    let metric = |label: &str, column: &str| MetricSpec {
        label: format!("{label} ({mode})"),
        column: column.to_string(),
    };
    match question {
        BusinessQuestion::RentalFactors => vec![metric("Total Rentals", &resolved.total_rentals)],
        BusinessQuestion::UserPatterns => vec![
            metric("Total Casual Users", &resolved.casual_users),
            metric("Total Registered Users", &resolved.registered_users),
        ],
    }
}

fn encoding(column: &str, title: &str) -> Encoding {
    Encoding {
        column: column.to_string(),
        title: title.to_string(),
    }
}

fn series(column: &str, label: &str, color: ColorRole) -> Series {
    Series {
        column: column.to_string(),
        label: label.to_string(),
        color,
    }
}

fn weekday_filter(day: &str) -> Option<RowFilter> {
    Some(RowFilter {
        column: columns::WEEKDAY.to_string(),
        equals: day.to_string(),
    })
}

fn rental_factor_charts(mode: TimeFrame, resolved: &ResolvedColumns) -> Vec<ChartSpec> {
    let total = resolved.total_rentals.as_str();
    let rentals = format!("Rentals ({mode})");

    let categories = [
        ("Weather", resolved.weather_situation.as_str()),
        ("Working Day", columns::WORKING_DAY),
        ("Season", columns::SEASON),
        ("Holiday", columns::HOLIDAY),
    ];

    let mut charts: Vec<ChartSpec> = categories
        .iter()
        .enumerate()
        .map(|(index, (title, column))| ChartSpec {
            id: format!("rentals-by-{}", slugify(title)),
            section: Some(CATEGORY_SECTION.to_string()),
            heading: (*title).to_string(),
            caption: None,
            placement: Placement::Column {
                index,
                of: categories.len(),
            },
            mark: Mark::Bar,
            x: encoding(column, title),
            y: vec![series(total, &rentals, ColorRole::Categorical)],
            y_title: rentals.clone(),
            color_by: None,
            legend_title: None,
            filter: None,
            aggregation: Aggregation::Mean,
            wide: false,
        })
        .collect();

    let streams = [
        ("Temperature", resolved.temperature.as_str()),
        ("Feels-like Temperature", resolved.feels_like_temperature.as_str()),
    ];
    charts.extend(streams.iter().enumerate().map(|(index, (title, column))| {
        ChartSpec {
            id: format!("rentals-vs-{}", slugify(title)),
            section: None,
            heading: format!("Total Rentals vs {title} ({mode}) with Season Variation"),
            caption: None,
            placement: Placement::Column {
                index,
                of: streams.len(),
            },
            mark: Mark::Stream,
            x: encoding(column, title),
            y: vec![series(
                total,
                &format!("Total Rentals ({mode})"),
                ColorRole::Categorical,
            )],
            y_title: format!("Total Rentals ({mode})"),
            color_by: Some(columns::SEASON.to_string()),
            legend_title: Some("Season".to_string()),
            filter: None,
            aggregation: Aggregation::Sum,
            wide: false,
        }
    }));

    if mode == TimeFrame::Hourly {
        charts.push(ChartSpec {
            id: "rentals-by-hour".to_string(),
            section: None,
            heading: "Total Rentals by Hour".to_string(),
            caption: None,
            placement: Placement::Centered,
            mark: Mark::Histogram,
            x: encoding(columns::HOUR, "Hour of Day"),
            y: vec![series(total, "Rentals (Hourly)", ColorRole::Primary)],
            y_title: "Rentals (Hourly)".to_string(),
            color_by: None,
            legend_title: None,
            filter: None,
            aggregation: Aggregation::WeightedHistogram { bins: HOUR_BINS },
            wide: true,
        });

        charts.extend(WEEKDAYS.iter().map(|day| ChartSpec {
            id: format!("rentals-on-{}", slugify(day)),
            section: Some(WEEKDAY_SECTION.to_string()),
            heading: format!("Rentals on {day}"),
            caption: Some(format!("Rentals on {day}")),
            placement: Placement::Tab {
                label: (*day).to_string(),
            },
            mark: Mark::Line,
            x: encoding(columns::HOUR, "Hour"),
            y: vec![series(total, "Rentals", ColorRole::Primary)],
            y_title: "Rentals".to_string(),
            color_by: None,
            legend_title: None,
            filter: weekday_filter(day),
            aggregation: Aggregation::Mean,
            wide: true,
        }));
    }

    charts
}

fn user_pattern_charts(mode: TimeFrame, resolved: &ResolvedColumns) -> Vec<ChartSpec> {
    let user_series = || {
        vec![
            series(&resolved.casual_users, "Casual", ColorRole::CompareFirst),
            series(&resolved.registered_users, "Registered", ColorRole::CompareSecond),
        ]
    };

    let comparisons = [
        (
            "Holidays vs Non-Holidays",
            "Average Number of Rentals on Holidays vs Non-Holidays",
            columns::HOLIDAY,
            "Day Type",
        ),
        (
            "Average Rentals by Season",
            "Average Number of Rentals by Season",
            columns::SEASON,
            "Season",
        ),
        (
            "Average Rentals by Month",
            "Average Number of Rentals by Month",
            columns::MONTH,
            "Month",
        ),
    ];

    let mut charts: Vec<ChartSpec> = comparisons
        .iter()
        .enumerate()
        .map(|(index, (heading, caption, column, title))| ChartSpec {
            id: format!("users-{}", slugify(heading)),
            section: None,
            heading: (*heading).to_string(),
            caption: Some((*caption).to_string()),
            placement: Placement::Column {
                index,
                of: comparisons.len(),
            },
            mark: Mark::StackedBar,
            x: encoding(column, title),
            y: user_series(),
            y_title: "Average Number of Rentals".to_string(),
            color_by: None,
            legend_title: Some(USER_TYPE.to_string()),
            filter: None,
            aggregation: Aggregation::Mean,
            wide: false,
        })
        .collect();

    if mode == TimeFrame::Hourly {
        charts.extend(WEEKDAYS.iter().map(|day| ChartSpec {
            id: format!("users-on-{}", slugify(day)),
            section: Some(USER_WEEKDAY_SECTION.to_string()),
            heading: format!("Hourly Rentals on {day}"),
            caption: Some(format!("Average Number of Rentals per Hour on {day}")),
            placement: Placement::Tab {
                label: (*day).to_string(),
            },
            mark: Mark::Line,
            x: encoding(columns::HOUR, "Hour"),
            y: user_series(),
            y_title: "Rentals".to_string(),
            color_by: None,
            legend_title: Some(USER_TYPE.to_string()),
            filter: weekday_filter(day),
            aggregation: Aggregation::Mean,
            wide: true,
        }));
    }

    charts
}
