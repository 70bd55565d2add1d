//! Test utilities and shared fixtures for the dashboard workspace.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! the unit and integration tests of the other workspace crates.

use std::sync::Once;

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        // Another test harness may already own the global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(feature = "testing")]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Write `contents` to a named temporary file with the given extension.
#[cfg(feature = "testing")]
pub fn write_temp_file(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temporary file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temporary file");
    file
}

/// Sample bike sharing data for dataset, aggregation and pipeline tests.
pub mod dataset_fixtures {
    /// Weekdays in the order the dashboard shows them.
    pub const WEEKDAYS: [&str; 7] = [
        "Sunday",
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];

    /// The three-row table used to check per-group means.
    pub fn holiday_csv() -> &'static str {
        "Holiday,Casual\nNo,10\nNo,30\nYes,5\n"
    }

    /// Generate an hourly dataset covering every weekday with four hours each.
    ///
    /// Both the prefixed (`Hourly ...`, `Daily ...`) and bare outcome columns
    /// are present; casual and registered counts always add up to the total.
    pub fn hourly_csv() -> String {
        let seasons = ["Spring", "Summer", "Fall", "Winter"];
        let weathers = ["Clear", "Mist", "Light Snow/Rain"];
        let months = ["Jan", "Apr", "Jul", "Oct"];

        let mut csv = String::from(
            "hr,Weekday,Season,Holiday,Working Day,Month,Weather Situation,\
             Temperature,Feels-like Temperature,Humidity,Windspeed,\
             Hourly Total Rentals,Hourly Casual Users,Hourly Registered Users,\
             Daily Total Rentals,Daily Casual Users,Daily Registered Users,\
             Total Rentals\n",
        );

        for (day_idx, day) in WEEKDAYS.iter().enumerate() {
            let holiday = if day_idx == 1 { "Yes" } else { "No" };
            let working = if day_idx == 0 || day_idx == 6 || day_idx == 1 {
                "No"
            } else {
                "Yes"
            };
            for (slot, hr) in [0u32, 8, 12, 18].iter().enumerate() {
                let season = seasons[(day_idx + slot) % seasons.len()];
                let weather = weathers[(day_idx + slot) % weathers.len()];
                let month = months[day_idx % months.len()];
                let temp = 10.0 + f64::from(*hr) / 2.0;
                let atemp = temp - 1.5;
                let casual = 5 + (day_idx as u32) * 2 + hr;
                let registered = 20 + hr * 3;
                let total = casual + registered;
                let daily_casual = casual * 10;
                let daily_registered = registered * 10;
                let daily_total = daily_casual + daily_registered;
                csv.push_str(&format!(
                    "{hr},{day},{season},{holiday},{working},{month},{weather},\
                     {temp},{atemp},0.{humidity},0.{wind},\
                     {total},{casual},{registered},\
                     {daily_total},{daily_casual},{daily_registered},{total}\n",
                    humidity = 40 + slot * 10,
                    wind = 10 + slot * 5,
                ));
            }
        }
        csv
    }

    /// Number of rows produced by [`hourly_csv`].
    pub const HOURLY_ROWS: usize = 28;
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "testing")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for plausible column names (letters, digits, spaces, dashes).
    pub fn column_name_strategy() -> impl Strategy<Value = String> {
        r"[A-Za-z][A-Za-z0-9 \-]{0,24}".prop_map(|s| s.trim_end().to_string())
    }

    /// Strategy for small categorical key/value rows.
    pub fn keyed_rows_strategy() -> impl Strategy<Value = Vec<(String, f64)>> {
        prop::collection::vec(("[A-E]", -1000.0f64..1000.0), 1..60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_multiple_calls() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_assert_approx_eq() {
        assert_approx_eq(1.0, 1.0001, 0.001);
        assert_approx_eq(1.0, 0.9999, 0.001);
    }

    #[test]
    #[should_panic]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq(1.0, 1.1, 0.05);
    }

    #[test]
    fn test_hourly_fixture_shape() {
        let csv = dataset_fixtures::hourly_csv();
        let mut lines = csv.lines();
        let header_fields = lines.next().unwrap().split(',').count();
        let rows: Vec<_> = lines.collect();
        assert_eq!(rows.len(), dataset_fixtures::HOURLY_ROWS);
        assert!(rows.iter().all(|r| r.split(',').count() == header_fields));
    }
}
