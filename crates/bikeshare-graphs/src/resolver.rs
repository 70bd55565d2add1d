//! Maps logical field names onto the concrete columns of a dataset.

use crate::dataset::ColumnSchema;
use bikeshare_common::{LogicalField, TimeFrame};
use serde::Serialize;

/// Resolves `field` for `mode`: `"{mode} {field}"` when the schema has that
/// column, otherwise `field` unchanged.
///
/// The returned name is not guaranteed to exist; looking it up is the
/// caller's business.
pub fn resolve<S>(schema: &S, field: &str, mode: TimeFrame) -> String
where
    S: ColumnSchema + ?Sized,
{
    let candidate = format!("{} {field}", mode.prefix());
    if schema.has_column(&candidate) {
        candidate
    } else {
        field.to_string()
    }
}

/// Concrete column names of every logical field for one time frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    /// Time frame the names were resolved for
    pub time_frame: TimeFrame,
    /// Total Rentals
    pub total_rentals: String,
    /// Casual Users
    pub casual_users: String,
    /// Registered Users
    pub registered_users: String,
    /// Weather Situation
    pub weather_situation: String,
    /// Temperature
    pub temperature: String,
    /// Feels-like Temperature
    pub feels_like_temperature: String,
    /// Humidity
    pub humidity: String,
    /// Windspeed
    pub windspeed: String,
}

impl ResolvedColumns {
    /// Resolves all logical fields against `schema`.
    pub fn resolve<S>(schema: &S, time_frame: TimeFrame) -> Self
    where
        S: ColumnSchema + ?Sized,
    {
        let field = |f: LogicalField| resolve(schema, f.name(), time_frame);
        Self {
            time_frame,
            total_rentals: field(LogicalField::TotalRentals),
            casual_users: field(LogicalField::CasualUsers),
            registered_users: field(LogicalField::RegisteredUsers),
            weather_situation: field(LogicalField::WeatherSituation),
            temperature: field(LogicalField::Temperature),
            feels_like_temperature: field(LogicalField::FeelsLikeTemperature),
            humidity: field(LogicalField::Humidity),
            windspeed: field(LogicalField::Windspeed),
        }
    }

    /// Column name for a logical field.
    pub fn get(&self, field: LogicalField) -> &str {
        match field {
            LogicalField::TotalRentals => &self.total_rentals,
            LogicalField::CasualUsers => &self.casual_users,
            LogicalField::RegisteredUsers => &self.registered_users,
            LogicalField::WeatherSituation => &self.weather_situation,
            LogicalField::Temperature => &self.temperature,
            LogicalField::FeelsLikeTemperature => &self.feels_like_temperature,
            LogicalField::Humidity => &self.humidity,
            LogicalField::Windspeed => &self.windspeed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn schema(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_prefixed_name_preferred() {
        let names = schema(&["Hourly Total Rentals", "Total Rentals"]);
        assert_eq!(
            resolve(&names, "Total Rentals", TimeFrame::Hourly),
            "Hourly Total Rentals"
        );
    }

    #[test]
    fn test_bare_name_fallback() {
        let names = schema(&["Total Rentals"]);
        assert_eq!(
            resolve(&names, "Total Rentals", TimeFrame::Hourly),
            "Total Rentals"
        );
    }

    #[test]
    fn test_absent_field_returned_unchanged() {
        let names = schema(&[]);
        assert_eq!(resolve(&names, "Humidity", TimeFrame::Daily), "Humidity");
    }

    #[test]
    fn test_other_mode_prefix_ignored() {
        let names = schema(&["Daily Casual Users"]);
        assert_eq!(
            resolve(&names, "Casual Users", TimeFrame::Hourly),
            "Casual Users"
        );
    }

    #[test]
    fn test_resolved_columns() {
        let names = schema(&[
            "Daily Total Rentals",
            "Daily Casual Users",
            "Registered Users",
            "Temperature",
        ]);
        let resolved = ResolvedColumns::resolve(&names, TimeFrame::Daily);
        assert_eq!(resolved.total_rentals, "Daily Total Rentals");
        assert_eq!(resolved.casual_users, "Daily Casual Users");
        assert_eq!(resolved.registered_users, "Registered Users");
        assert_eq!(resolved.get(LogicalField::Temperature), "Temperature");
        for field in LogicalField::ALL {
            assert!(resolved.get(field).ends_with(field.name()));
        }
    }
}
