//! Dashboard selections and logical field names.

use crate::DashboardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time granularity of the rental counts shown on the dashboard.
///
/// The display form doubles as the column-name prefix ("Hourly Total Rentals").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    /// One observation per hour
    #[default]
    #[serde(alias = "Hourly")]
    Hourly,
    /// One observation per day
    #[serde(alias = "Daily")]
    Daily,
}

impl TimeFrame {
    /// All time frames in selector order.
    pub const ALL: [Self; 2] = [Self::Hourly, Self::Daily];

    /// Column-name prefix for this time frame.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Hourly => "Hourly",
            Self::Daily => "Daily",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for TimeFrame {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hourly" | "hour" => Ok(Self::Hourly),
            "daily" | "day" => Ok(Self::Daily),
            other => Err(DashboardError::validation_field(
                format!("unknown time frame '{other}', expected 'hourly' or 'daily'"),
                "time_frame",
            )),
        }
    }
}

/// The business question whose chart set the dashboard shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusinessQuestion {
    /// Which conditions drive the total number of rentals
    #[default]
    #[serde(rename = "rental-factors", alias = "Factors Influencing Total Rentals")]
    RentalFactors,
    /// How casual and registered users differ
    #[serde(rename = "user-patterns", alias = "Casual vs Registered User Patterns")]
    UserPatterns,
}

impl BusinessQuestion {
    /// All questions in selector order.
    pub const ALL: [Self; 2] = [Self::RentalFactors, Self::UserPatterns];

    /// Label shown in the selector.
    pub const fn label(self) -> &'static str {
        match self {
            Self::RentalFactors => "Factors Influencing Total Rentals",
            Self::UserPatterns => "Casual vs Registered User Patterns",
        }
    }

    /// Short identifier used in config files and on the command line.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::RentalFactors => "rental-factors",
            Self::UserPatterns => "user-patterns",
        }
    }
}

impl fmt::Display for BusinessQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BusinessQuestion {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|q| q.slug() == s || q.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                DashboardError::validation_field(
                    format!("unknown business question '{s}', expected 'rental-factors' or 'user-patterns'"),
                    "question",
                )
            })
    }
}

/// Semantic field names used instead of raw column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalField {
    /// Total rentals (casual + registered)
    TotalRentals,
    /// Rentals by casual users
    CasualUsers,
    /// Rentals by registered users
    RegisteredUsers,
    /// Weather situation category
    WeatherSituation,
    /// Temperature
    Temperature,
    /// Feels-like temperature
    FeelsLikeTemperature,
    /// Relative humidity
    Humidity,
    /// Wind speed
    Windspeed,
}

impl LogicalField {
    /// All logical fields.
    pub const ALL: [Self; 8] = [
        Self::TotalRentals,
        Self::CasualUsers,
        Self::RegisteredUsers,
        Self::WeatherSituation,
        Self::Temperature,
        Self::FeelsLikeTemperature,
        Self::Humidity,
        Self::Windspeed,
    ];

    /// Bare column name of the field.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TotalRentals => "Total Rentals",
            Self::CasualUsers => "Casual Users",
            Self::RegisteredUsers => "Registered Users",
            Self::WeatherSituation => "Weather Situation",
            Self::Temperature => "Temperature",
            Self::FeelsLikeTemperature => "Feels-like Temperature",
            Self::Humidity => "Humidity",
            Self::Windspeed => "Windspeed",
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
