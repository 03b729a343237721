//! Time-horizon scaling of a division's future baseline.
//!
//! The future view starts from the stored `future_risk` record and scales each
//! factor by a fixed per-year multiplier. This is a lookup table, not a
//! forecast.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{ElectoralDivision, Factor, RiskAssessment, RiskFactors};
use crate::risk::to_score;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectionYear {
    #[serde(rename = "2025")]
    Y2025,
    #[default]
    #[serde(rename = "2030")]
    Y2030,
    #[serde(rename = "2035")]
    Y2035,
    #[serde(rename = "2040")]
    Y2040,
    #[serde(rename = "2050")]
    Y2050,
}

impl ProjectionYear {
    pub const ALL: [ProjectionYear; 5] = [
        ProjectionYear::Y2025,
        ProjectionYear::Y2030,
        ProjectionYear::Y2035,
        ProjectionYear::Y2040,
        ProjectionYear::Y2050,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            ProjectionYear::Y2025 => 1.05,
            ProjectionYear::Y2030 => 1.15,
            ProjectionYear::Y2035 => 1.25,
            ProjectionYear::Y2040 => 1.35,
            ProjectionYear::Y2050 => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionYear::Y2025 => "2025",
            ProjectionYear::Y2030 => "2030",
            ProjectionYear::Y2035 => "2035",
            ProjectionYear::Y2040 => "2040",
            ProjectionYear::Y2050 => "2050",
        }
    }

    /// Resolves a year label, falling back to 2030 for anything unrecognised.
    pub fn from_token(token: &str) -> Self {
        match token.trim().parse() {
            Ok(year) => year,
            Err(UnknownYear) => {
                tracing::debug!(token, "unrecognised projection year, using 2030");
                ProjectionYear::default()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownYear;

impl FromStr for ProjectionYear {
    type Err = UnknownYear;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectionYear::ALL
            .into_iter()
            .find(|year| year.as_str() == s)
            .ok_or(UnknownYear)
    }
}

impl fmt::Display for ProjectionYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Differential sensitivity of each factor to the time horizon.
pub fn horizon_sensitivity(factor: Factor) -> f64 {
    match factor {
        Factor::DependencyRatio => 1.0,
        Factor::HospitalStress => 0.9,
        Factor::IsolationScore => 1.1,
        Factor::Walkability => 0.95,
        Factor::EnvironmentalScore => 1.2,
    }
}

fn scale(factors: &RiskFactors, factor: Factor, year: ProjectionYear) -> u8 {
    let value = f64::from(factor.value_in(factors));
    to_score(value * year.factor() * horizon_sensitivity(factor))
}

/// Scales the future baseline to `year` and re-derives the overall score.
pub fn project_future_risk(future_baseline: &RiskAssessment, year: ProjectionYear) -> RiskAssessment {
    let factors = &future_baseline.factors;
    RiskAssessment::derived(RiskFactors {
        dependency_ratio: scale(factors, Factor::DependencyRatio, year),
        hospital_stress: scale(factors, Factor::HospitalStress, year),
        isolation_score: scale(factors, Factor::IsolationScore, year),
        walkability: scale(factors, Factor::Walkability, year),
        environmental_score: scale(factors, Factor::EnvironmentalScore, year),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Current,
    Future,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Current => f.write_str("current"),
            ViewMode::Future => f.write_str("future"),
        }
    }
}

/// The assessment a viewer sees for `division`: the stored current baseline,
/// or the future baseline projected to `year`.
pub fn assessment_for_view(
    division: &ElectoralDivision,
    view: ViewMode,
    year: ProjectionYear,
) -> RiskAssessment {
    match view {
        ViewMode::Current => division.current_risk.clone(),
        ViewMode::Future => project_future_risk(&division.future_risk, year),
    }
}
