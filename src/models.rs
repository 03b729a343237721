use std::fmt;

use serde::Serialize;

use crate::error::EngineError;
use crate::risk::compute_overall_score;

/// Five sub-scores on a 0-100 scale. Walkability is the only protective factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskFactors {
    pub dependency_ratio: u8,
    pub hospital_stress: u8,
    pub isolation_score: u8,
    pub walkability: u8,
    pub environmental_score: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub overall: u8,
    pub factors: RiskFactors,
}

impl RiskAssessment {
    /// Builds an assessment whose overall score is derived from `factors`.
    pub fn derived(factors: RiskFactors) -> Self {
        Self {
            overall: compute_overall_score(&factors),
            factors,
        }
    }

    /// Fixture records carry a hand-authored overall that may predate the
    /// current weighting, so it is stored as given (capped at 100).
    pub fn baseline(overall: u8, factors: RiskFactors) -> Self {
        Self {
            overall: overall.min(100),
            factors,
        }
    }

    pub fn level(&self) -> RiskLevel {
        classify_risk(self.overall)
    }
}

/// Signed percentage deltas, one per factor. Zero means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScenarioModifiers {
    pub dependency_ratio_change: f64,
    pub hospital_stress_change: f64,
    pub isolation_score_change: f64,
    pub walkability_change: f64,
    pub environmental_score_change: f64,
}

impl ScenarioModifiers {
    pub const SLIDER_MIN: f64 = -50.0;
    pub const SLIDER_MAX: f64 = 50.0;

    pub fn is_identity(&self) -> bool {
        self.values().iter().all(|(_, value)| *value == 0.0)
    }

    pub fn change_for(&self, factor: Factor) -> f64 {
        match factor {
            Factor::DependencyRatio => self.dependency_ratio_change,
            Factor::HospitalStress => self.hospital_stress_change,
            Factor::IsolationScore => self.isolation_score_change,
            Factor::Walkability => self.walkability_change,
            Factor::EnvironmentalScore => self.environmental_score_change,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (factor, value) in self.values() {
            if !value.is_finite() {
                return Err(EngineError::InvalidModifier {
                    factor: factor.label(),
                    value,
                });
            }
        }
        Ok(())
    }

    /// Restricts every delta to the planner's slider range.
    pub fn clamped_to_slider(&self) -> Self {
        let clamp = |value: f64| value.clamp(Self::SLIDER_MIN, Self::SLIDER_MAX);
        Self {
            dependency_ratio_change: clamp(self.dependency_ratio_change),
            hospital_stress_change: clamp(self.hospital_stress_change),
            isolation_score_change: clamp(self.isolation_score_change),
            walkability_change: clamp(self.walkability_change),
            environmental_score_change: clamp(self.environmental_score_change),
        }
    }

    fn values(&self) -> [(Factor, f64); 5] {
        Factor::ALL.map(|factor| (factor, self.change_for(factor)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectoralDivision {
    pub id: String,
    pub name: String,
    pub county: String,
    pub population: u32,
    /// (lat, lng)
    pub coordinates: (f64, f64),
    pub current_risk: RiskAssessment,
    pub future_risk: RiskAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very-high",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an overall score to its level using half-open bands of width 25.
/// Callers pass an already clamped score.
pub fn classify_risk(score: u8) -> RiskLevel {
    match score {
        0..=24 => RiskLevel::Low,
        25..=49 => RiskLevel::Medium,
        50..=74 => RiskLevel::High,
        _ => RiskLevel::VeryHigh,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    DependencyRatio,
    HospitalStress,
    IsolationScore,
    Walkability,
    EnvironmentalScore,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::DependencyRatio,
        Factor::HospitalStress,
        Factor::IsolationScore,
        Factor::Walkability,
        Factor::EnvironmentalScore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Factor::DependencyRatio => "Dependency Ratio",
            Factor::HospitalStress => "Hospital Stress",
            Factor::IsolationScore => "Isolation Score",
            Factor::Walkability => "Walkability",
            Factor::EnvironmentalScore => "Environmental Score",
        }
    }

    /// Higher values lower the composite risk.
    pub fn is_protective(&self) -> bool {
        matches!(self, Factor::Walkability)
    }

    pub fn value_in(&self, factors: &RiskFactors) -> u8 {
        match self {
            Factor::DependencyRatio => factors.dependency_ratio,
            Factor::HospitalStress => factors.hospital_stress,
            Factor::IsolationScore => factors.isolation_score,
            Factor::Walkability => factors.walkability,
            Factor::EnvironmentalScore => factors.environmental_score,
        }
    }
}
