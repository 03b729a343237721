use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{
    classify_risk, Factor, RiskAssessment, RiskFactors, RiskLevel, ScenarioModifiers,
};

/// Weights in basis points of the overall score. Walkability is weighted
/// after inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub dependency_ratio: u32,
    pub hospital_stress: u32,
    pub isolation_score: u32,
    pub inverted_walkability: u32,
    pub environmental_score: u32,
}

impl ScoreWeights {
    pub const fn total(&self) -> u32 {
        self.dependency_ratio
            + self.hospital_stress
            + self.isolation_score
            + self.inverted_walkability
            + self.environmental_score
    }

    pub fn for_factor(&self, factor: Factor) -> u32 {
        match factor {
            Factor::DependencyRatio => self.dependency_ratio,
            Factor::HospitalStress => self.hospital_stress,
            Factor::IsolationScore => self.isolation_score,
            Factor::Walkability => self.inverted_walkability,
            Factor::EnvironmentalScore => self.environmental_score,
        }
    }
}

const BASIS_POINTS: u32 = 10_000;

pub const SCORE_WEIGHTS: ScoreWeights = ScoreWeights {
    dependency_ratio: 2_500,
    hospital_stress: 3_000,
    isolation_score: 2_000,
    inverted_walkability: 1_000,
    environmental_score: 1_500,
};

const _: () = assert!(SCORE_WEIGHTS.total() == BASIS_POINTS);

/// Risk-neutral value used when an older record has no environmental score.
pub const DEFAULT_ENVIRONMENTAL_SCORE: u8 = 50;

/// Weighted blend of the five factors, rounded half-up and capped at 100.
///
/// The sum is carried in integer basis points so that scores landing exactly
/// on .5 always round the same way.
pub fn compute_overall_score(factors: &RiskFactors) -> u8 {
    let weighted: u32 = Factor::ALL
        .iter()
        .map(|factor| {
            let value = factor.value_in(factors).min(100);
            let contribution = if factor.is_protective() {
                100 - value
            } else {
                value
            };
            u32::from(contribution) * SCORE_WEIGHTS.for_factor(*factor)
        })
        .sum();

    let rounded = (weighted + BASIS_POINTS / 2) / BASIS_POINTS;
    rounded.min(100) as u8
}

/// Rounds a raw value onto the 0-100 integer scale. NaN collapses to 0.
pub fn to_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

/// Applies a signed percentage to a factor relative to its own value, so
/// -10% on 80 gives 72.
pub fn apply_modifier(value: u8, modifier_percentage: f64) -> u8 {
    let value = f64::from(value);
    to_score(value + value * (modifier_percentage / 100.0))
}

/// Applies scenario modifiers and re-derives the overall score. All-zero
/// modifiers return the base untouched, stored overall included.
pub fn apply_scenario(base: &RiskAssessment, modifiers: &ScenarioModifiers) -> RiskAssessment {
    if modifiers.is_identity() {
        tracing::trace!("scenario modifiers are all zero, keeping base assessment");
        return base.clone();
    }

    let factors = &base.factors;
    let modified = RiskFactors {
        dependency_ratio: apply_modifier(
            factors.dependency_ratio,
            modifiers.dependency_ratio_change,
        ),
        hospital_stress: apply_modifier(factors.hospital_stress, modifiers.hospital_stress_change),
        isolation_score: apply_modifier(factors.isolation_score, modifiers.isolation_score_change),
        walkability: apply_modifier(factors.walkability, modifiers.walkability_change),
        environmental_score: apply_modifier(
            factors.environmental_score,
            modifiers.environmental_score_change,
        ),
    };

    RiskAssessment::derived(modified)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactorChange {
    pub factor: Factor,
    pub before: u8,
    pub after: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub base: RiskAssessment,
    pub modified: RiskAssessment,
    pub base_level: RiskLevel,
    pub modified_level: RiskLevel,
    pub overall_delta: i16,
    pub changes: Vec<FactorChange>,
}

pub fn evaluate_scenario(base: &RiskAssessment, modifiers: &ScenarioModifiers) -> ScenarioOutcome {
    let modified = apply_scenario(base, modifiers);
    let changes = Factor::ALL
        .iter()
        .map(|factor| FactorChange {
            factor: *factor,
            before: factor.value_in(&base.factors),
            after: factor.value_in(&modified.factors),
        })
        .collect();

    ScenarioOutcome {
        base_level: classify_risk(base.overall),
        modified_level: classify_risk(modified.overall),
        overall_delta: i16::from(modified.overall) - i16::from(base.overall),
        base: base.clone(),
        modified,
        changes,
    }
}

/// Factor values as they arrive from fixture files, before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RawFactors {
    pub dependency_ratio: Option<f64>,
    pub hospital_stress: Option<f64>,
    pub isolation_score: Option<f64>,
    pub walkability: Option<f64>,
    pub environmental_score: Option<f64>,
}

impl RawFactors {
    pub fn normalize(&self) -> Result<RiskFactors, EngineError> {
        Ok(RiskFactors {
            dependency_ratio: required(Factor::DependencyRatio, self.dependency_ratio)?,
            hospital_stress: required(Factor::HospitalStress, self.hospital_stress)?,
            isolation_score: required(Factor::IsolationScore, self.isolation_score)?,
            walkability: required(Factor::Walkability, self.walkability)?,
            environmental_score: match self.environmental_score {
                Some(value) => finite(Factor::EnvironmentalScore, value)?,
                None => DEFAULT_ENVIRONMENTAL_SCORE,
            },
        })
    }
}

fn required(factor: Factor, value: Option<f64>) -> Result<u8, EngineError> {
    let value = value.ok_or(EngineError::MissingFactor {
        factor: factor.label(),
    })?;
    finite(factor, value)
}

fn finite(factor: Factor, value: f64) -> Result<u8, EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidFactor {
            factor: factor.label(),
            value,
        });
    }
    Ok(to_score(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dublin_central() -> RiskFactors {
        RiskFactors {
            dependency_ratio: 35,
            hospital_stress: 58,
            isolation_score: 22,
            walkability: 75,
            environmental_score: 45,
        }
    }

    #[test]
    fn overall_follows_weighted_blend() {
        assert_eq!(compute_overall_score(&dublin_central()), 40);
    }

    #[test]
    fn overall_extremes() {
        let worst = RiskFactors {
            dependency_ratio: 100,
            hospital_stress: 100,
            isolation_score: 100,
            walkability: 0,
            environmental_score: 100,
        };
        let best = RiskFactors {
            dependency_ratio: 0,
            hospital_stress: 0,
            isolation_score: 0,
            walkability: 100,
            environmental_score: 0,
        };
        assert_eq!(compute_overall_score(&worst), 100);
        assert_eq!(compute_overall_score(&best), 0);
    }

    #[test]
    fn half_points_round_up() {
        // 10 * 0.25 + 50 * 0.10 inverted = 2.5 + 5.0 = 7.5
        let factors = RiskFactors {
            dependency_ratio: 10,
            hospital_stress: 0,
            isolation_score: 0,
            walkability: 50,
            environmental_score: 0,
        };
        assert_eq!(compute_overall_score(&factors), 8);
    }

    #[test]
    fn modifier_is_relative_to_value() {
        assert_eq!(apply_modifier(80, -10.0), 72);
        assert_eq!(apply_modifier(58, 20.0), 70);
        assert_eq!(apply_modifier(90, 50.0), 100);
        assert_eq!(apply_modifier(40, -150.0), 0);
        assert_eq!(apply_modifier(0, 50.0), 0);
    }

    #[test]
    fn hospital_stress_scenario_recomputes_overall() {
        let base = RiskAssessment::derived(dublin_central());
        let modifiers = ScenarioModifiers {
            hospital_stress_change: 20.0,
            ..Default::default()
        };
        let modified = apply_scenario(&base, &modifiers);
        assert_eq!(modified.factors.hospital_stress, 70);
        assert_eq!(modified.factors.dependency_ratio, 35);
        assert_eq!(modified.overall, 43);
    }

    #[test]
    fn zero_modifiers_keep_authored_baseline() {
        let base = RiskAssessment::baseline(42, dublin_central());
        let result = apply_scenario(&base, &ScenarioModifiers::default());
        assert_eq!(result, base);
        assert_eq!(result.overall, 42);
    }

    #[test]
    fn non_zero_modifiers_rederive_overall_from_baseline() {
        let base = RiskAssessment::baseline(42, dublin_central());
        let modifiers = ScenarioModifiers {
            walkability_change: 0.0001,
            ..Default::default()
        };
        let result = apply_scenario(&base, &modifiers);
        assert_eq!(result.factors, base.factors);
        assert_eq!(result.overall, 40);
    }

    #[test]
    fn outcome_reports_levels_and_changes() {
        let base = RiskAssessment::derived(dublin_central());
        let modifiers = ScenarioModifiers {
            hospital_stress_change: 50.0,
            isolation_score_change: 50.0,
            walkability_change: -50.0,
            environmental_score_change: 50.0,
            dependency_ratio_change: 50.0,
        };
        let outcome = evaluate_scenario(&base, &modifiers);
        assert_eq!(outcome.base_level, RiskLevel::Medium);
        assert_eq!(outcome.modified_level, RiskLevel::High);
        assert_eq!(
            outcome.overall_delta,
            i16::from(outcome.modified.overall) - 40
        );
        let walk = outcome
            .changes
            .iter()
            .find(|change| change.factor == Factor::Walkability)
            .unwrap();
        assert_eq!((walk.before, walk.after), (75, 38));
    }

    #[test]
    fn missing_environmental_defaults_to_midpoint() {
        let raw = RawFactors {
            dependency_ratio: Some(30.0),
            hospital_stress: Some(48.0),
            isolation_score: Some(20.0),
            walkability: Some(65.0),
            environmental_score: None,
        };
        let factors = raw.normalize().unwrap();
        assert_eq!(factors.environmental_score, 50);
    }

    #[test]
    fn normalize_clamps_and_rejects_nan() {
        let raw = RawFactors {
            dependency_ratio: Some(130.0),
            hospital_stress: Some(-4.0),
            isolation_score: Some(20.4),
            walkability: Some(65.5),
            environmental_score: Some(10.0),
        };
        let factors = raw.normalize().unwrap();
        assert_eq!(factors.dependency_ratio, 100);
        assert_eq!(factors.hospital_stress, 0);
        assert_eq!(factors.isolation_score, 20);
        assert_eq!(factors.walkability, 66);

        let bad = RawFactors {
            hospital_stress: Some(f64::NAN),
            ..raw
        };
        assert!(matches!(
            bad.normalize(),
            Err(EngineError::InvalidFactor {
                factor: "Hospital Stress",
                ..
            })
        ));

        let missing = RawFactors {
            walkability: None,
            ..raw
        };
        assert!(matches!(
            missing.normalize(),
            Err(EngineError::MissingFactor {
                factor: "Walkability"
            })
        ));
    }

    fn factors_strategy() -> impl Strategy<Value = RiskFactors> {
        (0u8..=100, 0u8..=100, 0u8..=100, 0u8..=100, 0u8..=100).prop_map(
            |(dependency_ratio, hospital_stress, isolation_score, walkability, environmental_score)| {
                RiskFactors {
                    dependency_ratio,
                    hospital_stress,
                    isolation_score,
                    walkability,
                    environmental_score,
                }
            },
        )
    }

    fn modifiers_strategy() -> impl Strategy<Value = ScenarioModifiers> {
        let pct = || -200.0f64..200.0;
        (pct(), pct(), pct(), pct(), pct()).prop_map(|(d, h, i, w, e)| ScenarioModifiers {
            dependency_ratio_change: d,
            hospital_stress_change: h,
            isolation_score_change: i,
            walkability_change: w,
            environmental_score_change: e,
        })
    }

    proptest! {
        #[test]
        fn overall_is_deterministic_and_bounded(factors in factors_strategy()) {
            let first = compute_overall_score(&factors);
            prop_assert_eq!(first, compute_overall_score(&factors));
            prop_assert!(first <= 100);
        }

        #[test]
        fn scenario_output_stays_in_range(
            factors in factors_strategy(),
            modifiers in modifiers_strategy(),
        ) {
            let result = apply_scenario(&RiskAssessment::derived(factors), &modifiers);
            prop_assert!(result.overall <= 100);
            for factor in Factor::ALL {
                prop_assert!(factor.value_in(&result.factors) <= 100);
            }
            prop_assert_eq!(result.overall, compute_overall_score(&result.factors));
        }

        #[test]
        fn zero_modifiers_are_identity(factors in factors_strategy(), overall in 0u8..=100) {
            let base = RiskAssessment::baseline(overall, factors);
            prop_assert_eq!(apply_scenario(&base, &ScenarioModifiers::default()), base);
        }

        #[test]
        fn walkability_never_raises_risk(factors in factors_strategy(), bump in 0u8..=100) {
            let mut better = factors;
            better.walkability = factors.walkability.saturating_add(bump).min(100);
            prop_assert!(compute_overall_score(&better) <= compute_overall_score(&factors));
        }

        #[test]
        fn risk_factors_never_lower_risk(factors in factors_strategy(), bump in 0u8..=100) {
            let raise = |value: u8| value.saturating_add(bump).min(100);
            let variants = [
                RiskFactors { dependency_ratio: raise(factors.dependency_ratio), ..factors },
                RiskFactors { hospital_stress: raise(factors.hospital_stress), ..factors },
                RiskFactors { isolation_score: raise(factors.isolation_score), ..factors },
                RiskFactors { environmental_score: raise(factors.environmental_score), ..factors },
            ];
            let base = compute_overall_score(&factors);
            for worse in variants {
                prop_assert!(compute_overall_score(&worse) >= base);
            }
        }
    }
}
