use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{classify_risk, ElectoralDivision, Factor, RiskLevel};
use crate::projection::{assessment_for_view, project_future_risk, ProjectionYear, ViewMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSummary {
    pub level: RiskLevel,
    pub count: usize,
    pub avg_overall: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FactorComparison {
    pub factor: Factor,
    pub current: u8,
    pub projected: u8,
    pub delta: i16,
}

/// Division counts per risk level for the chosen view, most severe first.
pub fn summarize_by_level(
    divisions: &[&ElectoralDivision],
    view: ViewMode,
    year: ProjectionYear,
) -> Vec<LevelSummary> {
    let mut totals = [(0usize, 0u32); 4];

    for division in divisions {
        let overall = assessment_for_view(division, view, year).overall;
        let slot = &mut totals[classify_risk(overall) as usize];
        slot.0 += 1;
        slot.1 += u32::from(overall);
    }

    RiskLevel::ALL
        .iter()
        .rev()
        .filter_map(|level| {
            let (count, total) = totals[*level as usize];
            (count > 0).then(|| LevelSummary {
                level: *level,
                count,
                avg_overall: f64::from(total) / count as f64,
            })
        })
        .collect()
}

/// Current baseline against the projection for `year`, factor by factor.
pub fn compare_factors(division: &ElectoralDivision, year: ProjectionYear) -> Vec<FactorComparison> {
    let projected = project_future_risk(&division.future_risk, year);

    Factor::ALL
        .iter()
        .map(|factor| {
            let current = factor.value_in(&division.current_risk.factors);
            let future = factor.value_in(&projected.factors);
            FactorComparison {
                factor: *factor,
                current,
                projected: future,
                delta: i16::from(future) - i16::from(current),
            }
        })
        .collect()
}

pub fn build_report(
    divisions: &[&ElectoralDivision],
    view: ViewMode,
    year: ProjectionYear,
    generated_on: NaiveDate,
    limit: usize,
) -> String {
    let summaries = summarize_by_level(divisions, view, year);

    let mut ranked: Vec<(&ElectoralDivision, u8)> = divisions
        .iter()
        .map(|division| (*division, assessment_for_view(division, view, year).overall))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut output = String::new();
    let view_label = match view {
        ViewMode::Current => "current baseline".to_string(),
        ViewMode::Future => format!("{year} projection"),
    };

    let _ = writeln!(output, "# Division Risk Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} divisions ({})",
        generated_on,
        divisions.len(),
        view_label
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Level Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No divisions selected.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} divisions (avg score {:.1})",
                summary.level.title(),
                summary.count,
                summary.avg_overall
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Divisions");

    if ranked.is_empty() {
        let _ = writeln!(output, "No divisions selected.");
    } else {
        for (division, overall) in ranked.iter().take(limit) {
            let _ = writeln!(
                output,
                "- {} ({}, pop. {}) score {} [{}]",
                division.name,
                division.county,
                division.population,
                overall,
                classify_risk(*overall).title()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Factor Outlook to {year}");

    if ranked.is_empty() {
        let _ = writeln!(output, "No divisions selected.");
    } else {
        for (division, _) in ranked.iter().take(limit.min(3)) {
            let _ = writeln!(output, "### {}", division.name);
            for comparison in compare_factors(division, year) {
                let _ = writeln!(
                    output,
                    "- {}: {} -> {} ({:+})",
                    comparison.factor.label(),
                    comparison.current,
                    comparison.projected,
                    comparison.delta
                );
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DivisionRepository;

    #[test]
    fn level_mix_counts_every_division() {
        let repository = DivisionRepository::builtin();
        let divisions = repository.search("");
        let summaries = summarize_by_level(&divisions, ViewMode::Current, ProjectionYear::Y2030);

        let total: usize = summaries.iter().map(|summary| summary.count).sum();
        assert_eq!(total, divisions.len());
        assert!(summaries.windows(2).all(|pair| pair[0].level > pair[1].level));
    }

    #[test]
    fn current_view_uses_stored_baselines() {
        let repository = DivisionRepository::builtin();
        let divisions = repository.search("donegal");
        let summaries = summarize_by_level(&divisions, ViewMode::Current, ProjectionYear::Y2030);
        assert_eq!(
            summaries,
            vec![LevelSummary {
                level: RiskLevel::High,
                count: 1,
                avg_overall: 72.0,
            }]
        );
    }

    #[test]
    fn factor_comparison_against_projection() {
        let repository = DivisionRepository::builtin();
        let division = repository.find("dublin-central").unwrap();
        let comparisons = compare_factors(division, ProjectionYear::Y2030);
        assert_eq!(comparisons.len(), 5);
        assert_eq!(
            comparisons[0],
            FactorComparison {
                factor: Factor::DependencyRatio,
                current: 35,
                projected: 52,
                delta: 17,
            }
        );
    }

    #[test]
    fn report_lists_sections() {
        let repository = DivisionRepository::builtin();
        let divisions = repository.search("dublin");
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(&divisions, ViewMode::Future, ProjectionYear::Y2040, date, 10);

        assert!(report.contains("Generated on 2026-02-02 for 2 divisions (2040 projection)"));
        assert!(report.contains("## Risk Level Mix"));
        assert!(report.contains("- Dublin Central (Dublin, pop. 125000)"));
        assert!(report.contains("### Dublin North"));
        assert!(report.contains("Environmental Score"));
    }

    #[test]
    fn empty_selection_reports_placeholders() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let report = build_report(&[], ViewMode::Current, ProjectionYear::Y2030, date, 10);
        assert!(report.contains("No divisions selected."));
    }
}
