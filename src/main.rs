use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use division_risk::config::AppConfig;
use division_risk::report::{self, FactorComparison};
use division_risk::{
    assessment_for_view, evaluate_scenario, DivisionRepository, ElectoralDivision, Factor,
    ProjectionYear, RiskAssessment, RiskLevel, ScenarioModifiers, ViewMode,
};

#[derive(Parser)]
#[command(name = "division-risk")]
#[command(about = "Electoral division risk explorer and scenario planner", long_about = None)]
struct Cli {
    /// JSON config file (defaults to ./division-risk.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV file of divisions to use instead of the built-in set
    #[arg(long, global = true)]
    divisions: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ViewArgs {
    /// Which baseline to show
    #[arg(long, value_enum, default_value_t = ViewMode::Current)]
    view: ViewMode,
    /// Projection year for the future view (2025, 2030, 2035, 2040, 2050)
    #[arg(long)]
    year: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every division with its score and level
    List {
        #[command(flatten)]
        selection: ViewArgs,
        #[arg(long)]
        json: bool,
    },
    /// Find divisions by name or county
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Show one division's factors and projected outlook
    Show {
        id: String,
        #[command(flatten)]
        selection: ViewArgs,
        #[arg(long)]
        json: bool,
    },
    /// Apply percentage changes to factors and recompute the score
    Scenario {
        id: String,
        #[command(flatten)]
        selection: ViewArgs,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dependency_ratio: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        hospital_stress: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        isolation_score: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        walkability: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        environmental_score: f64,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        selection: ViewArgs,
        /// Restrict the report to divisions matching this query
        #[arg(long, default_value = "")]
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct DivisionRow<'a> {
    id: &'a str,
    name: &'a str,
    county: &'a str,
    overall: u8,
    level: RiskLevel,
}

#[derive(Serialize)]
struct DivisionView<'a> {
    division: &'a ElectoralDivision,
    view: ViewMode,
    year: ProjectionYear,
    assessment: RiskAssessment,
    level: RiskLevel,
    outlook: Vec<FactorComparison>,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn division_rows<'a>(
    divisions: &[&'a ElectoralDivision],
    view: ViewMode,
    year: ProjectionYear,
) -> Vec<DivisionRow<'a>> {
    divisions
        .iter()
        .map(|division| {
            let assessment = assessment_for_view(division, view, year);
            DivisionRow {
                id: &division.id,
                name: &division.name,
                county: &division.county,
                overall: assessment.overall,
                level: assessment.level(),
            }
        })
        .collect()
}

fn print_rows(rows: &[DivisionRow<'_>]) {
    if rows.is_empty() {
        println!("No divisions match.");
        return;
    }
    for row in rows {
        println!(
            "- {} ({}, {}) score {} [{}]",
            row.name,
            row.id,
            row.county,
            row.overall,
            row.level.title()
        );
    }
}

fn print_factors(assessment: &RiskAssessment) {
    for factor in Factor::ALL {
        println!("  {}: {}", factor.label(), factor.value_in(&assessment.factors));
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;
    let repository = match cli.divisions.as_ref().or(config.divisions_csv.as_ref()) {
        Some(path) => DivisionRepository::from_csv_path(path)
            .with_context(|| format!("failed to load divisions from {}", path.display()))?,
        None => DivisionRepository::builtin(),
    };

    match cli.command {
        Commands::List { selection, json } => {
            let year = config.projection_year(selection.year.as_deref());
            let divisions = repository.search("");
            let rows = division_rows(&divisions, selection.view, year);
            if json {
                print_json(&rows)?;
            } else {
                print_rows(&rows);
            }
        }
        Commands::Search { query, json } => {
            let divisions = repository.search(&query);
            let rows = division_rows(&divisions, ViewMode::Current, ProjectionYear::default());
            if json {
                print_json(&rows)?;
            } else {
                print_rows(&rows);
            }
        }
        Commands::Show {
            id,
            selection,
            json,
        } => {
            let year = config.projection_year(selection.year.as_deref());
            let division = repository.get(&id)?;
            let assessment = assessment_for_view(division, selection.view, year);
            let details = DivisionView {
                division,
                view: selection.view,
                year,
                level: assessment.level(),
                assessment,
                outlook: report::compare_factors(division, year),
            };

            if json {
                return print_json(&details);
            }

            println!("{} ({}, pop. {})", division.name, division.county, division.population);
            println!(
                "Location {:.4}, {:.4}",
                division.coordinates.0, division.coordinates.1
            );
            let view_label = match selection.view {
                ViewMode::Current => "current".to_string(),
                ViewMode::Future => format!("projected {year}"),
            };
            println!(
                "Overall ({}): {} [{}]",
                view_label,
                details.assessment.overall,
                details.level.title()
            );
            print_factors(&details.assessment);
            println!("Outlook to {year}:");
            for comparison in &details.outlook {
                println!(
                    "  {}: {} -> {} ({:+})",
                    comparison.factor.label(),
                    comparison.current,
                    comparison.projected,
                    comparison.delta
                );
            }
        }
        Commands::Scenario {
            id,
            selection,
            dependency_ratio,
            hospital_stress,
            isolation_score,
            walkability,
            environmental_score,
            json,
        } => {
            let year = config.projection_year(selection.year.as_deref());
            let division = repository.get(&id)?;
            let requested = ScenarioModifiers {
                dependency_ratio_change: dependency_ratio,
                hospital_stress_change: hospital_stress,
                isolation_score_change: isolation_score,
                walkability_change: walkability,
                environmental_score_change: environmental_score,
            };
            requested.validate()?;

            let modifiers = requested.clamped_to_slider();
            if modifiers != requested {
                tracing::warn!(
                    min = ScenarioModifiers::SLIDER_MIN,
                    max = ScenarioModifiers::SLIDER_MAX,
                    "scenario changes clamped to planner range"
                );
            }

            let base = assessment_for_view(division, selection.view, year);
            let outcome = evaluate_scenario(&base, &modifiers);

            if json {
                return print_json(&outcome);
            }

            println!("Scenario for {}:", division.name);
            println!(
                "Original risk {} [{}] -> modified risk {} [{}] ({:+})",
                outcome.base.overall,
                outcome.base_level.title(),
                outcome.modified.overall,
                outcome.modified_level.title(),
                outcome.overall_delta
            );
            for change in &outcome.changes {
                println!(
                    "  {} ({:+}%): {} -> {}",
                    change.factor.label(),
                    modifiers.change_for(change.factor),
                    change.before,
                    change.after
                );
            }
        }
        Commands::Report {
            selection,
            query,
            limit,
            out,
        } => {
            let year = config.projection_year(selection.year.as_deref());
            let divisions = repository.search(&query);
            let markdown = report::build_report(
                &divisions,
                selection.view,
                year,
                chrono::Utc::now().date_naive(),
                limit.unwrap_or(config.report_limit),
            );
            std::fs::write(&out, markdown)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
