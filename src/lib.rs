//! Risk scoring and scenario engine for electoral divisions.
//!
//! Divisions come from a static [`repository::DivisionRepository`]. A view
//! picks either the stored current baseline or a year-scaled projection of
//! the future baseline ([`projection`]). Scenario modifiers then perturb that
//! assessment ([`risk::apply_scenario`]), and [`models::classify_risk`] maps
//! the resulting score to a level.

pub mod config;
pub mod error;
pub mod models;
pub mod projection;
pub mod report;
pub mod repository;
pub mod risk;

pub use error::EngineError;
pub use models::{
    classify_risk, ElectoralDivision, Factor, RiskAssessment, RiskFactors, RiskLevel,
    ScenarioModifiers,
};
pub use projection::{assessment_for_view, project_future_risk, ProjectionYear, ViewMode};
pub use repository::DivisionRepository;
pub use risk::{apply_scenario, compute_overall_score, evaluate_scenario};
