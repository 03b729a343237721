use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::EngineError;
use crate::models::{ElectoralDivision, RiskAssessment, RiskFactors};
use crate::risk::{to_score, RawFactors};

/// Read-only set of divisions, loaded once and kept in insertion order.
#[derive(Debug, Clone)]
pub struct DivisionRepository {
    divisions: Vec<ElectoralDivision>,
}

type Baseline = (u8, [u8; 5]);

fn baseline(
    (overall, [dependency, hospital, isolation, walkability, environmental]): Baseline,
) -> RiskAssessment {
    RiskAssessment::baseline(
        overall,
        RiskFactors {
            dependency_ratio: dependency,
            hospital_stress: hospital,
            isolation_score: isolation,
            walkability,
            environmental_score: environmental,
        },
    )
}

impl DivisionRepository {
    /// Builds a repository, rejecting repeated ids.
    pub fn new(divisions: Vec<ElectoralDivision>) -> Result<Self, EngineError> {
        let mut seen = HashSet::new();
        for division in &divisions {
            if !seen.insert(division.id.as_str()) {
                return Err(EngineError::DuplicateDivision(division.id.clone()));
            }
        }
        Ok(Self { divisions })
    }

    /// The hand-authored fixture set. Stored overall scores were authored
    /// under an earlier weighting and are kept as reference values.
    pub fn builtin() -> Self {
        #[rustfmt::skip]
        let rows: Vec<(&str, &str, &str, u32, (f64, f64), Baseline, Baseline)> = vec![
            ("dublin-central", "Dublin Central", "Dublin", 125_000, (53.3498, -6.2603), (42, [35, 58, 22, 75, 45]), (52, [45, 63, 30, 70, 55])),
            ("dublin-north", "Dublin North", "Dublin", 118_000, (53.4017, -6.3178), (35, [30, 48, 20, 65, 38]), (45, [40, 55, 28, 60, 48])),
            ("cork-south-central", "Cork South-Central", "Cork", 105_000, (51.8979, -8.4706), (55, [48, 62, 40, 65, 58]), (68, [57, 70, 52, 60, 72])),
            ("galway-west", "Galway West", "Galway", 92_000, (53.2707, -9.0568), (48, [44, 52, 38, 58, 43]), (57, [52, 60, 45, 52, 55])),
            ("limerick-city", "Limerick City", "Limerick", 85_000, (52.6638, -8.6267), (62, [56, 68, 45, 60, 64]), (72, [65, 75, 55, 55, 76])),
            ("donegal", "Donegal", "Donegal", 68_000, (54.9549, -7.7348), (72, [65, 75, 80, 45, 78]), (80, [72, 82, 85, 40, 85])),
            ("kerry", "Kerry", "Kerry", 72_000, (52.1543, -9.5669), (58, [60, 55, 70, 42, 63]), (65, [67, 62, 75, 38, 68])),
            ("meath-east", "Meath East", "Meath", 65_000, (53.6123, -6.6102), (40, [42, 50, 35, 52, 47]), (48, [48, 58, 42, 48, 54])),
            ("waterford", "Waterford", "Waterford", 78_000, (52.2593, -7.1128), (53, [50, 58, 42, 55, 51]), (62, [57, 65, 49, 50, 61])),
            ("sligo-leitrim", "Sligo-Leitrim", "Sligo", 63_000, (54.2766, -8.4761), (58, [54, 60, 65, 48, 45]), (67, [62, 68, 72, 45, 52])),
            ("wexford", "Wexford", "Wexford", 70_000, (52.3369, -6.4633), (51, [47, 54, 58, 52, 48]), (60, [55, 62, 65, 48, 57])),
            ("clare", "Clare", "Clare", 76_000, (52.9112, -8.9194), (47, [45, 42, 53, 49, 40]), (56, [52, 48, 61, 45, 47])),
            ("laois-offaly", "Laois-Offaly", "Laois", 84_000, (53.0329, -7.3021), (45, [40, 43, 50, 47, 42]), (53, [46, 51, 56, 42, 51])),
            ("kilkenny", "Kilkenny", "Kilkenny", 64_000, (52.6477, -7.2561), (39, [37, 41, 45, 54, 32]), (48, [44, 48, 52, 50, 39])),
            ("tipperary", "Tipperary", "Tipperary", 81_000, (52.4738, -8.1565), (56, [51, 47, 63, 41, 55]), (65, [58, 54, 70, 38, 61])),
        ];

        let divisions = rows
            .into_iter()
            .map(|(id, name, county, population, coordinates, current, future)| ElectoralDivision {
                id: id.to_string(),
                name: name.to_string(),
                county: county.to_string(),
                population,
                coordinates,
                current_risk: baseline(current),
                future_risk: baseline(future),
            })
            .collect();

        Self { divisions }
    }

    pub fn list_divisions(&self) -> &[ElectoralDivision] {
        &self.divisions
    }

    /// Case-insensitive substring match on name or county. A blank query
    /// returns every division.
    pub fn search(&self, query: &str) -> Vec<&ElectoralDivision> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.divisions.iter().collect();
        }

        self.divisions
            .iter()
            .filter(|division| {
                division.name.to_lowercase().contains(&needle)
                    || division.county.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<&ElectoralDivision> {
        self.divisions.iter().find(|division| division.id == id)
    }

    pub fn get(&self, id: &str) -> Result<&ElectoralDivision, EngineError> {
        self.find(id)
            .ok_or_else(|| EngineError::UnknownDivision(id.to_string()))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, EngineError> {
        let file = std::fs::File::open(path)?;
        let repository = Self::from_csv_reader(file)?;
        tracing::info!(
            path = %path.display(),
            divisions = repository.divisions.len(),
            "loaded division fixtures"
        );
        Ok(repository)
    }

    /// Reads one division per row. Environmental scores and stored overall
    /// scores are optional; a missing overall is derived from the factors.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, EngineError> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            id: String,
            name: String,
            county: String,
            population: u32,
            lat: f64,
            lng: f64,
            current_overall: Option<f64>,
            current_dependency_ratio: Option<f64>,
            current_hospital_stress: Option<f64>,
            current_isolation_score: Option<f64>,
            current_walkability: Option<f64>,
            current_environmental_score: Option<f64>,
            future_overall: Option<f64>,
            future_dependency_ratio: Option<f64>,
            future_hospital_stress: Option<f64>,
            future_isolation_score: Option<f64>,
            future_walkability: Option<f64>,
            future_environmental_score: Option<f64>,
        }

        fn assessment(
            overall: Option<f64>,
            raw: RawFactors,
        ) -> Result<RiskAssessment, EngineError> {
            let factors = raw.normalize()?;
            match overall {
                Some(value) if value.is_finite() => {
                    Ok(RiskAssessment::baseline(to_score(value), factors))
                }
                Some(value) => Err(EngineError::InvalidFactor {
                    factor: "Overall",
                    value,
                }),
                None => Ok(RiskAssessment::derived(factors)),
            }
        }

        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut divisions = Vec::new();

        for result in csv_reader.deserialize::<CsvRow>() {
            let row = result?;
            let current_risk = assessment(
                row.current_overall,
                RawFactors {
                    dependency_ratio: row.current_dependency_ratio,
                    hospital_stress: row.current_hospital_stress,
                    isolation_score: row.current_isolation_score,
                    walkability: row.current_walkability,
                    environmental_score: row.current_environmental_score,
                },
            )?;
            let future_risk = assessment(
                row.future_overall,
                RawFactors {
                    dependency_ratio: row.future_dependency_ratio,
                    hospital_stress: row.future_hospital_stress,
                    isolation_score: row.future_isolation_score,
                    walkability: row.future_walkability,
                    environmental_score: row.future_environmental_score,
                },
            )?;

            divisions.push(ElectoralDivision {
                id: row.id,
                name: row.name,
                county: row.county,
                population: row.population,
                coordinates: (row.lat, row.lng),
                current_risk,
                future_risk,
            });
        }

        Self::new(divisions)
    }
}

impl Default for DivisionRepository {
    fn default() -> Self {
        Self::builtin()
    }
}
