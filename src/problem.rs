use std::{collections::BTreeSet, fmt, ops::RangeInclusive, str::FromStr};

use anyhow::{anyhow, bail, Result};
use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The highest value a potential score can take.
pub(crate) const MAX_POTENTIAL_SCORE: u8 = 100;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize)]
pub(crate) enum Sector {
    #[serde(rename = "Tecnología")]
    Technology,
    #[serde(rename = "Salud")]
    Health,
    #[serde(rename = "Educación")]
    Education,
    #[serde(rename = "Finanzas")]
    Finance,
    #[serde(rename = "Medio Ambiente")]
    Environment,
    #[serde(rename = "Agricultura")]
    Agriculture,
    #[serde(rename = "Transporte")]
    Transport,
    #[serde(rename = "Social")]
    Social,
}

impl Sector {
    pub(crate) const ALL: [Sector; 8] = [
        Self::Technology,
        Self::Health,
        Self::Education,
        Self::Finance,
        Self::Environment,
        Self::Agriculture,
        Self::Transport,
        Self::Social,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Technology => "Tecnología",
            Self::Health => "Salud",
            Self::Education => "Educación",
            Self::Finance => "Finanzas",
            Self::Environment => "Medio Ambiente",
            Self::Agriculture => "Agricultura",
            Self::Transport => "Transporte",
            Self::Social => "Social",
        }
    }

    /// The fixed set of subcategories a record of this sector may carry.
    pub(crate) fn subcategories(self) -> &'static [&'static str] {
        match self {
            Self::Technology => &[
                "Inteligencia Artificial",
                "Desarrollo de Software",
                "Ciberseguridad",
                "Comercio Electrónico",
            ],
            Self::Health => &["Telemedicina", "Salud Mental", "Nutrición", "Bienestar"],
            Self::Education => &[
                "Educación en Línea",
                "Formación Profesional",
                "Educación Infantil",
            ],
            Self::Finance => &["Fintech", "Inclusión Financiera", "Seguros"],
            Self::Environment => &["Energías Renovables", "Reciclaje", "Agua"],
            Self::Agriculture => &[
                "Agricultura Sostenible",
                "Cadena de Suministro",
                "Agrotecnología",
            ],
            Self::Transport => &["Movilidad Urbana", "Logística"],
            Self::Social => &["Vivienda", "Empleo", "Inclusión Social"],
        }
    }

    pub(crate) fn has_subcategory(self, subcategory: &str) -> bool {
        self.subcategories().contains(&subcategory)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|sector| sector.label() == s)
            .ok_or_else(|| anyhow!("unknown sector: {s}"))
    }
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
pub(crate) enum ImpactLevel {
    #[serde(rename = "Bajo")]
    Low,
    #[serde(rename = "Medio")]
    Medium,
    #[serde(rename = "Alto")]
    High,
    #[serde(rename = "Muy alto")]
    VeryHigh,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
pub(crate) enum UrgencyLevel {
    #[serde(rename = "Baja")]
    Low,
    #[serde(rename = "Media")]
    Medium,
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Muy alta")]
    VeryHigh,
}

/// Potential-score buckets shown in the advanced filter panel.
///
/// The bounds are product rules and deliberately uneven. Each bucket is closed
/// on both ends and together they cover 0 to 100 without overlap.
#[derive(Enum, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Deserialize, Serialize)]
pub(crate) enum PotentialRange {
    #[serde(rename = "0-25%")]
    Low,
    #[serde(rename = "26-49%")]
    Fair,
    #[serde(rename = "50-75%")]
    Good,
    #[serde(rename = "76-84%")]
    High,
    #[serde(rename = "85-100%")]
    Top,
}

impl PotentialRange {
    pub(crate) const ALL: [PotentialRange; 5] =
        [Self::Low, Self::Fair, Self::Good, Self::High, Self::Top];

    pub(crate) fn bounds(self) -> RangeInclusive<u8> {
        match self {
            Self::Low => 0..=25,
            Self::Fair => 26..=49,
            Self::Good => 50..=75,
            Self::High => 76..=84,
            Self::Top => 85..=MAX_POTENTIAL_SCORE,
        }
    }

    pub(crate) fn contains(self, score: u8) -> bool {
        self.bounds().contains(&score)
    }

    /// Returns the bucket holding `score`, or `None` if it is above 100.
    pub(crate) fn classify(score: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|range| range.contains(score))
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Low => "0-25%",
            Self::Fair => "26-49%",
            Self::Good => "50-75%",
            Self::High => "76-84%",
            Self::Top => "85-100%",
        }
    }
}

impl fmt::Display for PotentialRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PotentialRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|range| range.label() == s)
            .ok_or_else(|| anyhow!("unknown potential range: {s}"))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct ProblemRecord {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) sector: Sector,
    #[serde(default)]
    pub(crate) subcategory: Option<String>,
    #[serde(default)]
    pub(crate) tags: BTreeSet<String>,
    pub(crate) impact: ImpactLevel,
    pub(crate) urgency: UrgencyLevel,
    pub(crate) potential_score: u8,
    pub(crate) country: String,
    pub(crate) continent: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl ProblemRecord {
    /// Checks the invariants a stored record must hold.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            bail!("problem id must not be empty");
        }
        if self.potential_score > MAX_POTENTIAL_SCORE {
            bail!(
                "potential score of {} is {}, above {MAX_POTENTIAL_SCORE}",
                self.id,
                self.potential_score
            );
        }
        if let Some(subcategory) = &self.subcategory {
            if !self.sector.has_subcategory(subcategory) {
                bail!(
                    "subcategory \"{subcategory}\" of {} does not belong to sector {}",
                    self.id,
                    self.sector
                );
            }
        }
        Ok(())
    }

    pub(crate) fn potential_range(&self) -> Option<PotentialRange> {
        PotentialRange::classify(self.potential_score)
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str, sector: Sector, potential_score: u8) -> ProblemRecord {
    ProblemRecord {
        id: id.to_string(),
        title: format!("Problem {id}"),
        description: String::new(),
        sector,
        subcategory: None,
        tags: BTreeSet::new(),
        impact: ImpactLevel::Medium,
        urgency: UrgencyLevel::Medium,
        potential_score,
        country: "México".to_string(),
        continent: "América".to_string(),
        created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
    }
}
