//! Predicate composition over problem records.
//!
//! A [`FilterCriteria`] narrows a collection in stages: free text, sector,
//! subcategory, then the extended panel (impact, urgency, potential range,
//! country, continent). All stages are AND-ed, so their order never changes
//! the result. `None` on any dimension means "all".

use tracing::debug;

use crate::problem::{ImpactLevel, PotentialRange, ProblemRecord, Sector, UrgencyLevel};

/// The advanced filter panel. Only consulted while the panel is applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExtendedFilters {
    pub(crate) impact: Option<ImpactLevel>,
    pub(crate) urgency: Option<UrgencyLevel>,
    pub(crate) potential: Option<PotentialRange>,
    pub(crate) country: Option<String>,
    pub(crate) continent: Option<String>,
}

impl ExtendedFilters {
    fn matches(&self, record: &ProblemRecord) -> bool {
        self.impact.is_none_or(|impact| record.impact == impact)
            && self.urgency.is_none_or(|urgency| record.urgency == urgency)
            && self
                .potential
                .is_none_or(|range| range.contains(record.potential_score))
            && self
                .country
                .as_ref()
                .is_none_or(|country| record.country == *country)
            && self
                .continent
                .as_ref()
                .is_none_or(|continent| record.continent == *continent)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FilterPhase {
    /// Plain sector/subcategory browsing, optionally with a text query.
    Browsing,
    /// The extended panel has been applied.
    Filtering,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct FilterCriteria {
    pub(crate) query: String,
    pub(crate) sector: Option<Sector>,
    /// Ignored unless `sector` is set.
    pub(crate) subcategory: Option<String>,
    pub(crate) extended: ExtendedFilters,
    /// Whether `extended` takes part in matching. Stale panel values stay
    /// stored but do not narrow plain browsing.
    pub(crate) extended_active: bool,
}

impl FilterCriteria {
    pub(crate) fn phase(&self) -> FilterPhase {
        if self.extended_active {
            FilterPhase::Filtering
        } else {
            FilterPhase::Browsing
        }
    }

    /// Replaces the text query. Typing always drops back to basic filtering.
    pub(crate) fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.extended_active = false;
    }

    /// Selects a sector, or all sectors with `None`.
    ///
    /// The subcategory is reset either way. Going back to all sectors also
    /// leaves the extended panel.
    pub(crate) fn select_sector(&mut self, sector: Option<Sector>) {
        self.sector = sector;
        self.subcategory = None;
        if sector.is_none() {
            self.extended_active = false;
        }
    }

    pub(crate) fn select_subcategory(&mut self, subcategory: Option<String>) {
        self.subcategory = subcategory;
    }

    pub(crate) fn apply_extended(&mut self, extended: ExtendedFilters) {
        self.extended = extended;
        self.extended_active = true;
    }

    /// Restores every dimension to "all" and the query to empty.
    #[cfg(test)]
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn matches(&self, record: &ProblemRecord) -> bool {
        self.matches_text(record)
            && self.sector.is_none_or(|sector| record.sector == sector)
            && self.matches_subcategory(record)
            && (!self.extended_active || self.extended.matches(record))
    }

    fn matches_text(&self, record: &ProblemRecord) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let query = self.query.to_lowercase();
        record.title.to_lowercase().contains(&query)
            || record.description.to_lowercase().contains(&query)
            || record
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }

    fn matches_subcategory(&self, record: &ProblemRecord) -> bool {
        if self.sector.is_none() {
            return true;
        }
        self.subcategory
            .as_deref()
            .is_none_or(|subcategory| record.subcategory.as_deref() == Some(subcategory))
    }
}

/// Returns the records satisfying `criteria`, in their original order.
pub(crate) fn apply(records: &[ProblemRecord], criteria: &FilterCriteria) -> Vec<ProblemRecord> {
    let filtered: Vec<ProblemRecord> = records
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect();
    debug!(
        "{} of {} problems match ({:?})",
        filtered.len(),
        records.len(),
        criteria.phase()
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::sample_record;

    fn records() -> Vec<ProblemRecord> {
        let mut tech = sample_record("1", Sector::Technology, 78);
        tech.title = "Clasificador de residuos con visión".to_string();
        tech.subcategory = Some("Inteligencia Artificial".to_string());
        tech.tags = ["IA".to_string(), "Reciclaje".to_string()].into();
        tech.impact = ImpactLevel::High;
        tech.urgency = UrgencyLevel::VeryHigh;
        tech.country = "Chile".to_string();

        let mut health = sample_record("2", Sector::Health, 30);
        health.title = "Citas médicas rurales".to_string();
        health.description = "Acceso a la salud en zonas remotas".to_string();
        health.subcategory = Some("Telemedicina".to_string());
        health.tags = ["Salud Rural".to_string()].into();

        let mut cyber = sample_record("3", Sector::Technology, 90);
        cyber.title = "Fraude en pagos móviles".to_string();
        cyber.subcategory = Some("Ciberseguridad".to_string());
        cyber.impact = ImpactLevel::VeryHigh;
        cyber.continent = "Europa".to_string();
        cyber.country = "España".to_string();

        let mut housing = sample_record("4", Sector::Social, 50);
        housing.title = "Vivienda asequible".to_string();
        housing.subcategory = Some("Vivienda".to_string());
        housing.urgency = UrgencyLevel::High;

        vec![tech, health, cyber, housing]
    }

    fn ids(records: &[ProblemRecord]) -> Vec<&str> {
        records.iter().map(|record| record.id.as_str()).collect()
    }

    #[test]
    fn empty_criteria_is_identity() {
        let records = records();
        assert_eq!(apply(&records, &FilterCriteria::default()), records);
    }

    #[test]
    fn empty_collection() {
        let criteria = FilterCriteria {
            query: "agua".to_string(),
            ..Default::default()
        };
        assert!(apply(&[], &criteria).is_empty());
    }

    #[test]
    fn sector_filter_yields_only_that_sector() {
        let records = records();
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        let filtered = apply(&records, &criteria);
        assert_eq!(ids(&filtered), ["1", "3"]);
        assert!(filtered
            .iter()
            .all(|record| record.sector == Sector::Technology));
    }

    #[test]
    fn potential_range_with_sector() {
        let records = vec![
            sample_record("tech", Sector::Technology, 78),
            sample_record("health", Sector::Health, 30),
        ];
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.apply_extended(ExtendedFilters {
            potential: Some(PotentialRange::High),
            ..Default::default()
        });
        assert_eq!(ids(&apply(&records, &criteria)), ["tech"]);
    }

    #[test]
    fn text_search_is_case_insensitive_over_text_fields() {
        let records = records();
        let mut criteria = FilterCriteria::default();

        criteria.set_query("SALUD");
        assert_eq!(ids(&apply(&records, &criteria)), ["2"]);

        criteria.set_query("reciclaje");
        assert_eq!(ids(&apply(&records, &criteria)), ["1"]);

        criteria.set_query("pagos");
        assert_eq!(ids(&apply(&records, &criteria)), ["3"]);
    }

    #[test]
    fn text_search_ignores_sector_field() {
        let mut record = sample_record("x", Sector::Health, 40);
        record.title = "Filas en hospitales".to_string();
        let mut criteria = FilterCriteria::default();
        criteria.set_query("salud");
        assert!(apply(&[record], &criteria).is_empty());
    }

    #[test]
    fn subcategory_requires_sector() {
        let records = records();
        let criteria = FilterCriteria {
            subcategory: Some("Telemedicina".to_string()),
            ..Default::default()
        };
        assert_eq!(apply(&records, &criteria).len(), records.len());

        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.select_subcategory(Some("Ciberseguridad".to_string()));
        assert_eq!(ids(&apply(&records, &criteria)), ["3"]);
    }

    #[test]
    fn mismatched_subcategory_yields_nothing() {
        let records = records();
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.select_subcategory(Some("Telemedicina".to_string()));
        assert!(apply(&records, &criteria).is_empty());
    }

    #[test]
    fn extended_filters_ignored_while_browsing() {
        let records = records();
        let criteria = FilterCriteria {
            extended: ExtendedFilters {
                impact: Some(ImpactLevel::VeryHigh),
                ..Default::default()
            },
            extended_active: false,
            ..Default::default()
        };
        assert_eq!(criteria.phase(), FilterPhase::Browsing);
        assert_eq!(apply(&records, &criteria).len(), records.len());
    }

    #[test]
    fn each_extended_dimension_narrows() {
        let records = records();
        let cases = [
            (
                ExtendedFilters {
                    impact: Some(ImpactLevel::VeryHigh),
                    ..Default::default()
                },
                vec!["3"],
            ),
            (
                ExtendedFilters {
                    urgency: Some(UrgencyLevel::High),
                    ..Default::default()
                },
                vec!["4"],
            ),
            (
                ExtendedFilters {
                    potential: Some(PotentialRange::Fair),
                    ..Default::default()
                },
                vec!["2"],
            ),
            (
                ExtendedFilters {
                    country: Some("Chile".to_string()),
                    ..Default::default()
                },
                vec!["1"],
            ),
            (
                ExtendedFilters {
                    continent: Some("Europa".to_string()),
                    ..Default::default()
                },
                vec!["3"],
            ),
        ];
        for (extended, expected) in cases {
            let mut criteria = FilterCriteria::default();
            criteria.apply_extended(extended.clone());
            assert_eq!(ids(&apply(&records, &criteria)), expected, "{extended:?}");
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = records();
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.apply_extended(ExtendedFilters {
            impact: Some(ImpactLevel::High),
            ..Default::default()
        });
        let once = apply(&records, &criteria);
        assert_eq!(apply(&once, &criteria), once);
    }

    #[test]
    fn adding_a_predicate_never_grows_the_result() {
        let records = records();
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        let base = apply(&records, &criteria).len();

        criteria.apply_extended(ExtendedFilters {
            urgency: Some(UrgencyLevel::VeryHigh),
            ..Default::default()
        });
        let narrowed = apply(&records, &criteria).len();
        assert!(narrowed <= base);
        assert_eq!(narrowed, 1);
    }

    #[test]
    fn query_change_leaves_extended_panel() {
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.apply_extended(ExtendedFilters {
            impact: Some(ImpactLevel::Low),
            ..Default::default()
        });
        assert_eq!(criteria.phase(), FilterPhase::Filtering);

        criteria.set_query("fraude");
        assert_eq!(criteria.phase(), FilterPhase::Browsing);
        assert_eq!(criteria.sector, Some(Sector::Technology));
        assert_eq!(ids(&apply(&records(), &criteria)), ["3"]);
    }

    #[test]
    fn selecting_all_sectors_resets_to_browsing() {
        let records = records();
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.select_subcategory(Some("Inteligencia Artificial".to_string()));
        criteria.apply_extended(ExtendedFilters {
            potential: Some(PotentialRange::High),
            ..Default::default()
        });
        assert_eq!(ids(&apply(&records, &criteria)), ["1"]);

        criteria.select_sector(None);
        assert_eq!(criteria.subcategory, None);
        assert_eq!(criteria.phase(), FilterPhase::Browsing);
        assert_eq!(apply(&records, &criteria), records);
    }

    #[test]
    fn changing_sector_resets_subcategory() {
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(Some(Sector::Technology));
        criteria.select_subcategory(Some("Ciberseguridad".to_string()));
        criteria.select_sector(Some(Sector::Health));
        assert_eq!(criteria.subcategory, None);
    }

    #[test]
    fn clear_restores_defaults() {
        let mut criteria = FilterCriteria::default();
        criteria.set_query("agua");
        criteria.select_sector(Some(Sector::Environment));
        criteria.apply_extended(ExtendedFilters {
            country: Some("Perú".to_string()),
            ..Default::default()
        });
        criteria.clear();
        assert_eq!(criteria, FilterCriteria::default());
        assert_eq!(criteria.phase(), FilterPhase::Browsing);
    }
}
