use std::collections::BTreeMap;

use async_graphql::{Context, Object, Result, SimpleObject};

use crate::{
    api::problem::ProblemFilter,
    database::ProblemSource,
    filter::{self, FilterCriteria},
    problem::{ImpactLevel, PotentialRange, ProblemRecord, Sector, UrgencyLevel},
    Database,
};

#[derive(SimpleObject)]
struct SectorCount {
    sector: Sector,
    count: usize,
}

#[derive(SimpleObject)]
struct ImpactCount {
    impact: ImpactLevel,
    count: usize,
}

#[derive(SimpleObject)]
struct UrgencyCount {
    urgency: UrgencyLevel,
    count: usize,
}

#[derive(SimpleObject)]
struct PotentialRangeCount {
    range: PotentialRange,
    count: usize,
}

#[derive(SimpleObject)]
struct ProblemStat {
    /// The number of matching problems.
    total_count: usize,

    /// The distribution of matching problems by sector.
    sector_distribution: Vec<SectorCount>,

    /// The distribution of matching problems by impact level.
    impact_distribution: Vec<ImpactCount>,

    /// The distribution of matching problems by urgency level.
    urgency_distribution: Vec<UrgencyCount>,

    /// The distribution of matching problems by potential-score bucket.
    potential_distribution: Vec<PotentialRangeCount>,

    /// The average potential score of matching problems.
    avg_potential_score: Option<f64>,
}

fn distribution<K, F>(problems: &[ProblemRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&ProblemRecord) -> Option<K>,
{
    problems
        .iter()
        .filter_map(key)
        .fold(BTreeMap::new(), |mut acc, k| {
            *acc.entry(k).or_insert(0) += 1;
            acc
        })
}

#[allow(clippy::cast_precision_loss)] // counts and scores are far below 2^52
fn average_score(problems: &[ProblemRecord]) -> Option<f64> {
    if problems.is_empty() {
        return None;
    }
    let sum: u64 = problems
        .iter()
        .map(|problem| u64::from(problem.potential_score))
        .sum();
    Some(sum as f64 / problems.len() as f64)
}

#[derive(Default)]
pub(super) struct ProblemStatQuery {}

#[Object]
impl ProblemStatQuery {
    #[allow(clippy::unused_async)]
    async fn problem_stat(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProblemFilter>,
    ) -> Result<ProblemStat> {
        let db = ctx.data::<Database>()?;
        let problems = db
            .fetch_problems()
            .map_err(|e| format!("failed to read database: {e}"))?;
        let criteria = FilterCriteria::from(filter.unwrap_or_default());
        let filtered = filter::apply(&problems, &criteria);

        let sector_distribution = distribution(&filtered, |p| Some(p.sector))
            .into_iter()
            .map(|(sector, count)| SectorCount { sector, count })
            .collect();
        let impact_distribution = distribution(&filtered, |p| Some(p.impact))
            .into_iter()
            .map(|(impact, count)| ImpactCount { impact, count })
            .collect();
        let urgency_distribution = distribution(&filtered, |p| Some(p.urgency))
            .into_iter()
            .map(|(urgency, count)| UrgencyCount { urgency, count })
            .collect();
        let potential_distribution = distribution(&filtered, ProblemRecord::potential_range)
            .into_iter()
            .map(|(range, count)| PotentialRangeCount { range, count })
            .collect();

        Ok(ProblemStat {
            total_count: filtered.len(),
            sector_distribution,
            impact_distribution,
            urgency_distribution,
            potential_distribution,
            avg_potential_score: average_score(&filtered),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::TestSchema,
        problem::{sample_record, ImpactLevel, ProblemRecord, Sector},
    };

    fn create_problems() -> Vec<ProblemRecord> {
        let mut first = sample_record("1", Sector::Technology, 80);
        first.impact = ImpactLevel::High;
        let second = sample_record("2", Sector::Technology, 20);
        let mut third = sample_record("3", Sector::Health, 50);
        third.impact = ImpactLevel::High;
        vec![first, second, third]
    }

    #[tokio::test]
    async fn stat_without_filter() {
        let schema = TestSchema::new();
        schema.db.insert_problems(create_problems()).unwrap();

        let query = r"
        {
            problemStat {
                totalCount
                sectorDistribution { sector count }
                impactDistribution { impact count }
                potentialDistribution { range count }
                avgPotentialScore
            }
        }";
        let data = schema.execute(query).await.data.into_json().unwrap();
        let stat = &data["problemStat"];
        assert_eq!(stat["totalCount"], 3);
        assert_eq!(
            stat["sectorDistribution"],
            serde_json::json!([
                {"sector": "TECHNOLOGY", "count": 2},
                {"sector": "HEALTH", "count": 1},
            ])
        );
        assert_eq!(
            stat["impactDistribution"],
            serde_json::json!([
                {"impact": "MEDIUM", "count": 1},
                {"impact": "HIGH", "count": 2},
            ])
        );
        assert_eq!(
            stat["potentialDistribution"],
            serde_json::json!([
                {"range": "LOW", "count": 1},
                {"range": "GOOD", "count": 1},
                {"range": "HIGH", "count": 1},
            ])
        );
        assert_eq!(stat["avgPotentialScore"], 50.0);
    }

    #[tokio::test]
    async fn stat_by_sector() {
        let schema = TestSchema::new();
        schema.db.insert_problems(create_problems()).unwrap();

        let query = r"
        {
            problemStat(filter: {sector: HEALTH}) {
                totalCount
                avgPotentialScore
            }
        }";
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(data["problemStat"]["totalCount"], 1);
        assert_eq!(data["problemStat"]["avgPotentialScore"], 50.0);
    }

    #[tokio::test]
    async fn stat_with_no_match() {
        let schema = TestSchema::new();
        schema.db.insert_problems(create_problems()).unwrap();

        let query = r#"
        {
            problemStat(filter: {query: "inexistente"}) {
                totalCount
                sectorDistribution { sector count }
                avgPotentialScore
            }
        }"#;
        let data = schema.execute(query).await.data.into_json().unwrap();
        assert_eq!(data["problemStat"]["totalCount"], 0);
        assert_eq!(data["problemStat"]["sectorDistribution"], serde_json::json!([]));
        assert!(data["problemStat"]["avgPotentialScore"].is_null());
    }
}
