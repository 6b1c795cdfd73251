use std::fmt;

use anyhow::Context as AnyhowContext;
use async_graphql::{
    connection::{query, Connection, EmptyFields},
    Context, InputObject, Object, Result,
};

use crate::{
    api::{self, DateTimeUtc},
    database::{Database, TryFromKeyValue},
    filter::{ExtendedFilters, FilterCriteria},
    problem::{ImpactLevel, PotentialRange, ProblemRecord, Sector, UrgencyLevel},
};

pub(crate) struct Problem {
    key: String,
    pub(crate) record: ProblemRecord,
}

impl TryFromKeyValue for Problem {
    fn try_from_key_value(key: &[u8], value: &[u8]) -> anyhow::Result<Self> {
        let key = String::from_utf8(key.to_vec())
            .with_context(|| format!("invalid key in database: {key:02x?}"))?;
        let record = ProblemRecord::try_from_key_value(key.as_bytes(), value)?;
        Ok(Problem { key, record })
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

#[Object]
impl Problem {
    async fn id(&self) -> &str {
        &self.record.id
    }

    async fn title(&self) -> &str {
        &self.record.title
    }

    async fn description(&self) -> &str {
        &self.record.description
    }

    async fn sector(&self) -> Sector {
        self.record.sector
    }

    async fn subcategory(&self) -> Option<&str> {
        self.record.subcategory.as_deref()
    }

    async fn tags(&self) -> Vec<String> {
        self.record.tags.iter().cloned().collect()
    }

    async fn impact(&self) -> ImpactLevel {
        self.record.impact
    }

    async fn urgency(&self) -> UrgencyLevel {
        self.record.urgency
    }

    async fn potential_score(&self) -> u8 {
        self.record.potential_score
    }

    /// The potential bucket the score falls in.
    async fn potential_range(&self) -> Option<PotentialRange> {
        self.record.potential_range()
    }

    async fn country(&self) -> &str {
        &self.record.country
    }

    async fn continent(&self) -> &str {
        &self.record.continent
    }

    async fn created_at(&self) -> DateTimeUtc {
        DateTimeUtc(self.record.created_at)
    }
}

#[derive(InputObject, Debug, Default)]
pub(crate) struct ProblemFilter {
    /// Case-insensitive substring of the title, description or a tag.
    query: Option<String>,
    /// Filter by sector.
    sector: Option<Sector>,
    /// Filter by subcategory. Ignored unless `sector` is given.
    subcategory: Option<String>,
    /// Whether the filters below take part. They are ignored otherwise.
    #[graphql(default)]
    extended: bool,
    /// Filter by impact level.
    impact: Option<ImpactLevel>,
    /// Filter by urgency level.
    urgency: Option<UrgencyLevel>,
    /// Filter by potential-score bucket.
    potential: Option<PotentialRange>,
    /// Filter by country.
    country: Option<String>,
    /// Filter by continent.
    continent: Option<String>,
}

impl From<ProblemFilter> for FilterCriteria {
    fn from(filter: ProblemFilter) -> Self {
        let mut criteria = FilterCriteria::default();
        criteria.select_sector(filter.sector);
        criteria.select_subcategory(filter.subcategory);
        criteria.set_query(filter.query.unwrap_or_default());
        if filter.extended {
            criteria.apply_extended(ExtendedFilters {
                impact: filter.impact,
                urgency: filter.urgency,
                potential: filter.potential,
                country: filter.country,
                continent: filter.continent,
            });
        }
        criteria
    }
}

#[derive(Default)]
pub(super) struct ProblemQuery;

#[Object]
impl ProblemQuery {
    async fn problems(
        &self,
        ctx: &Context<'_>,
        filter: Option<ProblemFilter>,
        after: Option<String>,
        before: Option<String>,
        first: Option<i32>,
        last: Option<i32>,
    ) -> Result<Connection<String, Problem, EmptyFields, EmptyFields>> {
        let criteria = FilterCriteria::from(filter.unwrap_or_default());
        let criteria = &criteria;
        query(
            after,
            before,
            first,
            last,
            |after, before, first, last| async move {
                api::load_connection(
                    ctx,
                    |db: &Database, start: Option<&[u8]>, end: Option<&[u8]>| {
                        db.problems::<Problem>(start, end).filter(move |problem| {
                            problem
                                .as_ref()
                                .map_or(true, |problem| criteria.matches(&problem.record))
                        })
                    },
                    after,
                    before,
                    first,
                    last,
                )
            },
        )
        .await
    }

    async fn problem(&self, ctx: &Context<'_>, id: String) -> Result<Option<Problem>> {
        let db = ctx.data::<Database>()?;
        db.problem(&id)
            .map_err(|e| format!("failed to read database: {e}").into())
    }
}
