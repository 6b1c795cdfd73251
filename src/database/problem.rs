use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use sled::{transaction::ConflictableTransactionError, IVec, Transactional};
use tracing::debug;

use super::{Database, Iter, TryFromKeyValue};
use crate::problem::ProblemRecord;

/// Anything that can hand over the full problem collection.
pub(crate) trait ProblemSource {
    fn fetch_problems(&self) -> Result<Vec<ProblemRecord>>;
}

impl ProblemSource for Database {
    fn fetch_problems(&self) -> Result<Vec<ProblemRecord>> {
        self.problems(None, None).collect()
    }
}

impl ProblemSource for [ProblemRecord] {
    fn fetch_problems(&self) -> Result<Vec<ProblemRecord>> {
        Ok(self.to_vec())
    }
}

impl TryFromKeyValue for ProblemRecord {
    fn try_from_key_value(_key: &[u8], value: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(value)?)
    }
}

impl Database {
    /// Stores `problems` in order and returns how many distinct ids were written.
    ///
    /// The whole batch is validated first and written in one transaction. A
    /// record whose id is already stored replaces the old one and keeps its
    /// position.
    pub(crate) fn insert_problems(&self, problems: Vec<ProblemRecord>) -> Result<usize> {
        let mut entries = Vec::with_capacity(problems.len());
        for problem in &problems {
            problem.validate().context("invalid problem record")?;
            entries.push((problem.id.as_bytes(), bincode::serialize(problem)?));
        }
        (&self.problem_tree, &self.problem_id_tree)
            .transaction(|(problem_tree, problem_id_tree)| {
                for (id, value) in &entries {
                    // Keys sort in insertion order; a known id keeps its old key.
                    let key = match problem_id_tree.get(*id)? {
                        Some(key) => key,
                        None => {
                            let seq = problem_tree.generate_id()?;
                            IVec::from(format!("{seq:016x}").as_bytes())
                        }
                    };
                    problem_tree.insert(key.clone(), value.as_slice())?;
                    problem_id_tree.insert(*id, key)?;
                }
                Ok::<_, ConflictableTransactionError<()>>(())
            })
            .map_err(|e| anyhow!("cannot store problems: {e:?}"))?;
        self.db.flush()?;

        let ids: BTreeSet<&str> = problems.iter().map(|p| p.id.as_str()).collect();
        debug!("stored {} problems", ids.len());
        Ok(ids.len())
    }

    /// Iterates stored problems in insertion order over `[start, end)`.
    pub(crate) fn problems<T: TryFromKeyValue>(
        &self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Iter<T> {
        let start = start.unwrap_or(b"\x00");
        if let Some(end) = end {
            Iter::new(self.problem_tree.range(start..end))
        } else {
            Iter::new(self.problem_tree.range(start..))
        }
    }

    pub(crate) fn problem<T: TryFromKeyValue>(&self, id: &str) -> Result<Option<T>> {
        let Some(key) = self.problem_id_tree.get(id)? else {
            return Ok(None);
        };
        let Some(value) = self.problem_tree.get(&key)? else {
            return Ok(None);
        };
        T::try_from_key_value(&key, &value).map(Some)
    }

    pub(crate) fn problem_count(&self) -> usize {
        self.problem_tree.len()
    }
}
