pub(crate) mod problem;

use std::{marker::PhantomData, path::Path};

use anyhow::{Context, Result};
use sled::{Db, Tree};

pub(crate) use self::problem::ProblemSource;

const PROBLEM_TREE: &str = "problems";
const PROBLEM_ID_TREE: &str = "problem_ids";

#[derive(Clone)]
pub(crate) struct Database {
    db: Db,
    problem_tree: Tree,
    problem_id_tree: Tree,
}

impl Database {
    pub(crate) fn connect(path: &Path) -> Result<Database> {
        let db = sled::open(path)
            .with_context(|| format!("cannot open database at {}", path.display()))?;
        let problem_tree = db.open_tree(PROBLEM_TREE)?;
        let problem_id_tree = db.open_tree(PROBLEM_ID_TREE)?;
        Ok(Database {
            db,
            problem_tree,
            problem_id_tree,
        })
    }
}

/// Builds a value from one stored key/value pair.
pub(crate) trait TryFromKeyValue: Sized {
    fn try_from_key_value(key: &[u8], value: &[u8]) -> Result<Self>;
}

/// Iterates a key range of a tree, decoding each entry into `T`.
pub(crate) struct Iter<T> {
    inner: sled::Iter,
    phantom: PhantomData<T>,
}

impl<T> Iter<T> {
    pub(crate) fn new(inner: sled::Iter) -> Self {
        Self {
            inner,
            phantom: PhantomData,
        }
    }
}

impl<T: TryFromKeyValue> Iterator for Iter<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| {
            let (key, value) = item?;
            T::try_from_key_value(&key, &value)
        })
    }
}

impl<T: TryFromKeyValue> DoubleEndedIterator for Iter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|item| {
            let (key, value) = item?;
            T::try_from_key_value(&key, &value)
        })
    }
}
