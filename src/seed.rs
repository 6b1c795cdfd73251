//! Loading problem records from a seed file.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::problem::ProblemRecord;

/// Layout of a TOML seed file: one `[[problems]]` table per record.
#[derive(Debug, Deserialize)]
struct SeedFile {
    problems: Vec<ProblemRecord>,
}

/// Reads problem records from a JSON array or a TOML file, by extension.
pub(crate) fn load(path: &Path) -> Result<Vec<ProblemRecord>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let problems = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON seed file {}", path.display()))?,
        Some("toml") => {
            let mut value: toml::Value = toml::from_str(&contents)
                .with_context(|| format!("invalid TOML seed file {}", path.display()))?;
            datetimes_to_strings(&mut value);
            value
                .try_into::<SeedFile>()
                .with_context(|| format!("invalid TOML seed file {}", path.display()))?
                .problems
        }
        _ => bail!("unsupported seed file format: {}", path.display()),
    };
    Ok(problems)
}

/// Rewrites native TOML datetimes as RFC 3339 strings, the form timestamps
/// deserialize from.
fn datetimes_to_strings(value: &mut toml::Value) {
    match value {
        toml::Value::Datetime(datetime) => {
            let text = datetime.to_string();
            *value = toml::Value::String(text);
        }
        toml::Value::Array(values) => values.iter_mut().for_each(datetimes_to_strings),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| datetimes_to_strings(v)),
        _ => {}
    }
}
