mod api;
mod database;
mod filter;
mod problem;
mod seed;
mod settings;
mod web;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use crate::database::Database;
use crate::settings::{Args, Settings};

fn init_tracing(level: &str) -> Result<()> {
    let level: Level = level
        .parse()
        .with_context(|| format!("invalid log level: {level}"))?;
    tracing_subscriber::fmt().with_max_level(level).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::from_file(&args.config)
        .with_context(|| format!("cannot load {}", args.config.display()))?;
    init_tracing(&settings.log.level)?;

    let database = Database::connect(&settings.database.path)?;
    if let Some(seed) = &settings.seed {
        let problems = seed::load(seed)?;
        let inserted = database
            .insert_problems(problems)
            .with_context(|| format!("cannot seed from {}", seed.display()))?;
        info!("Seeded {inserted} problems from {}", seed.display());
    }
    info!("{} problems in store", database.problem_count());

    let schema = api::schema(database);
    web::serve(schema, settings.web.address).await;
    Ok(())
}
