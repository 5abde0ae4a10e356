use anyhow::{Context, Result, bail};
use colcast::{CreationCounter, check::check_table, settings::Settings};
use std::env;
use tracing::{Level, debug, info};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .context("Usage: colcast <config-file.toml>")?;

    let settings = Settings::load(&config_path)?;

    let level = if settings.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
    debug!("Config:\n{:#?}", settings);

    let mut table_names: Vec<_> = settings.tables.keys().collect();
    table_names.sort();

    let counter = CreationCounter::new();
    let mut failed_cells = 0;
    for table_name in table_names {
        let report = check_table(table_name, &settings.tables[table_name], &counter)
            .with_context(|| format!("Failed to check table '{}'", table_name))?;
        failed_cells += report.failures.len();
    }

    if failed_cells > 0 {
        bail!("{} cells failed to convert", failed_cells);
    }
    info!("All tables converted cleanly");
    Ok(())
}
