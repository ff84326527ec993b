//! Initialize command.

use console::style;

use crate::cli::helpers::open_database;
use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let pool = open_database(settings).await?;

    println!(
        "{} Initialized feedacquire database at {}",
        style("✓").green(),
        pool.database_url()
    );

    let websites = settings.website_registry();
    if websites.is_empty() {
        println!(
            "{} No website scraping configs in {}; html sources will fail until one is added",
            style("!").yellow(),
            crate::config::CONFIG_FILENAME
        );
    }

    Ok(())
}
