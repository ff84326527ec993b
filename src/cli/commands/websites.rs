//! Website scraping config listing.

use console::style;

use crate::config::Settings;

/// List website scraping configs from settings.
pub async fn cmd_websites(settings: &Settings) -> anyhow::Result<()> {
    let registry = settings.website_registry();
    if registry.is_empty() {
        println!(
            "{} No websites configured. Add [websites.<id>] tables to {}.",
            style("!").yellow(),
            crate::config::CONFIG_FILENAME
        );
        return Ok(());
    }

    let policy = &settings.strategy;
    println!("\n{}", style("Websites").bold());
    println!("{}", "-".repeat(70));
    println!("{:<20} {:<12} Base URL", "ID", "Strategy");
    println!("{}", "-".repeat(70));

    for id in registry.ids() {
        let strategy = if policy.enhanced_websites.contains(id) {
            "enhanced"
        } else if policy.lightweight_websites.contains(id) {
            "lightweight"
        } else {
            "auto"
        };
        let base_url = registry.get(id).map(|c| c.base_url.as_str()).unwrap_or_default();
        println!("{:<20} {:<12} {}", id, strategy, base_url);
    }

    if let Some(force) = policy.force {
        println!(
            "\n{} Strategy forced to {} for every website",
            style("!").yellow(),
            force
        );
    }
    Ok(())
}
