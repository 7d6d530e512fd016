use crate::prelude::{println, *};
use colored::Colorize;
use navlinks_core::links::LinkEntry;

use crate::directory::Directory;

#[derive(Debug, clap::Args)]
pub struct LinksOptions {
    /// Only show links in this category (case-insensitive)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: LinksOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Fetching links from Notion...");
    }

    let directory = Directory::from_env()?;
    let links = directory.get_links().await?;
    let links = filter_category(&links, options.category.as_deref());

    if options.json {
        println!("{}", format_links_json(&links)?);
        return Ok(());
    }

    if links.is_empty() {
        println!("{}", "No links found.".yellow());
        return Ok(());
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row!["Category", "Title", "Link", "LAN"]);
    for link in &links {
        table.add_row(prettytable::row![
            link.category,
            link.title,
            link.link,
            link.lan_link
        ]);
    }
    table.printstd();

    if global.verbose {
        println!("\n{} links", links.len().to_string().bright_cyan());
    }

    Ok(())
}

fn filter_category<'a>(links: &'a [LinkEntry], category: Option<&str>) -> Vec<&'a LinkEntry> {
    match category {
        Some(category) => links
            .iter()
            .filter(|link| link.category.trim().eq_ignore_ascii_case(category.trim()))
            .collect(),
        None => links.iter().collect(),
    }
}

fn format_links_json(links: &[&LinkEntry]) -> Result<String> {
    serde_json::to_string_pretty(links).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str, category: &str) -> LinkEntry {
        LinkEntry {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            category: category.to_string(),
            icon: String::new(),
            link: format!("https://{id}.example.com"),
            lan_link: String::new(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_filter_category_ignores_case() {
        let links = vec![entry("a", "Dev"), entry("b", "Media"), entry("c", "dev ")];

        let ids: Vec<&str> = filter_category(&links, Some("DEV"))
            .iter()
            .map(|l| l.id.as_str())
            .collect();

        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(filter_category(&links, None).len(), 3);
    }

    #[test]
    fn test_format_links_json_uses_camel_case() {
        let links = vec![entry("a", "Dev")];
        let refs: Vec<&LinkEntry> = links.iter().collect();

        let json = format_links_json(&refs).unwrap();

        assert!(json.contains("\"lanLink\""));
        assert!(json.contains("\"createdAt\""));
    }
}
