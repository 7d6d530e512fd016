use crate::prelude::{println, *};
use colored::Colorize;
use navlinks_core::order::{compare_categories, CategoryOrderMap};

use crate::directory::Directory;

#[derive(Debug, clap::Args)]
pub struct OrderOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: OrderOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Fetching category ranks from Notion...");
    }

    let directory = Directory::from_env()?;
    let order = directory.get_config().await?;

    if options.json {
        let json = serde_json::to_string_pretty(&order)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{json}");
        return Ok(());
    }

    let ranks = ranked(&order);
    if ranks.is_empty() {
        println!("{}", "No category ranks configured.".yellow());
        return Ok(());
    }

    let mut table = crate::prelude::new_table();
    table.add_row(prettytable::row!["Rank", "Category"]);
    for (category, rank) in ranks {
        table.add_row(prettytable::row![rank, category]);
    }
    table.printstd();

    Ok(())
}

/// Categories in the order their links are displayed
fn ranked(order: &CategoryOrderMap) -> Vec<(&str, i64)> {
    let mut ranks: Vec<(&str, i64)> = order.iter().collect();
    ranks.sort_by(|(a, rank_a), (b, rank_b)| {
        rank_a.cmp(rank_b).then_with(|| compare_categories(a, b))
    });
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_sorts_by_rank_then_name() {
        let order: CategoryOrderMap = [
            ("Tools".to_string(), 2),
            ("media".to_string(), 1),
            ("Dev".to_string(), 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            ranked(&order),
            vec![("Dev", 1), ("media", 1), ("Tools", 2)]
        );
    }
}
