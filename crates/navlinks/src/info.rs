use crate::prelude::{println, *};
use colored::Colorize;
use navlinks_core::database::DatabaseInfo;

use crate::directory::Directory;

#[derive(Debug, clap::Args)]
pub struct InfoOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: InfoOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Fetching database info from Notion...");
    }

    let directory = Directory::from_env()?;
    let info = directory.get_database_info().await?;

    if options.json {
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
        println!("{json}");
    } else {
        println!("{}", format_info_text(&info));
    }

    Ok(())
}

fn format_info_text(info: &DatabaseInfo) -> String {
    let mut result = String::new();

    result.push_str(&format!("{}\n", info.title.bright_cyan().bold()));
    result.push_str(&format!(
        "  {}: {}\n",
        "Icon".green(),
        info.icon.as_deref().unwrap_or("(none)").cyan()
    ));
    result.push_str(&format!(
        "  {}: {}",
        "Cover".green(),
        info.cover.as_deref().unwrap_or("(none)").cyan()
    ));

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_info_text_marks_missing_images() {
        colored::control::set_override(false);
        let info = DatabaseInfo {
            title: "Home".to_string(),
            icon: None,
            cover: Some("https://cdn.example.com/c.png".to_string()),
        };

        let text = format_info_text(&info);

        assert_eq!(
            text,
            "Home\n  Icon: (none)\n  Cover: https://cdn.example.com/c.png"
        );
    }
}
