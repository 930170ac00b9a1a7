//! Discover command implementation.

use anyhow::Result;
use std::path::PathBuf;

use crate::cli::DiscoverArgs;
use crate::config::Config;
use crate::project::{DiscoveryOptions, ProjectDiscovery, RecentProjects};

use super::validator;

/// Run the discover command.
pub fn run(args: DiscoverArgs, config: &Config) -> Result<()> {
    let recent = RecentProjects::load(config.recent_file());

    let search_paths: Vec<PathBuf> = if args.search.is_empty() {
        config.search_paths()
    } else {
        args.search.clone()
    };
    let options = DiscoveryOptions {
        max_depth: args.max_depth.unwrap_or(config.discovery.max_depth),
        ..Default::default()
    };

    tracing::debug!(?search_paths, "Searching for projects");
    let discovery = ProjectDiscovery::new(validator(config)?, options);
    let found = discovery.discover(&search_paths, &recent);

    if args.json {
        let output = serde_json::json!({
            "recent": recent.entries(),
            "discovered": found,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if recent.is_empty() && found.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    if !recent.is_empty() {
        println!("Recent projects:");
        for path in recent.entries() {
            println!("  {}", path.display());
        }
    }

    if !found.is_empty() {
        if !recent.is_empty() {
            println!();
        }
        println!("Discovered projects:");
        for path in &found {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
