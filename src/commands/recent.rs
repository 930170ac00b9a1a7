//! Recent command implementation.

use anyhow::Result;

use crate::cli::RecentArgs;
use crate::config::Config;
use crate::project::RecentProjects;

/// Run the recent command.
pub fn run(args: RecentArgs, config: &Config) -> Result<()> {
    let mut recent = RecentProjects::load(config.recent_file());

    if args.clear {
        recent.clear();
        recent.save()?;
        println!("Recent projects cleared.");
        return Ok(());
    }

    if recent.is_empty() {
        println!("No recent projects.");
        return Ok(());
    }

    for (i, path) in recent.entries().iter().enumerate() {
        println!("{:>3}. {}", i + 1, path.display());
    }
    Ok(())
}
