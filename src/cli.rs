use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::rules::{CategorySet, CleanCategory};

/// Unity Sweeper - Cleans regenerable caches out of Unity projects
#[derive(Parser, Debug)]
#[command(name = "unity-sweeper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether a directory is a valid project
    Validate(ValidateArgs),

    /// Delete caches from a project
    Clean(CleanArgs),

    /// List recent projects and search for others
    Discover(DiscoverArgs),

    /// Show or clear the recent projects list
    Recent(RecentArgs),

    /// List running editor processes that may lock project files
    Processes(ProcessesArgs),

    /// Run the configured build command for a project
    Build(BuildArgs),

    /// Print a diagnostic report for a project
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project root
    pub path: PathBuf,

    /// Also report structural diagnostics
    #[arg(short, long)]
    pub diagnostics: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Project root
    pub path: PathBuf,

    /// Delete the project's temporary files
    #[arg(short, long)]
    pub temp: bool,

    /// Delete regenerable Library caches
    #[arg(short, long)]
    pub library: bool,

    /// Delete the per-user editor cache
    #[arg(short, long)]
    pub editor: bool,

    /// Remove stored editor credentials (signs you out)
    #[arg(long)]
    pub sign_out: bool,

    /// Only count what would be deleted
    #[arg(short = 'n', long)]
    pub count_only: bool,

    /// Skip the cleaning confirmation prompt
    #[arg(short, long)]
    pub force: bool,

    /// Stop running editor processes without asking
    #[arg(short, long)]
    pub kill: bool,

    /// Confirm sign-out without a separate prompt
    #[arg(long)]
    pub confirm_sign_out: bool,

    /// Output the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl CleanArgs {
    /// Categories selected on the command line.
    pub fn categories(&self) -> CategorySet {
        let flags = [
            (self.temp, CleanCategory::TemporaryFiles),
            (self.library, CleanCategory::LibraryCache),
            (self.editor, CleanCategory::EditorCache),
            (self.sign_out, CleanCategory::SignOut),
        ];
        flags
            .into_iter()
            .filter(|(selected, _)| *selected)
            .map(|(_, category)| category)
            .collect()
    }
}

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Directories to search instead of the configured ones
    #[arg(short, long, value_name = "PATH")]
    pub search: Vec<PathBuf>,

    /// Maximum search depth
    #[arg(short = 'd', long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Forget all recent projects
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct ProcessesArgs {
    /// Terminate the listed processes
    #[arg(short, long)]
    pub kill: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project root
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Project root
    pub path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_validate_command() {
        let cli = Cli::parse_from(["unity-sweeper", "validate", "--diagnostics", "/game"]);
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.path, PathBuf::from("/game"));
                assert!(args.diagnostics);
                assert!(!args.json);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn parse_clean_categories() {
        let cli = Cli::parse_from([
            "unity-sweeper",
            "clean",
            "--temp",
            "--library",
            "--force",
            "/game",
        ]);
        match cli.command {
            Command::Clean(args) => {
                assert!(args.force);
                let categories = args.categories();
                assert_eq!(categories.len(), 2);
                assert!(categories.contains(CleanCategory::TemporaryFiles));
                assert!(categories.contains(CleanCategory::LibraryCache));
                assert!(!categories.contains(CleanCategory::SignOut));
            }
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn clean_without_flags_selects_nothing() {
        let cli = Cli::parse_from(["unity-sweeper", "clean", "/game"]);
        match cli.command {
            Command::Clean(args) => assert!(args.categories().is_empty()),
            _ => panic!("Expected Clean command"),
        }
    }

    #[test]
    fn global_verbose_flag() {
        let cli = Cli::parse_from(["unity-sweeper", "-vvv", "recent"]);
        assert_eq!(cli.verbose, 3);
    }
}
