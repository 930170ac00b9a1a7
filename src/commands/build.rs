//! Build command implementation.

use anyhow::Result;

use crate::build::BuildRunner;
use crate::cli::BuildArgs;
use crate::config::Config;
use crate::error::BuildError;

use super::{remember, resolve, validator, EXIT_BUILD_FAILED, EXIT_REFUSED};

/// Run the build command.
pub fn run(args: BuildArgs, config: &Config) -> Result<()> {
    let path = resolve(&args.path);
    let validation = validator(config)?.validate(&path);
    if let Some(reason) = &validation.reason {
        eprintln!("Error: {} is not a valid project: {}", path.display(), reason);
        std::process::exit(EXIT_REFUSED);
    }
    remember(config, &path);

    let runner = BuildRunner::from_config(&config.build);
    println!("Building {}...", path.display());

    match runner.run(&path) {
        Ok(outcome) => {
            println!("Build succeeded in {:.1}s", outcome.duration.as_secs_f64());
            println!("  Artifact: {}", outcome.artifact.display());
            println!("  Log:      {}", outcome.log_file.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if matches!(e, BuildError::Exit { .. } | BuildError::MissingArtifact(_)) {
                eprintln!("Logs are in {}", runner.log_dir_for(&path).display());
            }
            std::process::exit(EXIT_BUILD_FAILED);
        }
    }
}
