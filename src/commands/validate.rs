//! Validate command implementation.

use anyhow::Result;

use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::project::ValidationResult;

use super::{remember, resolve, validator, EXIT_REFUSED};

/// Run the validate command.
pub fn run(args: ValidateArgs, config: &Config) -> Result<()> {
    let validator = validator(config)?;
    let path = resolve(&args.path);

    let result = if args.diagnostics {
        validator.inspect(&path)
    } else {
        validator.validate(&path)
    };

    if result.valid {
        remember(config, &path);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, validator.layout().display_name());
    }

    if !result.valid {
        std::process::exit(EXIT_REFUSED);
    }
    Ok(())
}

fn print_result(result: &ValidationResult, layout: &str) {
    match &result.reason {
        None => {
            print!("Valid {} project: {}", layout, result.path.display());
            match &result.editor_version {
                Some(version) => println!(" (editor {})", version),
                None => println!(),
            }
        }
        Some(reason) => {
            println!("Not a valid {} project: {}", layout, result.path.display());
            println!("  Reason: {}", reason);
        }
    }

    if result.diagnostics.is_empty() {
        return;
    }

    println!("\nDiagnostics:");
    for diagnostic in &result.diagnostics {
        println!("  - {}", diagnostic.message());
        println!("    {}", diagnostic.recommendation());
    }
}
