//! bids2isa CLI
//!
//! Converts a BIDS study directory into ISA-Tab documents
//! (`i_investigation.txt`, `s_study.txt`, `a_assay.txt`).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use bids2isa_core::{convert, write_outputs, ConversionConfig, NiftiHeaderReader, Vocabulary};

mod logging;

use logging::Verbosity;

#[derive(Parser, Debug)]
#[command(name = "bids2isa")]
#[command(author, version, about = "Extract ISA-Tab metadata from a BIDS study")]
struct Cli {
    /// Root of the BIDS study.
    bids_directory: PathBuf,

    /// Where the ISA-Tab documents are written (created if missing).
    output_directory: PathBuf,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,

    /// Keep assay columns that have no ontology entry.
    #[arg(long)]
    keep_unknown: bool,

    /// Parameter names to drop from the assay table (with `--keep-unknown`).
    #[arg(short = 'd', long = "drop-parameter", value_delimiter = ',')]
    drop_parameter: Vec<String>,

    /// JSON file with `ontology` and/or `synonyms` tables.
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// Investigation template with `[TODO: TITLE]` and `[TODO: MRI_PAR_NAMES]`.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Resolve files one at a time.
    #[arg(long)]
    serial: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let vocabulary = match &cli.vocabulary {
        Some(path) => Vocabulary::load(path)
            .with_context(|| format!("loading vocabulary {}", path.display()))?,
        None => Vocabulary::default(),
    };
    let template = match &cli.template {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("reading template {}", path.display()))?,
        ),
        None => None,
    };

    if !cli.keep_unknown && !cli.drop_parameter.is_empty() {
        tracing::warn!(
            dropped = ?cli.drop_parameter,
            "--drop-parameter has no effect without --keep-unknown"
        );
    }
    let drop: Vec<String> = cli
        .drop_parameter
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    let config = ConversionConfig {
        vocabulary,
        policy: ConversionConfig::policy_from_switches(cli.keep_unknown, drop),
        parallel: !cli.serial,
        template,
    };

    println!(
        "{} {} {} {}",
        "Converting".green().bold(),
        cli.bids_directory.display(),
        "→".cyan(),
        cli.output_directory.display()
    );

    let conversion = convert(&cli.bids_directory, &config, &NiftiHeaderReader)
        .with_context(|| format!("converting {}", cli.bids_directory.display()))?;
    let written = write_outputs(&conversion, &cli.output_directory)
        .with_context(|| format!("writing to {}", cli.output_directory.display()))?;

    for path in &written {
        println!("  {} {}", "→".cyan(), path.display());
    }
    println!(
        "  {} {} assay rows, {} parameters",
        "→".yellow(),
        conversion.assay.row_count(),
        conversion.parameter_names.len()
    );

    let warnings = conversion.diagnostics.warning_count();
    if warnings > 0 {
        println!("  {} {} warnings", "warn:".yellow().bold(), warnings);
    }
    println!("{}", "Metadata extraction complete.".green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bids2isa_core::ColumnPolicy;

    #[test]
    fn drop_parameter_accepts_lists_and_repeats() {
        let cli = Cli::parse_from([
            "bids2isa",
            "in",
            "out",
            "--keep-unknown",
            "-d",
            "flip angle,echo time",
            "--drop-parameter",
            "task",
        ]);
        assert_eq!(cli.drop_parameter, ["flip angle", "echo time", "task"]);
        assert_eq!(
            ConversionConfig::policy_from_switches(cli.keep_unknown, cli.drop_parameter),
            ColumnPolicy::DropExplicit(vec![
                "flip angle".into(),
                "echo time".into(),
                "task".into()
            ])
        );
    }

    #[test]
    fn defaults_drop_unlisted_in_parallel() {
        let cli = Cli::parse_from(["bids2isa", "in", "out"]);
        assert!(!cli.keep_unknown && !cli.serial);
        assert!(cli.drop_parameter.is_empty());
    }
}
