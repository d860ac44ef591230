use anyhow::Result;
use tracing::info;

use policy_structure::structure::StructureParser;
use policy_structure::util::{read_text, write_text};

use super::load_rules;
use crate::cli::NormalizeArgs;

pub fn run(args: NormalizeArgs) -> Result<()> {
    let (rules, rules_source) = load_rules(args.rules.as_deref())?;
    let parser = StructureParser::new(&rules)?;

    let raw = read_text(&args.input)?;
    let (normalized, stats) = parser.normalize_with_stats(&raw);

    info!(
        input = %args.input.display(),
        rules = %rules_source,
        rounds = stats.rounds,
        converged = stats.converged,
        page_number_lines = stats.page_number_lines_removed,
        ocr_noise = stats.ocr_noise_removed,
        boilerplate_lines = stats.boilerplate_lines_removed,
        heading_breaks = stats.heading_breaks_inserted,
        "normalized text"
    );

    match &args.output {
        Some(path) => {
            write_text(path, &normalized)?;
            info!(path = %path.display(), "wrote normalized text");
        }
        None => println!("{normalized}"),
    }

    Ok(())
}
