use anyhow::{Context, Result};
use tracing::info;

use policy_structure::structure::NormalizeRules;
use policy_structure::util::write_json_pretty;

use crate::cli::RulesArgs;

pub fn run(args: RulesArgs) -> Result<()> {
    let rules = NormalizeRules::default();

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &rules)?;
            info!(path = %path.display(), "wrote default rule table");
        }
        None => {
            let rendered =
                serde_json::to_string_pretty(&rules).context("failed to render rule table")?;
            println!("{rendered}");
        }
    }

    Ok(())
}
