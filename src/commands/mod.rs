use std::path::Path;

use anyhow::Result;
use tracing::info;

use policy_structure::structure::NormalizeRules;

pub mod normalize;
pub mod outline;
pub mod parse;
pub mod rules;
#[cfg(test)]
mod tests;

const BUILTIN_RULES: &str = "builtin";

fn load_rules(path: Option<&Path>) -> Result<(NormalizeRules, String)> {
    match path {
        Some(path) => {
            let rules = NormalizeRules::load(path)?;
            info!(path = %path.display(), "loaded rule table");
            Ok((rules, path.display().to_string()))
        }
        None => Ok((NormalizeRules::default(), BUILTIN_RULES.to_string())),
    }
}
