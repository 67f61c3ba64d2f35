use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use book_logging::{book_info, book_warn};
use threadbook_core::{BookPlan, BuildProfile, RenderOptions};

pub const DEFAULT_PROFILE: &str = "default";

pub fn load_plan(path: &Path) -> Result<BookPlan> {
    let content = fs::read_to_string(path).with_context(|| format!("reading book plan {}", path.display()))?;
    let plan: BookPlan = ron::from_str(&content).with_context(|| format!("parsing book plan {}", path.display()))?;
    book_info!(
        "Loaded plan {:?}: {} chapters, {} exclusions, {} profiles",
        path,
        plan.chapters.len(),
        plan.exclusions.len(),
        plan.profiles.len()
    );
    Ok(plan)
}

/// Profiles to build: the requested names in order, or every profile of the
/// plan. A plan without profiles builds one archive with default options.
pub fn select_profiles(plan: &BookPlan, requested: &[String]) -> Result<Vec<BuildProfile>> {
    if plan.profiles.is_empty() {
        book_warn!("Plan defines no profiles, using defaults");
        if requested.iter().any(|name| name != DEFAULT_PROFILE) {
            bail!("unknown profile(s) {:?}; the plan defines none", requested);
        }
        return Ok(vec![BuildProfile {
            name: DEFAULT_PROFILE.to_string(),
            output: "book.epub".to_string(),
            archive: true,
            options: RenderOptions::default(),
        }]);
    }
    if requested.is_empty() {
        return Ok(plan.profiles.clone());
    }
    requested
        .iter()
        .map(|name| {
            plan.profile(name)
                .cloned()
                .with_context(|| format!("unknown profile '{name}'"))
        })
        .collect()
}
