//! Repository boilerplate and the description region of the README.

use crate::error::Result;
use phenoflow_locator::{DelimitedRegion, HexDocument, MarkerPosition};

pub const README_PATH: &str = "README.md";
pub const LICENSE_PATH: &str = "LICENSE.md";

/// Message of the commit that writes the first README. Its author is the
/// phenotype's creator.
pub const README_COMMIT_MESSAGE: &str = "Initial README.md";
pub const LICENSE_COMMIT_MESSAGE: &str = "Initial LICENSE.md";
pub const DESCRIPTION_COMMIT_MESSAGE: &str = "Updated description.";

pub const LICENSE_TEXT: &str = include_str!("../templates/LICENSE.md");
const README_TEMPLATE: &str = include_str!("../templates/README-Template.md");

const NAME_PLACEHOLDER: &str = "<Name>";
const ABOUT_PLACEHOLDER: &str = "<ID> - <Description>";

/// The description follows the first `"- "` and runs to the next `"##"`
/// heading, minus the line breaks before it.
pub const DESCRIPTION_START: &str = "- ";
pub const DESCRIPTION_END: &str = "##";

pub fn render_readme(name: &str, about: &str) -> String {
    README_TEMPLATE
        .replace(NAME_PLACEHOLDER, name)
        .replacen(ABOUT_PLACEHOLDER, about, 1)
}

pub fn repository_description(name: &str, creator: &str) -> String {
    format!("{name} phenotype. Created by {creator}.")
}

pub fn created_message(path: &str) -> String {
    format!("Created {path}")
}

pub fn updated_message(path: &str) -> String {
    format!("Updated {path}")
}

pub fn deleted_message(path: &str) -> String {
    format!("Deleted {path}")
}

fn description_region(readme: &HexDocument) -> Result<DelimitedRegion> {
    Ok(readme
        .locate(DESCRIPTION_START, DESCRIPTION_END, MarkerPosition::Exclude)?
        .trim_end_whitespace(readme.as_hex()))
}

pub fn read_description(readme: &HexDocument) -> Result<String> {
    let region = description_region(readme)?;
    Ok(readme.text_at(region)?)
}

/// Replaces the description, keeping the README's own line endings.
pub fn write_description(readme: &mut HexDocument, description: &str) -> Result<()> {
    let region = description_region(readme)?;
    readme.splice(region, description)?;
    Ok(())
}
