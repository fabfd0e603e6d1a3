use crate::config::{Configuration, DEFAULT_DARK_BACKGROUND, DEFAULT_LIGHT_BACKGROUND};
use crate::shades::{PaletteEntry, BACKGROUND_VARIABLE};
use std::fmt::Write;

const HEADER_COMMENT: &str = "/* You can override the default Infima variables here. */";

pub const DARK_THEME_SELECTOR: &str = "[data-theme='dark']";

/// Render the copy-paste stylesheet block for the given palette.
///
/// Declarations follow code order whatever order `palette` is in. Background
/// overrides only appear for backgrounds that differ from the defaults.
pub fn generate(config: &Configuration, palette: &[PaletteEntry]) -> String {
    let mut entries: Vec<&PaletteEntry> = palette.iter().collect();
    entries.sort_by_key(|entry| entry.role.code_order());

    let mut css = String::from(HEADER_COMMENT);
    css.push_str("\n:root {\n");
    for entry in entries {
        let _ = writeln!(css, "  {}: {};", entry.role.variable_name(), entry.hex());
    }
    if config.light_background != DEFAULT_LIGHT_BACKGROUND {
        let _ = writeln!(
            css,
            "  {}: {};",
            BACKGROUND_VARIABLE,
            config.light_background.to_hex()
        );
    }
    css.push_str("}\n");

    if config.dark_background != DEFAULT_DARK_BACKGROUND {
        let _ = write!(
            css,
            "\n{} {{\n  {}: {};\n}}\n",
            DARK_THEME_SELECTOR,
            BACKGROUND_VARIABLE,
            config.dark_background.to_hex()
        );
    }

    css
}
