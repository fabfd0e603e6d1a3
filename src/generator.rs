use crate::color_utils::{contrast_ratio, normalize_color_input, ContrastRating, HexColor};
use crate::config::Configuration;
use crate::environment::Environment;
use crate::live_input::LiveInput;
use crate::models::{GeneratorView, ShadeRow};
use crate::shades::{derive_palette, PaletteEntry, ShadeRole, ShadeTable};
use crate::stylesheet;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeneratorError {
    #[error("the {0} shade is the base color and cannot be adjusted")]
    NotEditable(ShadeRole),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundScope {
    Light,
    Dark,
}

impl FromStr for BackgroundScope {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(BackgroundScope::Light),
            "dark" => Ok(BackgroundScope::Dark),
            _ => Err(()),
        }
    }
}

/// One running Color Generator widget.
///
/// Every edit that changes what the page should show re-runs [`Self::sync`],
/// which pushes the derived palette and active background to the environment
/// and persists the configuration.
pub struct ColorGenerator<E> {
    base: LiveInput<HexColor>,
    light_background: HexColor,
    dark_background: HexColor,
    shades: ShadeTable,
    dark_theme: bool,
    env: E,
}

impl<E: Environment> ColorGenerator<E> {
    /// Start from persisted text (defaults when absent or malformed) and
    /// apply the initial state once.
    pub fn load(env: E, stored: Option<&str>, dark_theme: bool) -> Self {
        let config = Configuration::from_stored(stored);
        let mut generator = Self {
            base: LiveInput::new(config.base_color, config.base_color.to_hex()),
            light_background: config.light_background,
            dark_background: config.dark_background,
            shades: config.shades,
            dark_theme,
            env,
        };
        generator.sync();
        generator
    }

    pub fn configuration(&self) -> Configuration {
        Configuration {
            base_color: *self.base.value(),
            light_background: self.light_background,
            dark_background: self.dark_background,
            shades: self.shades.clone(),
        }
    }

    pub fn base_color(&self) -> HexColor {
        *self.base.value()
    }

    pub fn base_color_input(&self) -> &str {
        self.base.text()
    }

    #[cfg(test)]
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Entries in display order.
    pub fn palette(&self) -> Vec<PaletteEntry> {
        derive_palette(*self.base.value(), &self.shades)
    }

    pub fn stylesheet(&self) -> String {
        stylesheet::generate(&self.configuration(), &self.palette())
    }

    /// Returns whether the text was a color. Invalid text is still shown but
    /// leaves the active base color, and everything derived from it, alone.
    pub fn set_base_color_input(&mut self, text: &str) -> bool {
        let text = normalize_color_input(text);
        let accepted = self.base.edit(text, str::parse::<HexColor>);
        if accepted {
            debug!("Base color set to {}", self.base.value());
            self.sync();
        } else {
            debug!("Ignoring base color input {:?}", self.base.text());
        }
        accepted
    }

    /// Returns whether the text parsed. The raw text is kept either way, and
    /// is persisted along with the rest of the table.
    pub fn set_adjustment_input(
        &mut self,
        role: ShadeRole,
        text: &str,
    ) -> Result<bool, GeneratorError> {
        if !role.is_editable() {
            return Err(GeneratorError::NotEditable(role));
        }
        let accepted = self.shades.edit_adjustment(role, text);
        debug!(
            "Adjustment for {} is now {} ({:?})",
            role,
            self.shades.get(role).adjustment(),
            text
        );
        self.sync();
        Ok(accepted)
    }

    pub fn set_background(&mut self, scope: BackgroundScope, text: &str) -> bool {
        let Ok(color) = normalize_color_input(text).parse::<HexColor>() else {
            debug!("Ignoring {:?} background input {:?}", scope, text);
            return false;
        };
        match scope {
            BackgroundScope::Light => self.light_background = color,
            BackgroundScope::Dark => self.dark_background = color,
        }
        self.sync();
        true
    }

    pub fn set_dark_theme(&mut self, dark: bool) {
        if self.dark_theme != dark {
            self.dark_theme = dark;
            self.sync();
        }
    }

    /// Background for the theme the page is currently showing.
    pub fn active_background(&self) -> HexColor {
        if self.dark_theme {
            self.dark_background
        } else {
            self.light_background
        }
    }

    fn sync(&mut self) {
        for entry in self.palette() {
            self.env.apply_live_style(entry.role, entry.color);
        }
        self.env.apply_background(self.active_background());
        let config = self.configuration();
        self.env.persist(&config);
    }

    pub fn view(&self) -> GeneratorView {
        let palette = self.palette();
        let shades = palette
            .iter()
            .map(|entry| {
                let light_contrast = contrast_ratio(entry.color, self.light_background);
                let dark_contrast = contrast_ratio(entry.color, self.dark_background);
                ShadeRow {
                    role: entry.role.slug().to_string(),
                    variable: entry.role.variable_name().to_string(),
                    hex: entry.hex(),
                    adjustment: entry.spec.adjustment(),
                    adjustment_input: entry.spec.adjustment_input().to_string(),
                    editable: entry.role.is_editable(),
                    light_contrast,
                    light_rating: ContrastRating::from_ratio(light_contrast),
                    dark_contrast,
                    dark_rating: ContrastRating::from_ratio(dark_contrast),
                }
            })
            .collect();

        GeneratorView {
            base_color_input: self.base.text().to_string(),
            base_color: self.base.value().to_hex(),
            light_background: self.light_background.to_hex(),
            dark_background: self.dark_background.to_hex(),
            dark_theme: self.dark_theme,
            shades,
            stylesheet: stylesheet::generate(&self.configuration(), &palette),
        }
    }
}
