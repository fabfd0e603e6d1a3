use crate::color_utils::HexColor;
use crate::live_input::LiveInput;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const BACKGROUND_VARIABLE: &str = "--ifm-background-color";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShadeRole {
    Primary,
    Dark,
    Darker,
    Darkest,
    Light,
    Lighter,
    Lightest,
}

impl ShadeRole {
    /// Every role, in code-emission order.
    pub const ALL: [ShadeRole; 7] = [
        ShadeRole::Primary,
        ShadeRole::Dark,
        ShadeRole::Darker,
        ShadeRole::Darkest,
        ShadeRole::Light,
        ShadeRole::Lighter,
        ShadeRole::Lightest,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ShadeRole::Primary => "primary",
            ShadeRole::Dark => "dark",
            ShadeRole::Darker => "darker",
            ShadeRole::Darkest => "darkest",
            ShadeRole::Light => "light",
            ShadeRole::Lighter => "lighter",
            ShadeRole::Lightest => "lightest",
        }
    }

    pub fn variable_name(self) -> &'static str {
        match self {
            ShadeRole::Primary => "--ifm-color-primary",
            ShadeRole::Dark => "--ifm-color-primary-dark",
            ShadeRole::Darker => "--ifm-color-primary-darker",
            ShadeRole::Darkest => "--ifm-color-primary-darkest",
            ShadeRole::Light => "--ifm-color-primary-light",
            ShadeRole::Lighter => "--ifm-color-primary-lighter",
            ShadeRole::Lightest => "--ifm-color-primary-lightest",
        }
    }

    pub fn from_variable_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.variable_name() == name)
    }

    /// Position in the on-screen table, lightest first.
    pub fn display_order(self) -> usize {
        match self {
            ShadeRole::Lightest => 0,
            ShadeRole::Lighter => 1,
            ShadeRole::Light => 2,
            ShadeRole::Primary => 3,
            ShadeRole::Dark => 4,
            ShadeRole::Darker => 5,
            ShadeRole::Darkest => 6,
        }
    }

    /// Position in the generated stylesheet.
    pub fn code_order(self) -> usize {
        self as usize
    }

    /// Default adjustment, in percent.
    fn default_percent(self) -> i32 {
        match self {
            ShadeRole::Primary => 0,
            ShadeRole::Dark => 10,
            ShadeRole::Darker => 15,
            ShadeRole::Darkest => 30,
            ShadeRole::Light => -10,
            ShadeRole::Lighter => -15,
            ShadeRole::Lightest => -30,
        }
    }

    pub fn is_editable(self) -> bool {
        self != ShadeRole::Primary
    }
}

impl fmt::Display for ShadeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ShadeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|role| role.slug() == s).ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a finite percentage: {0:?}")]
pub struct InvalidAdjustment(String);

/// Parse percentage text such as `"10"` or `"-12.5"` into a fraction.
pub fn parse_adjustment(text: &str) -> Result<f64, InvalidAdjustment> {
    match text.trim().parse::<f64>() {
        Ok(percent) if percent.is_finite() => Ok(percent / 100.0),
        _ => Err(InvalidAdjustment(text.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShadeSpec {
    pub role: ShadeRole,
    adjustment: LiveInput<f64>,
}

impl ShadeSpec {
    pub fn new(role: ShadeRole, adjustment: f64, adjustment_input: impl Into<String>) -> Self {
        let adjustment = if role.is_editable() { adjustment } else { 0.0 };
        Self {
            role,
            adjustment: LiveInput::new(adjustment, adjustment_input),
        }
    }

    pub fn default_for(role: ShadeRole) -> Self {
        let percent = role.default_percent();
        Self::new(role, percent as f64 / 100.0, percent.to_string())
    }

    pub fn adjustment(&self) -> f64 {
        *self.adjustment.value()
    }

    pub fn adjustment_input(&self) -> &str {
        self.adjustment.text()
    }
}

/// The seven shade specs, one slot per role, indexed by code order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadeTable([ShadeSpec; 7]);

impl Default for ShadeTable {
    fn default() -> Self {
        Self(ShadeRole::ALL.map(ShadeSpec::default_for))
    }
}

impl ShadeTable {
    pub fn get(&self, role: ShadeRole) -> &ShadeSpec {
        &self.0[role.code_order()]
    }

    pub fn set(&mut self, spec: ShadeSpec) {
        let slot = spec.role.code_order();
        self.0[slot] = spec;
    }

    /// Specs in code-emission order.
    pub fn iter(&self) -> impl Iterator<Item = &ShadeSpec> {
        self.0.iter()
    }

    /// Apply an adjustment edit. The raw text is always kept; the numeric
    /// adjustment only moves when the text parses. The primary role is fixed.
    pub fn edit_adjustment(&mut self, role: ShadeRole, text: &str) -> bool {
        if !role.is_editable() {
            return false;
        }
        self.0[role.code_order()]
            .adjustment
            .edit(text, parse_adjustment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaletteEntry {
    pub role: ShadeRole,
    pub spec: ShadeSpec,
    pub color: HexColor,
}

impl PaletteEntry {
    pub fn hex(&self) -> String {
        self.color.to_hex()
    }
}

/// Derive one entry per role from `base`, in display order.
pub fn derive_palette(base: HexColor, shades: &ShadeTable) -> Vec<PaletteEntry> {
    let mut entries: Vec<PaletteEntry> = shades
        .iter()
        .map(|spec| PaletteEntry {
            role: spec.role,
            spec: spec.clone(),
            color: base.darken(spec.adjustment()),
        })
        .collect();
    entries.sort_by_key(|entry| entry.role.display_order());
    entries
}
