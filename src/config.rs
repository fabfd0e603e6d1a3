use crate::color_utils::HexColor;
use crate::shades::{ShadeRole, ShadeSpec, ShadeTable};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Key of the persisted slot holding the widget configuration.
pub const STORAGE_KEY: &str = "ifm-theme-colors";

pub const DEFAULT_BASE_COLOR: HexColor = HexColor::from_rgb(0x25, 0xc2, 0xa0);
pub const DEFAULT_LIGHT_BACKGROUND: HexColor = HexColor::from_rgb(0xff, 0xff, 0xff);
pub const DEFAULT_DARK_BACKGROUND: HexColor = HexColor::from_rgb(0x18, 0x19, 0x20);

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub base_color: HexColor,
    pub light_background: HexColor,
    pub dark_background: HexColor,
    pub shades: ShadeTable,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_color: DEFAULT_BASE_COLOR,
            light_background: DEFAULT_LIGHT_BACKGROUND,
            dark_background: DEFAULT_DARK_BACKGROUND,
            shades: ShadeTable::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredShade {
    adjustment: f64,
    adjustment_input: String,
    display_order: usize,
    code_order: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfiguration {
    base_color: String,
    light_background: String,
    dark_background: String,
    shades: BTreeMap<&'static str, StoredShade>,
}

impl Configuration {
    /// Decode persisted text. Each field that is missing or malformed falls
    /// back to its default on its own; this never fails.
    pub fn from_stored(text: Option<&str>) -> Self {
        let mut config = Self::default();
        let Some(text) = text else {
            return config;
        };

        let fields = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                debug!("Stored configuration is not an object, using defaults");
                return config;
            }
        };

        if let Some(color) = color_field(&fields, "baseColor") {
            config.base_color = color;
        }
        if let Some(color) = color_field(&fields, "lightBackground") {
            config.light_background = color;
        }
        if let Some(color) = color_field(&fields, "darkBackground") {
            config.dark_background = color;
        }

        if let Some(Value::Object(shades)) = fields.get("shades") {
            for (name, value) in shades {
                let Some(role) = ShadeRole::from_variable_name(name) else {
                    debug!("Ignoring stored shade {}", name);
                    continue;
                };
                // The primary shade is always the base color itself
                if !role.is_editable() {
                    continue;
                }
                if let Some(spec) = stored_shade(role, value) {
                    config.shades.set(spec);
                }
            }
        }

        config
    }

    pub fn to_stored(&self) -> String {
        let stored = StoredConfiguration {
            base_color: self.base_color.to_hex(),
            light_background: self.light_background.to_hex(),
            dark_background: self.dark_background.to_hex(),
            shades: self
                .shades
                .iter()
                .map(|spec| {
                    (
                        spec.role.variable_name(),
                        StoredShade {
                            adjustment: spec.adjustment(),
                            adjustment_input: spec.adjustment_input().to_string(),
                            display_order: spec.role.display_order(),
                            code_order: spec.role.code_order(),
                        },
                    )
                })
                .collect(),
        };
        // Only strings, finite floats and integers: serialization cannot fail
        serde_json::to_string(&stored).unwrap_or_default()
    }
}

fn color_field(fields: &Map<String, Value>, name: &str) -> Option<HexColor> {
    let parsed = fields.get(name)?.as_str()?.parse().ok();
    if parsed.is_none() {
        debug!("Stored {} is not a color, using default", name);
    }
    parsed
}

fn stored_shade(role: ShadeRole, value: &Value) -> Option<ShadeSpec> {
    let adjustment = value.get("adjustment")?.as_f64()?;
    let input = match value.get("adjustmentInput").and_then(Value::as_str) {
        Some(input) => input.to_string(),
        // Four decimal places of a percentage; hides binary float noise
        None => ((adjustment * 1e6).round() / 1e4).to_string(),
    };
    Some(ShadeSpec::new(role, adjustment, input))
}
