use crate::color_utils::ContrastRating;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadeRow {
    pub role: String,
    pub variable: String,
    pub hex: String,
    pub adjustment: f64,
    pub adjustment_input: String,
    pub editable: bool,
    pub light_contrast: f64,
    pub light_rating: ContrastRating,
    pub dark_contrast: f64,
    pub dark_rating: ContrastRating,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorView {
    pub base_color_input: String,
    pub base_color: String,
    pub light_background: String,
    pub dark_background: String,
    pub dark_theme: bool,
    pub shades: Vec<ShadeRow>,
    pub stylesheet: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextInput {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThemeInput {
    pub dark: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StyleEvent {
    pub property: String,
    pub value: String,
    pub time: i64,
}

#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event_type: String,
    pub data: String,
}
