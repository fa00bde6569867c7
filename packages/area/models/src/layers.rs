//! Map layer descriptors handed to the rendering collaborator.
//!
//! The core never renders anything itself. It emits one
//! [`LayerDescriptor`] per map layer and leaves drawing to whichever
//! choropleth library hosts the map.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Named color scale for a choropleth layer (`ColorBrewer` names).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ColorScale {
    /// Yellow-orange-red.
    YlOrRd,
    /// Blue-green.
    BuGn,
    /// Yellow-green-blue.
    YlGnBu,
    /// Single highlight color for the membership layer.
    Highlight,
}

/// Whether a layer is fixed per session or recolored on every filter change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LayerKind {
    /// Colored by a numeric column.
    Static,
    /// Colored by the membership mask.
    Dynamic,
}

/// One swatch in a layer legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendStop {
    /// Hex color (e.g. `"#FD8D3C"`).
    pub color: String,
    /// Label shown next to the swatch.
    pub label: String,
}

/// Legend for a static layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    /// Legend heading.
    pub title: String,
    /// Swatches from low to high.
    pub stops: Vec<LegendStop>,
}

/// A property shown in a feature tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipField {
    /// Feature property name.
    pub property: String,
    /// Label shown before the value.
    pub alias: String,
}

/// Styling of matching features in the dynamic layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyle {
    pub fill_color: String,
    pub outline_color: String,
    pub outline_weight: f64,
    pub fill_opacity: f64,
}

/// Everything the renderer needs to draw one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    /// Stable identifier (e.g. `"group_share"`).
    pub id: String,
    /// Label shown in the layer control.
    pub label: String,
    /// Feature property the layer is colored by.
    pub value_column: String,
    pub color_scale: ColorScale,
    pub kind: LayerKind,
    /// Whether the layer starts visible.
    pub default_visible: bool,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub legend: Option<Legend>,
    pub highlight: Option<HighlightStyle>,
    pub tooltip: Vec<TooltipField>,
}

/// Initial map viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    /// `[latitude, longitude]`.
    pub center: [f64; 2],
    pub zoom: u8,
    /// Tile set name understood by the renderer.
    pub tiles: String,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [51.5074, -0.1278],
            zoom: 11,
            tiles: "cartodbpositron".to_string(),
        }
    }
}
