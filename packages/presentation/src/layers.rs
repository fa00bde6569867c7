//! The map's layer catalog.
//!
//! Three static choropleths (group share, income, house price) and one
//! dynamic layer that highlights the areas selected by the membership mask.
//! Legend colors approximate the low, middle, and high ends of each
//! `ColorBrewer` scale.

use area_map_area_models::layers::{
    ColorScale, HighlightStyle, LayerDescriptor, LayerKind, Legend, LegendStop, TooltipField,
};
use serde::{Deserialize, Serialize};

/// Property carrying the membership flag (0 or 1) on each feature.
pub const FILTERED_PROPERTY: &str = "is_filtered";

/// Outline opacity shared by the static layers.
const LINE_OPACITY: f64 = 0.2;

/// Which layers are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct LayerVisibility {
    pub group_share: bool,
    pub income: bool,
    pub house_price: bool,
    pub filtered: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            group_share: true,
            income: false,
            house_price: false,
            filtered: true,
        }
    }
}

fn stops(entries: &[(&str, &str)]) -> Vec<LegendStop> {
    entries
        .iter()
        .map(|(color, label)| LegendStop {
            color: (*color).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

/// Tooltip shown on every feature of the dynamic layer.
#[must_use]
pub fn tooltip_fields() -> Vec<TooltipField> {
    [
        ("full_name", "MSOA:"),
        ("group_share", "% Black:"),
        ("income", "Income (£):"),
        ("house_price", "House Price (£):"),
    ]
    .into_iter()
    .map(|(property, alias)| TooltipField {
        property: property.to_string(),
        alias: alias.to_string(),
    })
    .collect()
}

fn static_layer(
    id: &str,
    label: &str,
    color_scale: ColorScale,
    fill_opacity: f64,
    visible: bool,
    legend: Legend,
) -> LayerDescriptor {
    LayerDescriptor {
        id: id.to_string(),
        label: label.to_string(),
        value_column: id.to_string(),
        color_scale,
        kind: LayerKind::Static,
        default_visible: visible,
        fill_opacity,
        line_opacity: LINE_OPACITY,
        legend: Some(legend),
        highlight: None,
        tooltip: Vec::new(),
    }
}

/// The three choropleth layers.
#[must_use]
pub fn static_layers(visibility: &LayerVisibility) -> Vec<LayerDescriptor> {
    vec![
        static_layer(
            "group_share",
            "% Black",
            ColorScale::YlOrRd,
            0.8,
            visibility.group_share,
            Legend {
                title: "% Black Population".to_string(),
                stops: stops(&[
                    ("#FFFFCC", "Low (0-10%)"),
                    ("#FD8D3C", "Medium (10-30%)"),
                    ("#BD0026", "High (30%+)"),
                ]),
            },
        ),
        static_layer(
            "income",
            "Mean Income (£)",
            ColorScale::BuGn,
            0.5,
            visibility.income,
            Legend {
                title: "Mean Income".to_string(),
                stops: stops(&[("#EDF8FB", "Low"), ("#8FCDAE", "Medium"), ("#006D2C", "High")]),
            },
        ),
        static_layer(
            "house_price",
            "Median House Price (£)",
            ColorScale::YlGnBu,
            0.6,
            visibility.house_price,
            Legend {
                title: "Median House Price".to_string(),
                stops: stops(&[("#FFFFD9", "Low"), ("#99D594", "Medium"), ("#2C7FB8", "High")]),
            },
        ),
    ]
}

/// The layer recolored from the membership mask on every filter change.
#[must_use]
pub fn filtered_layer(visible: bool) -> LayerDescriptor {
    LayerDescriptor {
        id: FILTERED_PROPERTY.to_string(),
        label: "Live Filtered Areas".to_string(),
        value_column: FILTERED_PROPERTY.to_string(),
        color_scale: ColorScale::Highlight,
        kind: LayerKind::Dynamic,
        default_visible: visible,
        fill_opacity: 0.7,
        line_opacity: 1.0,
        legend: None,
        highlight: Some(HighlightStyle {
            fill_color: "#00CCFF".to_string(),
            outline_color: "black".to_string(),
            outline_weight: 1.0,
            fill_opacity: 0.7,
        }),
        tooltip: tooltip_fields(),
    }
}

/// Every layer, static ones first.
#[must_use]
pub fn catalog(visibility: &LayerVisibility) -> Vec<LayerDescriptor> {
    let mut layers = static_layers(visibility);
    layers.push(filtered_layer(visibility.filtered));
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_visibility_shows_share_and_filtered() {
        let layers = catalog(&LayerVisibility::default());
        let visible: Vec<&str> = layers
            .iter()
            .filter(|l| l.default_visible)
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(visible, vec!["group_share", "is_filtered"]);
    }

    #[test]
    fn catalog_has_three_static_and_one_dynamic_layer() {
        let layers = catalog(&LayerVisibility::default());
        assert_eq!(layers.len(), 4);
        assert_eq!(
            layers.iter().filter(|l| l.kind == LayerKind::Static).count(),
            3
        );
        let dynamic = &layers[3];
        assert_eq!(dynamic.kind, LayerKind::Dynamic);
        assert_eq!(dynamic.value_column, FILTERED_PROPERTY);
        assert!(dynamic.legend.is_none());
        assert_eq!(dynamic.tooltip.len(), 4);
    }

    #[test]
    fn static_layers_carry_scales_and_opacity() {
        let layers = static_layers(&LayerVisibility::default());
        let scales: Vec<ColorScale> = layers.iter().map(|l| l.color_scale).collect();
        assert_eq!(scales, vec![ColorScale::YlOrRd, ColorScale::BuGn, ColorScale::YlGnBu]);
        assert!((layers[0].fill_opacity - 0.8).abs() < f64::EPSILON);
        assert!((layers[1].fill_opacity - 0.5).abs() < f64::EPSILON);
        assert!((layers[2].fill_opacity - 0.6).abs() < f64::EPSILON);
        assert!(layers.iter().all(|l| l.legend.as_ref().is_some_and(|g| g.stops.len() == 3)));
    }

    #[test]
    fn visibility_toggles_flow_into_descriptors() {
        let visibility = LayerVisibility {
            group_share: false,
            income: true,
            house_price: true,
            filtered: false,
        };
        let flags: Vec<bool> = catalog(&visibility).iter().map(|l| l.default_visible).collect();
        assert_eq!(flags, vec![false, true, true, false]);
    }
}
