//! `GeoJSON` export of the joined table.
//!
//! One feature per area, carrying the record's fields as properties plus
//! the membership flag. Geometry is converted as-is.

use area_map_area_models::AreaTable;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};

use crate::layers::FILTERED_PROPERTY;

/// Builds the feature collection. `mask` is aligned with the table rows;
/// rows past its end count as not selected.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if a record cannot be turned into
/// properties.
pub fn feature_collection(table: &AreaTable, mask: &[bool]) -> Result<FeatureCollection, serde_json::Error> {
    let features = table
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let mut properties = match serde_json::to_value(record)? {
                serde_json::Value::Object(map) => map,
                _ => JsonObject::new(),
            };
            let selected = mask.get(i).copied().unwrap_or(false);
            properties.insert(FILTERED_PROPERTY.to_string(), u8::from(selected).into());

            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&record.geometry))),
                id: Some(geojson::feature::Id::String(record.area_code.clone())),
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    log::debug!("Built {} features", features.len());

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
