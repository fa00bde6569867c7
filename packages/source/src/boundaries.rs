//! Area boundary reader.
//!
//! Boundary packs ship as a zip archive holding shapefiles for several
//! geographies (and often several exports of each). The reader picks the
//! `.shp` member whose name carries both the granularity and the region
//! token, reads it together with its `.dbf` attribute table straight from
//! the archive, and locates the code/name attributes with
//! [`crate::columns`] rules.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use area_map_area_models::{AreaGeometry, BoundaryRow};
use shapefile::dbase;

use crate::DataError;
use crate::columns::{code_rules, identify_column, name_rules};
use crate::config::BoundaryLayout;

/// Picks the shapefile member for the given granularity and region.
///
/// Matching is case-insensitive. When several members match, the shortest
/// name wins, which favors the canonical export over per-borough subsets.
#[must_use]
pub fn select_shapefile<'a, I>(names: I, granularity: &str, region: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let granularity = granularity.to_lowercase();
    let region = region.to_lowercase();
    names
        .into_iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            lower.ends_with(".shp") && lower.contains(&granularity) && lower.contains(&region)
        })
        .min_by_key(|name| name.len())
}

/// Finds the member with the same stem as `shp` and the given extension.
fn sidecar<'a>(names: &'a [String], shp: &str, extension: &str) -> Option<&'a str> {
    let stem = shp.get(..shp.len().saturating_sub(4))?.to_lowercase();
    let wanted = format!("{stem}.{extension}");
    names
        .iter()
        .map(String::as_str)
        .find(|name| name.to_lowercase() == wanted)
}

/// Reads the boundary archive at `path`.
///
/// # Errors
///
/// Returns [`DataError`] if the archive cannot be opened or fails any of the
/// checks described on [`read_boundaries_from`].
pub fn read_boundaries(path: &Path, layout: &BoundaryLayout) -> Result<Vec<BoundaryRow>, DataError> {
    let display = path.display().to_string();
    log::info!("Reading area boundaries from {display}");
    let file = std::fs::File::open(path).map_err(|e| DataError::Io {
        path: display.clone(),
        source: e,
    })?;
    read_boundaries_from(&display, std::io::BufReader::new(file), layout)
}

/// Reads boundary rows from a zip archive.
///
/// # Errors
///
/// Returns [`DataError::ShapefileNotFound`] if no member matches,
/// [`DataError::MissingSidecar`] if the `.dbf` is absent,
/// [`DataError::MissingColumn`] / [`DataError::AmbiguousColumn`] if the
/// code or name attribute cannot be identified, and
/// [`DataError::Archive`] / [`DataError::Shapefile`] on decode failures.
pub fn read_boundaries_from<R: Read + Seek>(
    artifact: &str,
    reader: R,
    layout: &BoundaryLayout,
) -> Result<Vec<BoundaryRow>, DataError> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| DataError::Archive {
        path: artifact.to_string(),
        message: e.to_string(),
    })?;

    let names: Vec<String> = archive.file_names().map(String::from).collect();

    let shp = select_shapefile(
        names.iter().map(String::as_str),
        &layout.granularity,
        &layout.region,
    )
    .ok_or_else(|| DataError::ShapefileNotFound {
        archive: artifact.to_string(),
        granularity: layout.granularity.clone(),
        region: layout.region.clone(),
    })?
    .to_string();
    log::info!("Using shapefile: {shp}");

    let dbf = sidecar(&names, &shp, "dbf")
        .ok_or_else(|| DataError::MissingSidecar {
            archive: artifact.to_string(),
            member: format!("{}.dbf", shp.get(..shp.len() - 4).unwrap_or(&shp)),
        })?
        .to_string();

    let shp_bytes = read_member(&mut archive, artifact, &shp)?;
    let dbf_bytes = read_member(&mut archive, artifact, &dbf)?;

    parse_shapefile(&shp, shp_bytes, dbf_bytes, layout)
}

fn read_member<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    artifact: &str,
    name: &str,
) -> Result<Vec<u8>, DataError> {
    let mut member = archive.by_name(name).map_err(|e| DataError::Archive {
        path: artifact.to_string(),
        message: format!("{name}: {e}"),
    })?;
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes).map_err(|e| DataError::Io {
        path: format!("{artifact}:{name}"),
        source: e,
    })?;
    Ok(bytes)
}

/// Decodes shapes and attributes, keeping only code, name, and geometry.
fn parse_shapefile(
    member: &str,
    shp: Vec<u8>,
    dbf: Vec<u8>,
    layout: &BoundaryLayout,
) -> Result<Vec<BoundaryRow>, DataError> {
    let shapefile_error = |message: String| DataError::Shapefile {
        path: member.to_string(),
        message,
    };

    let dbase_reader =
        dbase::Reader::new(Cursor::new(dbf)).map_err(|e| shapefile_error(e.to_string()))?;
    let columns: Vec<String> = dbase_reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();

    let code_column = identify_column(&columns, &code_rules(&layout.granularity), "area code", member)?;
    let name_column = identify_column(&columns, &name_rules(&layout.granularity), "area name", member)?;
    log::info!("{member}: code column {code_column}, name column {name_column}");

    let shape_reader =
        shapefile::ShapeReader::new(Cursor::new(shp)).map_err(|e| shapefile_error(e.to_string()))?;
    let mut reader = shapefile::Reader::new(shape_reader, dbase_reader);

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.map_err(|e| shapefile_error(e.to_string()))?;

        let Some(area_code) = field_text(&record, &code_column) else {
            skipped += 1;
            continue;
        };
        if matches!(shape, shapefile::Shape::NullShape) {
            log::warn!("{member}: area {area_code} has no geometry, skipping");
            skipped += 1;
            continue;
        }

        let geometry = AreaGeometry::try_from(shape)
            .map_err(|e| shapefile_error(format!("area {area_code}: {e}")))?;

        rows.push(BoundaryRow {
            area_name: field_text(&record, &name_column).unwrap_or_default(),
            area_code,
            geometry,
        });
    }

    if skipped > 0 {
        log::warn!("{member}: skipped {skipped} shapes without a code or geometry");
    }
    if rows.is_empty() {
        return Err(DataError::EmptyResult {
            artifact: member.to_string(),
            step: "reading shapes".to_string(),
        });
    }
    log::info!("{member}: {} boundaries", rows.len());

    Ok(rows)
}

/// Attribute value as trimmed text.
fn field_text(record: &dbase::Record, column: &str) -> Option<String> {
    let text = match record.get(column)? {
        dbase::FieldValue::Character(Some(s)) | dbase::FieldValue::Memo(s) => s.trim().to_string(),
        dbase::FieldValue::Numeric(Some(n)) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
