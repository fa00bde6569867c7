//! Presence check for the four input files.

use std::path::Path;

use crate::DataError;
use crate::config::DatasetConfig;
use crate::paths::InputPaths;

/// Verifies that every input file exists under `dir`.
///
/// Logs where to obtain each missing file before failing.
///
/// # Errors
///
/// Returns [`DataError::MissingFiles`] listing every missing file name.
pub fn check_inputs(dir: &Path, config: &DatasetConfig) -> Result<InputPaths, DataError> {
    let paths = InputPaths::resolve(dir, &config.files);

    let required = [
        (&paths.boundaries, config.boundaries.source_url.as_str()),
        (&paths.income, config.income.source_url.as_str()),
        (&paths.ethnicity, config.ethnicity.source_url.as_str()),
        (&paths.housing, config.housing.source_url.as_str()),
    ];

    let missing: Vec<(String, &str)> = required
        .iter()
        .filter(|(path, _)| !path.exists())
        .map(|(path, url)| {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            (name, *url)
        })
        .collect();

    if missing.is_empty() {
        return Ok(paths);
    }

    log::error!(
        "Missing required data files in {}: {}",
        dir.display(),
        missing
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!("Please download the required files:");
    for (i, (name, url)) in missing.iter().enumerate() {
        log::info!("{}. {name}: {url}", i + 1);
    }

    Err(DataError::MissingFiles {
        files: missing.into_iter().map(|(name, _)| name).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reports_every_missing_file() {
        let tmp = std::env::temp_dir().join("area_map_inputs_missing_test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let config = DatasetConfig::default();
        fs::write(tmp.join(&config.files.income), b"").unwrap();

        let err = check_inputs(&tmp, &config).unwrap_err();
        match err {
            DataError::MissingFiles { files } => {
                assert_eq!(
                    files,
                    vec![
                        "london_boundaries.zip".to_string(),
                        "census_ts021.csv".to_string(),
                        "housingMSOA140624.xlsx".to_string(),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn passes_when_all_files_exist() {
        let tmp = std::env::temp_dir().join("area_map_inputs_present_test");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let config = DatasetConfig::default();
        for name in [
            &config.files.ethnicity,
            &config.files.income,
            &config.files.housing,
            &config.files.boundaries,
        ] {
            fs::write(tmp.join(name), b"").unwrap();
        }

        let paths = check_inputs(&tmp, &config).unwrap();
        assert_eq!(paths.housing, tmp.join("housingMSOA140624.xlsx"));

        let _ = fs::remove_dir_all(&tmp);
    }
}
