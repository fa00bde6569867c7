//! Census ethnicity download from the ONS observations API.
//!
//! The API returns one observation per (area, ethnic group, sex) triple,
//! spread over linked pages. [`download`] checks access against the
//! dataset's dimensions endpoint, walks every page, keeps the
//! "All persons" rows minus the all-groups totals, and writes the result in
//! the long format [`crate::ethnicity`] reads.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::{CensusApiConfig, EthnicityLayout};
use crate::progress::ProgressCallback;
use crate::retry::{RetryPolicy, fetch_json};

/// Errors from the census download. Fatal to the download only.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body is not the expected JSON.
    #[error("Malformed JSON from {url}: {source}")]
    Json {
        /// Requested URL.
        url: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The output file could not be written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Output path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The output CSV could not be written.
    #[error("CSV error writing {path}: {source}")]
    Csv {
        /// Output path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Every attempt at a request failed.
    #[error("Giving up after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },
}

// ── API payloads ─────────────────────────────────────────────────────────

/// One page of the observations endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationsPage {
    #[serde(default)]
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub total_observations: Option<u64>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl ObservationsPage {
    /// Link to the following page, if any.
    #[must_use]
    pub fn next(&self) -> Option<&str> {
        self.pagination
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub dimensions: ObservationDimensions,
    pub observation: ObservationValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationDimensions {
    pub geography: DimensionOption,
    pub ethnic_group: DimensionOption,
    pub sex: DimensionOption,
}

/// A dimension value as reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct DimensionOption {
    pub id: String,
    pub label: String,
}

/// Observation counts arrive as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for ObservationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s.trim()),
        }
    }
}

// ── Conversion ───────────────────────────────────────────────────────────

/// One long-format output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusRow {
    pub area_code: String,
    pub ethnic_group: String,
    pub observation: String,
}

/// Keeps "All persons" rows and drops the all-groups total rows, so that
/// summing every remaining subcategory per area yields its population.
#[must_use]
pub fn observations_to_rows(observations: &[Observation], config: &CensusApiConfig) -> Vec<CensusRow> {
    observations
        .iter()
        .filter(|o| o.dimensions.sex.label == config.all_persons_label)
        .filter(|o| o.dimensions.ethnic_group.label != config.total_label)
        .map(|o| CensusRow {
            area_code: o.dimensions.geography.id.clone(),
            ethnic_group: o.dimensions.ethnic_group.label.clone(),
            observation: o.observation.to_string(),
        })
        .collect()
}

/// Writes rows as CSV using the ethnicity reader's column names.
///
/// # Errors
///
/// Returns [`csv::Error`] if a record cannot be written.
pub fn write_long_csv<W: Write>(
    writer: W,
    rows: &[CensusRow],
    layout: &EthnicityLayout,
) -> Result<(), csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        layout.area_code_column.as_str(),
        layout.category_column.as_str(),
        layout.value_column.as_str(),
    ])?;
    for row in rows {
        csv.write_record([
            row.area_code.as_str(),
            row.ethnic_group.as_str(),
            row.observation.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

// ── Fetching ─────────────────────────────────────────────────────────────

/// Builds the HTTP client with the configured user agent and timeout.
///
/// # Errors
///
/// Returns [`FetchError::Http`] if the client cannot be built.
pub fn build_client(config: &CensusApiConfig) -> Result<reqwest::Client, FetchError> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

/// Confirms the dataset is reachable by fetching its dimensions.
///
/// # Errors
///
/// Returns [`FetchError`] once retries are exhausted.
#[allow(clippy::future_not_send)]
pub async fn check_access(client: &reqwest::Client, config: &CensusApiConfig) -> Result<(), FetchError> {
    let url = format!("{}/dimensions", config.version_url());
    log::info!("Checking census API access: {url}");
    let policy = RetryPolicy::from(config);
    let body: serde_json::Value = fetch_json(&policy, || {
        client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
    })
    .await?;
    let count = body
        .get("items")
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len);
    log::info!("Connected to census API ({count} dimensions)");
    Ok(())
}

/// Fetches every observation page, following `pagination.next`.
///
/// # Errors
///
/// Returns [`FetchError`] if any page fails after all retries.
#[allow(clippy::future_not_send)]
pub async fn fetch_observations(
    client: &reqwest::Client,
    config: &CensusApiConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<Observation>, FetchError> {
    let policy = RetryPolicy::from(config);
    let first_url = format!("{}/observations", config.version_url());
    let query = [
        ("area_type", config.area_type.as_str()),
        ("dimensions", config.dimensions.as_str()),
    ];

    let mut observations = Vec::new();
    let mut next: Option<String> = None;
    let mut page_number = 0u32;

    loop {
        page_number += 1;
        progress.set_message(format!("page {page_number}"));

        let page: ObservationsPage = match &next {
            None => {
                fetch_json(&policy, || {
                    client
                        .get(&first_url)
                        .query(&query)
                        .header(reqwest::header::ACCEPT, "application/json")
                })
                .await?
            }
            Some(url) => {
                fetch_json(&policy, || {
                    client
                        .get(url)
                        .header(reqwest::header::ACCEPT, "application/json")
                })
                .await?
            }
        };

        if page_number == 1
            && let Some(total) = page.total_observations
        {
            progress.set_total(total);
        }
        log::debug!("Page {page_number}: {} observations", page.observations.len());
        progress.inc(page.observations.len() as u64);

        let following = page.next().map(String::from);
        observations.extend(page.observations);

        match following {
            Some(url) if next.as_deref() == Some(url.as_str()) => {
                log::warn!("Pagination points back at {url}, stopping");
                break;
            }
            Some(url) => next = Some(url),
            None => break,
        }
    }

    log::info!("Fetched {} observations over {page_number} pages", observations.len());
    Ok(observations)
}

/// Downloads the census counts and writes the long-format CSV to `output`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`FetchError`] if the API cannot be reached after all retries
/// or the output cannot be written.
#[allow(clippy::future_not_send)]
pub async fn download(
    config: &CensusApiConfig,
    layout: &EthnicityLayout,
    output: &Path,
    progress: &dyn ProgressCallback,
) -> Result<usize, FetchError> {
    let client = build_client(config)?;
    check_access(&client, config).await?;

    let observations = fetch_observations(&client, config, progress).await?;
    let rows = observations_to_rows(&observations, config);
    log::info!(
        "Kept {} of {} observations ({} only, totals dropped)",
        rows.len(),
        observations.len(),
        config.all_persons_label
    );

    let display = output.display().to_string();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FetchError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    let file = std::fs::File::create(output).map_err(|e| FetchError::Io {
        path: display.clone(),
        source: e,
    })?;
    write_long_csv(std::io::BufWriter::new(file), &rows, layout).map_err(|e| FetchError::Csv {
        path: display.clone(),
        source: e,
    })?;

    progress.finish(format!("{} rows written to {display}", rows.len()));
    log::info!("Saved {} census rows to {display}", rows.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::DatasetConfig;
    use crate::ethnicity::read_ethnicity_from;

    fn observation(area: &str, group: &str, sex: &str, value: serde_json::Value) -> serde_json::Value {
        json!({
            "dimensions": {
                "geography": { "id": area, "label": format!("{area} name") },
                "ethnic_group": { "id": "x", "label": group },
                "sex": { "id": "0", "label": sex },
            },
            "observation": value,
        })
    }

    fn page() -> ObservationsPage {
        serde_json::from_value(json!({
            "observations": [
                observation("E02000001", "All ethnic groups", "All persons", json!(500)),
                observation(
                    "E02000001",
                    "Black, Black British, Black Welsh, Caribbean or African: African",
                    "All persons",
                    json!("50"),
                ),
                observation("E02000001", "White: English, Welsh, Scottish, Northern Irish or British", "All persons", json!(450)),
                observation("E02000001", "White: English, Welsh, Scottish, Northern Irish or British", "Female", json!(230)),
            ],
            "total_observations": 4,
            "pagination": { "next": "https://example.test/observations?page=2" },
        }))
        .unwrap()
    }

    #[test]
    fn decodes_page_with_mixed_observation_types() {
        let page = page();
        assert_eq!(page.observations.len(), 4);
        assert_eq!(page.total_observations, Some(4));
        assert_eq!(page.next(), Some("https://example.test/observations?page=2"));
        assert_eq!(page.observations[0].observation.to_string(), "500");
        assert_eq!(page.observations[1].observation.to_string(), "50");
    }

    #[test]
    fn last_page_has_no_next() {
        let page: ObservationsPage = serde_json::from_value(json!({
            "observations": [],
            "pagination": { "next": null },
        }))
        .unwrap();
        assert_eq!(page.next(), None);

        let bare: ObservationsPage = serde_json::from_value(json!({})).unwrap();
        assert_eq!(bare.next(), None);
    }

    #[test]
    fn keeps_all_persons_without_totals() {
        let config = DatasetConfig::default().census_api;
        let rows = observations_to_rows(&page().observations, &config);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.area_code == "E02000001"));
        assert!(rows.iter().all(|r| r.ethnic_group != "All ethnic groups"));
        assert_eq!(rows[1].observation, "450");
    }

    #[test]
    fn written_csv_reads_back_as_ethnicity_rows() {
        let config = DatasetConfig::default();
        let rows = observations_to_rows(&page().observations, &config.census_api);

        let mut buffer = Vec::new();
        write_long_csv(&mut buffer, &rows, &config.ethnicity).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with(
            "Middle layer Super Output Areas Code,Ethnic group (20 categories),Observation\n"
        ));

        let parsed = read_ethnicity_from("census.csv", buffer.as_slice(), &config.ethnicity).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].total_population, 500);
        assert_eq!(parsed[0].group_count, 50);
    }

    #[test]
    fn rejects_observation_without_sex_dimension() {
        let result: Result<Observation, _> = serde_json::from_value(json!({
            "dimensions": {
                "geography": { "id": "E02000001", "label": "a" },
                "ethnic_group": { "id": "1", "label": "b" },
            },
            "observation": 1,
        }));
        assert!(result.is_err());
    }
}
