//! Scenario loading: reads the network tables and optional run config from a
//! directory and turns them into a validated network.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers used by [`load_scenario`].
//!
//! A scenario directory holds:
//!
//! | base name | required | content |
//! |-----------|----------|---------|
//! | `origins` | yes | list of [`OriginData`] |
//! | `destinations` | yes | list of [`DestinationData`] |
//! | `relations` | yes | list of [`RelationData`] |
//! | `config` | no | a [`SimConfig`]; missing fields take their defaults |
//!
//! TOML files wrap each list in a top-level array named after the file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;
use wagonflow_core::config::SimConfig;
use wagonflow_core::engine::Simulation;
use wagonflow_core::error::ConfigError;
use wagonflow_core::network::{Network, NetworkInput};

use crate::schema::{DestinationData, OriginData, RelationData, network_input};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during scenario loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A relation's profitability flag is neither a boolean nor 0/1.
    #[error("relation {origin} -> {destination} in {file} has an invalid profitability flag")]
    InvalidFlag {
        file: PathBuf,
        origin: String,
        destination: String,
    },

    /// The tables parsed but describe an invalid network or config.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = &found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Scenario
// ===========================================================================

/// A loaded scenario: the raw rows, the validated network and the run config.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub input: NetworkInput,
    pub network: Network,
    pub config: SimConfig,
}

impl Scenario {
    /// A validated simulation for this scenario's own config.
    pub fn simulation(&self) -> Result<Simulation, ConfigError> {
        Simulation::new(&self.network, self.config.clone())
    }

    /// A validated simulation for another config over the same network.
    pub fn simulation_with(&self, config: SimConfig) -> Result<Simulation, ConfigError> {
        Simulation::new(&self.network, config)
    }
}

/// Read only the three network tables from `dir`.
pub fn load_network_input(dir: &Path) -> Result<NetworkInput, DataLoadError> {
    let origins_path = require_data_file(dir, "origins")?;
    let destinations_path = require_data_file(dir, "destinations")?;
    let relations_path = require_data_file(dir, "relations")?;

    let origins: Vec<OriginData> = deserialize_list(&origins_path, "origins")?;
    let destinations: Vec<DestinationData> = deserialize_list(&destinations_path, "destinations")?;
    let relation_rows: Vec<RelationData> = deserialize_list(&relations_path, "relations")?;

    let relations = relation_rows
        .into_iter()
        .map(|row| {
            let (origin, destination) = (row.origin.clone(), row.destination.clone());
            row.into_input().ok_or_else(|| DataLoadError::InvalidFlag {
                file: relations_path.clone(),
                origin,
                destination,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(network_input(origins, destinations, relations))
}

/// Load a scenario directory, validating network and config.
pub fn load_scenario(dir: &Path) -> Result<Scenario, DataLoadError> {
    let input = load_network_input(dir)?;
    let config: SimConfig = match find_data_file(dir, "config")? {
        Some(path) => deserialize_file(&path)?,
        None => SimConfig::default(),
    };
    config.validate()?;
    let network = Network::from_input(&input)?;

    info!(
        dir = %dir.display(),
        origins = input.origins.len(),
        destinations = input.destinations.len(),
        relations = input.relations.len(),
        heuristic = config.heuristic.name(),
        "scenario loaded"
    );
    Ok(Scenario {
        input,
        network,
        config,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
