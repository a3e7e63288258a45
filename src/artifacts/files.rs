//! Readers for the artifact files written by the offline batch job.
//!
//! Layout of one cohort directory:
//!
//! ```text
//! config.json
//! player_neighbors.csv
//! <season_id>/cluster_to_role.json
//! <season_id>/role_descriptions.json
//! <season_id>/player_style_vectors.csv
//! <season_id>/player_cluster_probs.csv
//! ```

use super::error::{DataIntegrityError, IntegrityResult};
use super::models::{ClusterId, NeighborEdge, PlayerInfo, PlayerSeasonKey, RoleMapping};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_FILE: &str = "config.json";
pub const NEIGHBORS_FILE: &str = "player_neighbors.csv";
pub const ROLE_MAPPING_FILE: &str = "cluster_to_role.json";
pub const ROLE_DESCRIPTIONS_FILE: &str = "role_descriptions.json";
pub const STYLE_VECTORS_FILE: &str = "player_style_vectors.csv";
pub const CLUSTER_PROBS_FILE: &str = "player_cluster_probs.csv";

const EMBEDDING_COLUMN_PREFIX: &str = "pca_";
const CLUSTER_COLUMN_PREFIX: &str = "cluster_";

/// Cohort-wide settings written next to the season directories.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfigFile {
    pub cluster_to_role: Option<BTreeMap<String, String>>,
    pub role_descriptions: Option<HashMap<String, String>>,
    pub minutes_threshold: Option<u32>,
    pub n_components_pca: Option<usize>,
    pub n_clusters_gmm: Option<usize>,
}

/// One row of `player_style_vectors.csv`.
#[derive(Debug, Clone)]
pub struct StyleRow {
    pub key: PlayerSeasonKey,
    pub info: PlayerInfo,
    pub values: Vec<f64>,
}

/// One row of `player_cluster_probs.csv`.
#[derive(Debug, Clone)]
pub struct PosteriorRow {
    pub key: PlayerSeasonKey,
    pub probabilities: BTreeMap<ClusterId, f64>,
}

/// Reads and deserializes a JSON artifact. A missing file is `Ok(None)`,
/// callers decide whether that is acceptable.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> IntegrityResult<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|err| unreadable(path, err))?;
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|err| unreadable(path, err))
}

/// JSON object keys are strings, cluster ids are not.
pub fn parse_role_mapping(
    path: &Path,
    raw: BTreeMap<String, String>,
) -> IntegrityResult<RoleMapping> {
    let mut roles = BTreeMap::new();
    for (index, (cluster, role)) in raw.into_iter().enumerate() {
        let cluster = cluster
            .trim()
            .parse::<ClusterId>()
            .map_err(|_| DataIntegrityError::MalformedRecord {
                path: path.to_owned(),
                record: index + 1,
                reason: format!("cluster id \"{}\" is not a non-negative integer", cluster),
            })?;
        roles.insert(cluster, role);
    }
    Ok(RoleMapping::new(roles))
}

pub fn read_style_vectors(path: &Path) -> IntegrityResult<Vec<StyleRow>> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers().map_err(|err| unreadable(path, err))?.clone();

    let player_col = required_column(path, &headers, "player_id")?;
    let season_col = required_column(path, &headers, "season_id")?;
    let name_col = column(&headers, "player_name");
    let team_col = column(&headers, "team_id");
    let team_name_col = column(&headers, "team_name");
    let minutes_col = column(&headers, "minutes");
    let value_cols: Vec<usize> = indexed_columns(&headers, EMBEDDING_COLUMN_PREFIX)
        .into_iter()
        .map(|(_, col)| col)
        .collect();
    if value_cols.is_empty() {
        return Err(DataIntegrityError::MalformedRecord {
            path: path.to_owned(),
            record: 0,
            reason: format!("no {}* columns", EMBEDDING_COLUMN_PREFIX),
        });
    }

    let mut rows = vec![];
    for (index, record) in reader.records().enumerate() {
        let record_no = index + 1;
        let record = record.map_err(|err| unreadable(path, err))?;
        let key = PlayerSeasonKey::new(
            parse_field(path, record_no, &record, player_col)?,
            parse_field(path, record_no, &record, season_col)?,
        );
        let mut values = Vec::with_capacity(value_cols.len());
        for col in value_cols.iter() {
            values.push(parse_field::<f64>(path, record_no, &record, *col)?);
        }
        let info = PlayerInfo {
            player_name: optional_text(&record, name_col),
            team_id: optional_whole_number(&record, team_col),
            team_name: optional_text(&record, team_name_col),
            minutes: optional_whole_number(&record, minutes_col)
                .and_then(|m| u32::try_from(m).ok()),
        };
        rows.push(StyleRow { key, info, values });
    }
    Ok(rows)
}

pub fn read_cluster_probs(path: &Path) -> IntegrityResult<Vec<PosteriorRow>> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers().map_err(|err| unreadable(path, err))?.clone();

    let player_col = required_column(path, &headers, "player_id")?;
    let season_col = required_column(path, &headers, "season_id")?;
    let cluster_cols = indexed_columns(&headers, CLUSTER_COLUMN_PREFIX);
    if cluster_cols.is_empty() {
        return Err(DataIntegrityError::MalformedRecord {
            path: path.to_owned(),
            record: 0,
            reason: format!("no {}* columns", CLUSTER_COLUMN_PREFIX),
        });
    }

    let mut rows = vec![];
    for (index, record) in reader.records().enumerate() {
        let record_no = index + 1;
        let record = record.map_err(|err| unreadable(path, err))?;
        let key = PlayerSeasonKey::new(
            parse_field(path, record_no, &record, player_col)?,
            parse_field(path, record_no, &record, season_col)?,
        );
        let mut probabilities = BTreeMap::new();
        for (cluster, col) in cluster_cols.iter() {
            probabilities.insert(*cluster, parse_field::<f64>(path, record_no, &record, *col)?);
        }
        rows.push(PosteriorRow { key, probabilities });
    }
    Ok(rows)
}

pub fn read_neighbors(path: &Path) -> IntegrityResult<Vec<NeighborEdge>> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers().map_err(|err| unreadable(path, err))?.clone();

    let anchor_player = required_column(path, &headers, "anchor_player_id")?;
    let anchor_season = required_column(path, &headers, "anchor_season_id")?;
    let neighbor_player = required_column(path, &headers, "neighbor_player_id")?;
    let neighbor_season = required_column(path, &headers, "neighbor_season_id")?;
    let similarity = required_column(path, &headers, "cosine_sim")?;

    let mut edges = vec![];
    for (index, record) in reader.records().enumerate() {
        let record_no = index + 1;
        let record = record.map_err(|err| unreadable(path, err))?;
        edges.push(NeighborEdge {
            source: PlayerSeasonKey::new(
                parse_field(path, record_no, &record, anchor_player)?,
                parse_field(path, record_no, &record, anchor_season)?,
            ),
            target: PlayerSeasonKey::new(
                parse_field(path, record_no, &record, neighbor_player)?,
                parse_field(path, record_no, &record, neighbor_season)?,
            ),
            similarity: parse_field(path, record_no, &record, similarity)?,
        });
    }
    Ok(edges)
}

fn open_csv(path: &Path) -> IntegrityResult<csv::Reader<std::fs::File>> {
    if !path.is_file() {
        return Err(DataIntegrityError::MissingArtifact {
            path: path.to_owned(),
        });
    }
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| unreadable(path, err))
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> DataIntegrityError {
    DataIntegrityError::Unreadable {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn required_column(path: &Path, headers: &StringRecord, name: &str) -> IntegrityResult<usize> {
    column(headers, name).ok_or_else(|| DataIntegrityError::MalformedRecord {
        path: path.to_owned(),
        record: 0,
        reason: format!("missing column \"{}\"", name),
    })
}

/// Columns named `<prefix><n>`, sorted by `n`.
fn indexed_columns(headers: &StringRecord, prefix: &str) -> Vec<(u32, usize)> {
    let mut columns: Vec<(u32, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(col, name)| {
            name.strip_prefix(prefix)
                .and_then(|n| n.parse::<u32>().ok())
                .map(|n| (n, col))
        })
        .collect();
    columns.sort();
    columns
}

fn parse_field<T: FromStr>(
    path: &Path,
    record_no: usize,
    record: &StringRecord,
    col: usize,
) -> IntegrityResult<T> {
    let raw = record.get(col).unwrap_or("");
    raw.parse::<T>()
        .map_err(|_| DataIntegrityError::MalformedRecord {
            path: path.to_owned(),
            record: record_no,
            reason: format!("invalid value \"{}\" in column {}", raw, col),
        })
}

fn optional_text(record: &StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| record.get(c))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

// pandas writes nullable integer columns as floats ("100.0").
fn optional_whole_number(record: &StringRecord, col: Option<usize>) -> Option<u64> {
    let raw = col.and_then(|c| record.get(c)).filter(|s| !s.is_empty())?;
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.round() as u64)
    })
}
