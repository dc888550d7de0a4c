// Module for loading the event feature tables. It reads each configured csv file,
// checks row widths against the header, and keeps missing values as missing cells.
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::profile::Task;
use crate::table::{Cell, Table};

/// Paths of the nine input datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub xt: PathBuf,
    pub xt_test: PathBuf,
    pub vaep: PathBuf,
    pub vaep_test: PathBuf,
    pub games: PathBuf,
    pub games_test: PathBuf,
    pub players: PathBuf,
    pub players_test: PathBuf,
    pub target_players: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::with_root("data")
    }
}

impl DataConfig {
    /// Default file names under `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        DataConfig {
            xt: root.join("xt.csv"),
            xt_test: root.join("xt_test.csv"),
            vaep: root.join("vaep.csv"),
            vaep_test: root.join("vaep_test.csv"),
            games: root.join("games.csv"),
            games_test: root.join("games_test.csv"),
            players: root.join("players.csv"),
            players_test: root.join("players_test.csv"),
            target_players: root.join("target_players.csv"),
        }
    }

    /// Read a JSON config; fields left out keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The loaded train and test tables plus metadata.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub xt: Table,
    pub xt_test: Table,
    pub vaep: Table,
    pub vaep_test: Table,
    pub games: Table,
    pub games_test: Table,
    pub players: Table,
    pub players_test: Table,
    pub target_players: Table,
}

impl LoadedData {
    /// Train and test event tables for `task`: xT tables for the xT task, VAEP tables otherwise.
    pub fn event_tables(&self, task: Task) -> (&Table, &Table) {
        match task {
            Task::Xt => (&self.xt, &self.xt_test),
            Task::Action | Task::Vaep | Task::End => (&self.vaep, &self.vaep_test),
        }
    }
}

/// Load every configured table. The first unreadable file aborts the load.
pub fn load_data(config: &DataConfig) -> Result<LoadedData> {
    Ok(LoadedData {
        xt: load_csv(&config.xt)?,
        xt_test: load_csv(&config.xt_test)?,
        vaep: load_csv(&config.vaep)?,
        vaep_test: load_csv(&config.vaep_test)?,
        games: load_csv(&config.games)?,
        games_test: load_csv(&config.games_test)?,
        players: load_csv(&config.players)?,
        players_test: load_csv(&config.players_test)?,
        target_players: load_csv(&config.target_players)?,
    })
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_csv(file, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        rows = table.height(),
        columns = table.width(),
        "loaded table"
    );
    Ok(table)
}

/// Parse csv text from any reader. `origin` names the source in errors and logs.
pub fn read_csv<R: Read>(reader: R, origin: &str) -> Result<Table> {
    let csv_err = |source| Error::Csv {
        origin: origin.to_string(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    let expected_len = columns.len();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let raw: StringRecord = result.map_err(csv_err)?;

        if raw.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        if raw.len() != expected_len {
            warn!(
                origin,
                line = raw.position().map(|p| p.line()).unwrap_or(0),
                expected = expected_len,
                found = raw.len(),
                "skipping record with wrong field count"
            );
            continue;
        }

        rows.push(raw.iter().map(Cell::parse).collect());
    }

    Table::new(columns, rows)
}
