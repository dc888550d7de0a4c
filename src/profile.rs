//! Feature profiles per prediction task.
//!
//! A profile splits the event columns into numeric features, categorical
//! features and columns to drop before training. Player and team models of
//! the same task share one profile. Each drop list removes the columns that
//! would leak the predicted value into the features.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::table::Table;

/// Encoded action type, the next-action label.
pub const ACTION_TARGET: &str = "type_name_encoded";
/// End pitch zone label.
pub const END_ZONE_TARGET: &str = "end_pitch_zone";

/// Number of previous actions carried as lag features.
pub const LAG_DEPTH: u8 = 5;

/// Name of a lag column, e.g. `n-3_start_x`.
pub fn lag_column(lag: u8, field: &str) -> String {
    format!("n-{lag}_{field}")
}

/// `fields` repeated for lags 1 through 5.
fn lagged(fields: &[&str]) -> Vec<String> {
    (1..=LAG_DEPTH)
        .flat_map(|lag| fields.iter().map(move |f| lag_column(lag, f)))
        .collect()
}

/// `fields` repeated for lags 5 down to 1.
fn lagged_rev(fields: &[&str]) -> Vec<String> {
    (1..=LAG_DEPTH)
        .rev()
        .flat_map(|lag| fields.iter().map(move |f| lag_column(lag, f)))
        .collect()
}

fn names(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Event-level identifiers that never enter a model.
const IDENTIFIERS: &[&str] = &[
    "original_event_id",
    "game_id",
    "player_id",
    "team_id",
    "type_id",
    "result_id",
    "bodypart_id",
    "action_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Next action type (classification).
    Action,
    /// Combined VAEP value (regression).
    Vaep,
    /// End pitch zone (classification).
    End,
    /// Expected threat value (regression).
    Xt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Classification,
    Regression,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Action, Task::Vaep, Task::End, Task::Xt];

    /// Column the task predicts.
    pub fn target(self) -> &'static str {
        match self {
            Task::Action => ACTION_TARGET,
            Task::Vaep => "vaep_value",
            Task::End => END_ZONE_TARGET,
            Task::Xt => "xT_value",
        }
    }

    /// Every label column an event table carries for this task. Classification
    /// tables hold both the action and end-zone labels.
    pub fn targets(self) -> &'static [&'static str] {
        match self {
            Task::Action | Task::End => &[ACTION_TARGET, END_ZONE_TARGET],
            Task::Vaep => &["vaep_value"],
            Task::Xt => &["xT_value"],
        }
    }

    pub fn kind(self) -> TaskKind {
        match self {
            Task::Action | Task::End => TaskKind::Classification,
            Task::Vaep | Task::Xt => TaskKind::Regression,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Task::Action => "action",
            Task::Vaep => "vaep",
            Task::End => "end",
            Task::Xt => "xt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Player,
    Team,
}

/// One of the eight `player-*` / `team-*` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    pub granularity: Granularity,
    pub task: Task,
}

impl Mode {
    pub fn all() -> impl Iterator<Item = Mode> {
        [Granularity::Player, Granularity::Team]
            .into_iter()
            .flat_map(|granularity| Task::ALL.into_iter().map(move |task| Mode { granularity, task }))
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || Error::UnknownMode(s.to_string());
        let (prefix, suffix) = s.split_once('-').ok_or_else(unknown)?;
        let granularity = match prefix {
            "player" => Granularity::Player,
            "team" => Granularity::Team,
            _ => return Err(unknown()),
        };
        let task = match suffix {
            "action" => Task::Action,
            "vaep" => Task::Vaep,
            "end" => Task::End,
            "xt" => Task::Xt,
            _ => return Err(unknown()),
        };
        Ok(Mode { granularity, task })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.granularity {
            Granularity::Player => "player",
            Granularity::Team => "team",
        };
        write!(f, "{prefix}-{}", self.task.as_str())
    }
}

/// Column lists for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureProfile {
    pub task: Task,
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub drop: Vec<String>,
}

/// Result of checking a profile against a concrete table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileAudit {
    /// Listed in more than one of the three lists.
    pub overlapping: Vec<String>,
    /// In the table but in no list and not a target.
    pub unaccounted: Vec<String>,
    /// Listed as a feature but absent from the table.
    pub missing: Vec<String>,
}

impl ProfileAudit {
    pub fn is_clean(&self) -> bool {
        self.overlapping.is_empty() && self.unaccounted.is_empty() && self.missing.is_empty()
    }
}

/// Numeric and categorical features of a table, ready for a column transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    pub numeric_names: Vec<String>,
    pub numeric: Array2<f64>,
    pub categorical_names: Vec<String>,
    pub categorical: Array2<String>,
}

impl FeatureProfile {
    pub fn for_mode(mode: Mode) -> FeatureProfile {
        FeatureProfile::for_task(mode.task)
    }

    pub fn for_task(task: Task) -> FeatureProfile {
        match task {
            Task::Action => action_profile(),
            Task::Vaep => vaep_profile(),
            Task::End => end_profile(),
            Task::Xt => xt_profile(),
        }
    }

    /// Columns that appear in more than one list, in first-seen order.
    pub fn overlaps(&self) -> Vec<String> {
        let numeric: HashSet<&str> = self.numeric.iter().map(String::as_str).collect();
        let categorical: HashSet<&str> = self.categorical.iter().map(String::as_str).collect();

        let mut out: Vec<String> = Vec::new();
        let mut push = |name: &String| {
            if !out.contains(name) {
                out.push(name.clone());
            }
        };
        for name in &self.categorical {
            if numeric.contains(name.as_str()) {
                push(name);
            }
        }
        for name in &self.drop {
            if numeric.contains(name.as_str()) || categorical.contains(name.as_str()) {
                push(name);
            }
        }
        out
    }

    fn lists_contain(&self, name: &str) -> bool {
        [&self.numeric, &self.categorical, &self.drop]
            .iter()
            .any(|list| list.iter().any(|c| c == name))
    }

    /// Compare the profile with `columns`; `targets` are expected to be in no list.
    pub fn audit<S: AsRef<str>>(&self, columns: &[S], targets: &[&str]) -> ProfileAudit {
        let present: HashSet<&str> = columns.iter().map(AsRef::<str>::as_ref).collect();
        ProfileAudit {
            overlapping: self.overlaps(),
            unaccounted: columns
                .iter()
                .map(AsRef::<str>::as_ref)
                .filter(|c| !targets.contains(c) && !self.lists_contain(c))
                .map(str::to_string)
                .collect(),
            missing: self
                .numeric
                .iter()
                .chain(&self.categorical)
                .filter(|c| !present.contains(c.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Drop every drop-listed column the table has; absent ones are skipped.
    pub fn strip(&self, table: &Table) -> Result<Table> {
        let present: Vec<&str> = self
            .drop
            .iter()
            .map(String::as_str)
            .filter(|c| table.has_column(c))
            .collect();
        table.drop_columns(&present)
    }

    /// Pull the numeric and categorical columns out of `table` as arrays.
    pub fn encode(&self, table: &Table) -> Result<EncodedFeatures> {
        let numeric_table = table.select(&self.numeric)?;
        let categorical_table = table.select(&self.categorical)?;

        let mut numeric = Array2::<f64>::zeros((table.height(), self.numeric.len()));
        for (i, row) in numeric_table.rows().iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                numeric[(i, j)] = cell.as_f64().ok_or_else(|| Error::NonNumeric {
                    column: self.numeric[j].clone(),
                    row: i,
                    value: cell.to_string(),
                })?;
            }
        }

        let categorical = Array2::from_shape_fn(
            (table.height(), self.categorical.len()),
            |(i, j)| categorical_table.rows()[i][j].to_string(),
        );

        Ok(EncodedFeatures {
            numeric_names: self.numeric.clone(),
            numeric,
            categorical_names: self.categorical.clone(),
            categorical,
        })
    }
}

// Realised outcome values are consequences of the action, so they are dropped.
fn action_profile() -> FeatureProfile {
    let mut numeric = names(&["start_x", "start_y", "time_seconds"]);
    numeric.extend(lagged(&[
        "x_distance",
        "y_distance",
        "start_x",
        "start_y",
        "end_x",
        "end_y",
        "offensive_value",
        "defensive_value",
        "vaep_value",
    ]));

    let mut categorical = names(&["period_id", "start_pitch_zone", "opponent_id", "home"]);
    categorical.extend(lagged(&[
        "same_team",
        "x_fwd_direction",
        "y_lft_right_direction",
        "start_pitch_zone",
        "end_pitch_zone",
        "type_name_encoded",
        "result_name",
        "bodypart_name",
    ]));

    let mut drop = names(&[
        "original_event_id",
        "game_id",
        "player_id",
        "team_id",
        "end_x",
        "end_y",
        "type_id",
        "result_id",
        "bodypart_id",
        "action_id",
        "type_name",
        "result_name",
        "bodypart_name",
        "offensive_value",
        "defensive_value",
        "vaep_value",
        "x_dif",
        "y_dif",
    ]);
    drop.extend(lagged(&["same_player"]));

    FeatureProfile {
        task: Task::Action,
        numeric,
        categorical,
        drop,
    }
}

/// Position features shared by the two value regressions.
fn positional_numeric() -> Vec<String> {
    let mut numeric = names(&[
        "start_x",
        "start_y",
        "end_x",
        "end_y",
        "x_dif",
        "y_dif",
        "time_seconds",
    ]);
    numeric.extend(lagged(&[
        "x_distance",
        "y_distance",
        "start_x",
        "start_y",
        "end_x",
        "end_y",
    ]));
    numeric
}

/// Descriptors shared by the two value regressions.
fn descriptive_categorical() -> Vec<String> {
    let mut categorical = names(&[
        "period_id",
        "start_pitch_zone",
        "end_pitch_zone",
        "opponent_id",
        "home",
        "type_name",
        "result_name",
        "bodypart_name",
    ]);
    categorical.extend(lagged(&[
        "same_team",
        "x_fwd_direction",
        "y_lft_right_direction",
        "start_pitch_zone",
        "end_pitch_zone",
        "result_name",
        "bodypart_name",
    ]));
    categorical.extend(lagged(&["same_player"]));
    categorical
}

/// Identifiers plus the encoded action type at every lag.
fn identifiers_and_encoded_types(include_current: bool) -> Vec<String> {
    let mut drop = names(IDENTIFIERS);
    if include_current {
        drop.push("type_name_encoded".to_string());
    }
    drop.extend(lagged_rev(&["type_name_encoded"]));
    drop
}

fn vaep_profile() -> FeatureProfile {
    let mut drop = identifiers_and_encoded_types(true);
    drop.extend(names(&["offensive_value", "defensive_value"]));
    drop.extend(lagged_rev(&["offensive_value", "defensive_value", "vaep_value"]));

    FeatureProfile {
        task: Task::Vaep,
        numeric: positional_numeric(),
        categorical: descriptive_categorical(),
        drop,
    }
}

// End zones are derived from end coordinates, so those go and value fields stay.
fn end_profile() -> FeatureProfile {
    let mut numeric = names(&["start_x", "start_y", "time_seconds"]);
    numeric.extend(lagged(&["start_x", "start_y"]));
    numeric.extend(names(&["vaep_value", "offensive_value", "defensive_value"]));
    numeric.extend(lagged_rev(&["offensive_value", "defensive_value", "vaep_value"]));

    let mut categorical = names(&[
        "period_id",
        "start_pitch_zone",
        "opponent_id",
        "home",
        "type_name",
        "result_name",
        "bodypart_name",
    ]);
    categorical.extend(lagged(&[
        "same_team",
        "start_pitch_zone",
        "result_name",
        "bodypart_name",
    ]));
    categorical.extend(lagged(&["same_player"]));

    let mut drop = identifiers_and_encoded_types(false);
    drop.extend(names(&["end_x", "end_y", "x_dif", "y_dif"]));
    drop.extend(lagged(&["x_distance", "y_distance", "end_x", "end_y"]));
    drop.extend(lagged(&[
        "x_fwd_direction",
        "y_lft_right_direction",
        "end_pitch_zone",
    ]));

    FeatureProfile {
        task: Task::End,
        numeric,
        categorical,
        drop,
    }
}

fn xt_profile() -> FeatureProfile {
    let mut drop = identifiers_and_encoded_types(true);
    drop.extend(lagged(&["xT_value"]));

    FeatureProfile {
        task: Task::Xt,
        numeric: positional_numeric(),
        categorical: descriptive_categorical(),
        drop,
    }
}
