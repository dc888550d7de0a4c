//! Prepares soccer action tables for model training: loads the event feature
//! tables, selects per-task feature profiles, and partitions the rows per team
//! or per player into train/test features and targets.

pub mod error;
pub mod io;
pub mod preprocess;
pub mod profile;
pub mod table;

pub use error::{Error, Result};
pub use io::{load_csv, load_data, read_csv, DataConfig, LoadedData};
pub use preprocess::{
    create_player_classification_data, create_player_data, create_player_regression_data,
    create_team_data, ClassificationSplit, PlayerSplit, PlayerTask, TrainTestSplit,
};
pub use profile::{EncodedFeatures, FeatureProfile, Granularity, Mode, ProfileAudit, Task, TaskKind};
pub use table::{Cell, Column, Table};
