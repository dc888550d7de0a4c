// Dataset partitioning: filter the event tables to one team or player, drop incomplete
// rows, and split them into features and targets.
use tracing::{debug, warn};

use crate::error::Result;
use crate::profile::{lag_column, Task, TaskKind, LAG_DEPTH};
pub use crate::profile::{ACTION_TARGET, END_ZONE_TARGET};
use crate::table::{Column, Table};

/// Column holding the acting player.
pub const PLAYER_COLUMN: &str = "player_id";

/// Features and one target for train and test.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Table,
    pub y_train: Column,
    pub x_test: Table,
    pub y_test: Column,
}

impl TrainTestSplit {
    /// True when the filter matched no complete training row.
    pub fn is_empty(&self) -> bool {
        self.x_train.is_empty()
    }
}

/// Features plus the action and end-zone labels for train and test.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationSplit {
    pub x_train: Table,
    pub y_train_action: Column,
    pub y_train_end_zone: Column,
    pub x_test: Table,
    pub y_test_action: Column,
    pub y_test_end_zone: Column,
}

impl ClassificationSplit {
    pub fn is_empty(&self) -> bool {
        self.x_train.is_empty()
    }
}

/// What a player partition is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerTask {
    /// Both labels, with rows following the player's own action removed.
    Classification,
    /// One regression target, e.g. `vaep_value` or `xT_value`.
    Regression { target: String },
}

impl PlayerTask {
    pub fn for_task(task: Task) -> PlayerTask {
        match task.kind() {
            TaskKind::Classification => PlayerTask::Classification,
            TaskKind::Regression => PlayerTask::Regression {
                target: task.target().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSplit {
    Classification(ClassificationSplit),
    Regression(TrainTestSplit),
}

/// The five `n-k_same_player` flag columns.
pub fn same_player_flags() -> Vec<String> {
    (1..=LAG_DEPTH)
        .map(|lag| lag_column(lag, "same_player"))
        .collect()
}

/// Rows with `key_col == id` and no missing cell.
fn complete_rows_for(table: &Table, key_col: &str, id: i64) -> Result<Table> {
    let key = table.column_index(key_col)?;
    Ok(table.filter(|row| row[key].matches_id(id)).drop_nulls())
}

fn split_target(set: &Table, target: &str) -> Result<(Table, Column)> {
    let y = set.column(target)?;
    let x = set.drop_columns(&[target])?;
    Ok((x, y))
}

fn log_partition(kind: &str, key_col: &str, id: i64, train: &Table, test: &Table) {
    if train.is_empty() || test.is_empty() {
        warn!(
            kind,
            key_col,
            id,
            train_rows = train.height(),
            test_rows = test.height(),
            "partition has no complete rows"
        );
    } else {
        debug!(
            kind,
            key_col,
            id,
            train_rows = train.height(),
            test_rows = test.height(),
            "partitioned"
        );
    }
}

/// Split train and test to the rows of one team.
/// input: filter column, team id, train/test tables, target column
/// output: X_train, y_train, X_test, y_test; empty when the team has no complete rows
pub fn create_team_data(
    team_col: &str,
    team_id: i64,
    train_df: &Table,
    test_df: &Table,
    target: &str,
) -> Result<TrainTestSplit> {
    // 1) Filter each table to the team and drop incomplete rows
    let team_train_set = complete_rows_for(train_df, team_col, team_id)?;
    let team_test_set = complete_rows_for(test_df, team_col, team_id)?;
    log_partition("team", team_col, team_id, &team_train_set, &team_test_set);

    // 2) Separate features from the target
    let (x_train, y_train) = split_target(&team_train_set, target)?;
    let (x_test, y_test) = split_target(&team_test_set, target)?;

    Ok(TrainTestSplit {
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

/// Split train and test to one player's actions, dispatching on the task.
pub fn create_player_data(
    task: &PlayerTask,
    train_df: &Table,
    test_df: &Table,
    player_id: i64,
) -> Result<PlayerSplit> {
    match task {
        PlayerTask::Classification => {
            create_player_classification_data(train_df, test_df, player_id)
                .map(PlayerSplit::Classification)
        }
        PlayerTask::Regression { target } => {
            create_player_regression_data(train_df, test_df, player_id, target)
                .map(PlayerSplit::Regression)
        }
    }
}

/// Rows of one player that do not follow one of the player's own actions.
fn uncontaminated_player_rows(table: &Table, player_id: i64) -> Result<Table> {
    let player = table.column_index(PLAYER_COLUMN)?;
    let flags = same_player_flags()
        .iter()
        .map(|flag| table.column_index(flag))
        .collect::<Result<Vec<_>>>()?;

    Ok(table
        .filter(|row| row[player].matches_id(player_id) && !flags.iter().any(|&f| row[f].is_true()))
        .drop_nulls())
}

/// Player partition with both classification labels. Rows whose lag window holds an
/// action by the same player are removed.
pub fn create_player_classification_data(
    train_df: &Table,
    test_df: &Table,
    player_id: i64,
) -> Result<ClassificationSplit> {
    let player_train_set = uncontaminated_player_rows(train_df, player_id)?;
    let player_test_set = uncontaminated_player_rows(test_df, player_id)?;
    log_partition(
        "player-classification",
        PLAYER_COLUMN,
        player_id,
        &player_train_set,
        &player_test_set,
    );

    let targets = [ACTION_TARGET, END_ZONE_TARGET];
    Ok(ClassificationSplit {
        x_train: player_train_set.drop_columns(&targets)?,
        y_train_action: player_train_set.column(ACTION_TARGET)?,
        y_train_end_zone: player_train_set.column(END_ZONE_TARGET)?,
        x_test: player_test_set.drop_columns(&targets)?,
        y_test_action: player_test_set.column(ACTION_TARGET)?,
        y_test_end_zone: player_test_set.column(END_ZONE_TARGET)?,
    })
}

/// Player partition with a single regression target.
pub fn create_player_regression_data(
    train_df: &Table,
    test_df: &Table,
    player_id: i64,
    reg_target: &str,
) -> Result<TrainTestSplit> {
    let player_train_set = complete_rows_for(train_df, PLAYER_COLUMN, player_id)?;
    let player_test_set = complete_rows_for(test_df, PLAYER_COLUMN, player_id)?;
    log_partition(
        "player-regression",
        PLAYER_COLUMN,
        player_id,
        &player_train_set,
        &player_test_set,
    );

    let (x_train, y_train) = split_target(&player_train_set, reg_target)?;
    let (x_test, y_test) = split_target(&player_test_set, reg_target)?;

    Ok(TrainTestSplit {
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::io::read_csv;
    use crate::table::Cell;

    /// Ten rows, three of team 5, one of which is missing `start_x`.
    fn team_table() -> Result<Table> {
        read_csv(
            "game_id,team_id,player_id,start_x,vaep_value\n\
             1,5,10,1.0,0.1\n\
             1,7,20,2.0,0.2\n\
             1,5,11,,0.3\n\
             1,7,21,4.0,0.4\n\
             1,7,20,5.0,0.5\n\
             1,5,10,6.0,0.6\n\
             2,8,30,7.0,0.7\n\
             2,8,31,8.0,0.8\n\
             2,9,40,9.0,0.9\n\
             2,9,41,10.0,1.0\n"
                .as_bytes(),
            "team",
        )
    }

    fn player_table() -> Result<Table> {
        let mut text = String::from(
            "player_id,start_x,type_name_encoded,end_pitch_zone,vaep_value",
        );
        for flag in same_player_flags() {
            text.push(',');
            text.push_str(&flag);
        }
        text.push('\n');
        for line in [
            "10,1.0,3,7,0.10,False,False,False,False,False",
            "10,2.0,4,8,0.20,True,False,False,False,False",
            "10,3.0,1,2,0.30,False,False,False,False,1.0",
            "10,4.0,2,5,0.40,False,False,,False,False",
            "10,5.0,5,6,0.50,False,False,False,False,False",
            "11,6.0,3,1,0.60,False,False,False,False,False",
            "10,,3,1,0.70,False,False,False,False,False",
        ] {
            text.push_str(line);
            text.push('\n');
        }
        read_csv(text.as_bytes(), "player")
    }

    #[test]
    fn test_team_scenario_drops_incomplete_row() -> Result<()> {
        let train = team_table()?;
        let test = team_table()?;
        let split = create_team_data("team_id", 5, &train, &test, "vaep_value")?;

        assert_eq!(split.x_train.height(), 2);
        assert_eq!(split.y_train.len(), 2);
        assert_eq!(split.y_train.values, vec![Cell::Float(0.1), Cell::Float(0.6)]);
        assert_eq!(split.x_test.height(), 2);
        Ok(())
    }

    #[test]
    fn test_team_columns_preserved_and_filtered() -> Result<()> {
        let train = team_table()?;
        let split = create_team_data("team_id", 7, &train, &train, "vaep_value")?;

        let mut cols: Vec<String> = split.x_train.columns().to_vec();
        cols.push(split.y_train.name.clone());
        cols.sort();
        let mut expected = train.columns().to_vec();
        expected.sort();
        assert_eq!(cols, expected);

        let team = split.x_train.column_index("team_id")?;
        assert!(split.x_train.rows().iter().all(|r| r[team].matches_id(7)));
        assert_eq!(split.x_train.height(), 3);
        Ok(())
    }

    #[test]
    fn test_team_without_rows_is_empty_not_error() -> Result<()> {
        let train = team_table()?;
        let split = create_team_data("team_id", 99, &train, &train, "vaep_value")?;
        assert!(split.is_empty());
        assert!(split.y_test.is_empty());
        assert_eq!(split.x_train.width(), train.width() - 1);
        Ok(())
    }

    #[test]
    fn test_team_missing_columns_are_errors() -> Result<()> {
        let train = team_table()?;
        assert!(matches!(
            create_team_data("club_id", 5, &train, &train, "vaep_value"),
            Err(Error::MissingColumn(c)) if c == "club_id"
        ));
        assert!(matches!(
            create_team_data("team_id", 5, &train, &train, "xT_value"),
            Err(Error::MissingColumn(c)) if c == "xT_value"
        ));
        Ok(())
    }

    #[test]
    fn test_partitioning_is_idempotent_and_pure() -> Result<()> {
        let train = team_table()?;
        let before = train.clone();
        let a = create_team_data("team_id", 5, &train, &train, "vaep_value")?;
        let b = create_team_data("team_id", 5, &train, &train, "vaep_value")?;
        assert_eq!(a, b);
        assert_eq!(train, before);
        Ok(())
    }

    #[test]
    fn test_player_partitions_are_idempotent_and_pure() -> Result<()> {
        let table = player_table()?;
        let before = table.clone();

        let a = create_player_classification_data(&table, &table, 10)?;
        let b = create_player_classification_data(&table, &table, 10)?;
        assert_eq!(a, b);

        let a = create_player_regression_data(&table, &table, 10, "vaep_value")?;
        let b = create_player_regression_data(&table, &table, 10, "vaep_value")?;
        assert_eq!(a, b);

        assert_eq!(table, before);
        Ok(())
    }

    #[test]
    fn test_player_classification_removes_same_player_rows() -> Result<()> {
        let table = player_table()?;
        let split = create_player_classification_data(&table, &table, 10)?;

        // rows 1 and 5 survive; 2 and 3 have a flag set, 4 and 7 are incomplete
        assert_eq!(split.x_train.height(), 2);
        assert_eq!(split.y_train_action.values, vec![Cell::Int(3), Cell::Int(5)]);
        assert_eq!(split.y_train_end_zone.values, vec![Cell::Int(7), Cell::Int(6)]);

        let flags = same_player_flags()
            .iter()
            .map(|f| split.x_train.column_index(f))
            .collect::<Result<Vec<_>>>()?;
        assert!(split
            .x_train
            .rows()
            .iter()
            .all(|row| flags.iter().all(|&f| !row[f].is_true())));

        assert!(!split.x_train.has_column(ACTION_TARGET));
        assert!(!split.x_train.has_column(END_ZONE_TARGET));
        assert_eq!(split.x_test, split.x_train);
        Ok(())
    }

    #[test]
    fn test_player_classification_needs_flags() -> Result<()> {
        let table = team_table()?;
        assert!(matches!(
            create_player_classification_data(&table, &table, 10),
            Err(Error::MissingColumn(c)) if c == "n-1_same_player"
        ));
        Ok(())
    }

    #[test]
    fn test_player_regression_targets_in_row_order() -> Result<()> {
        let table = player_table()?;
        let split = create_player_regression_data(&table, &table, 10, "vaep_value")?;

        // flags are ignored for regression; only the two incomplete rows go
        assert_eq!(split.x_train.height(), 4);
        assert_eq!(
            split.y_train.values,
            vec![
                Cell::Float(0.1),
                Cell::Float(0.2),
                Cell::Float(0.3),
                Cell::Float(0.5),
            ]
        );
        let start = split.x_train.column("start_x")?;
        assert_eq!(
            start.values,
            vec![Cell::Float(1.0), Cell::Float(2.0), Cell::Float(3.0), Cell::Float(5.0)]
        );
        assert!(!split.x_train.has_column("vaep_value"));
        Ok(())
    }

    #[test]
    fn test_player_dispatch_follows_task() -> Result<()> {
        let table = player_table()?;

        let split = create_player_data(&PlayerTask::for_task(Task::End), &table, &table, 10)?;
        assert!(matches!(split, PlayerSplit::Classification(_)));

        let task = PlayerTask::for_task(Task::Vaep);
        assert_eq!(task, PlayerTask::Regression { target: "vaep_value".into() });
        match create_player_data(&task, &table, &table, 10)? {
            PlayerSplit::Regression(s) => assert_eq!(s.y_train.name, "vaep_value"),
            other => panic!("expected regression split, got {other:?}"),
        }
        Ok(())
    }
}
