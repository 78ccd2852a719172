use std::path::PathBuf;

use thiserror::Error;

use crate::model::TeamId;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("no events or participation found for team {team_id}")]
    NoDataForTeam { team_id: TeamId },

    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MetricsError>;
