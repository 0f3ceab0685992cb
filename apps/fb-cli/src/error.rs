//! Error type for the command-line front end.

use std::path::PathBuf;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read scenario file: {path}")]
    ScenarioRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse scenario file: {path}: {source}")]
    ScenarioParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error(transparent)]
    Graph(#[from] fb_graph::GraphError),

    #[error(transparent)]
    Sched(#[from] fb_sched::SchedError),

    #[error("Results error: {0}")]
    Results(#[from] fb_results::ResultsError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
