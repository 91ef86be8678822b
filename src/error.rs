use std::path::PathBuf;

use thiserror::Error;

/// Environment and configuration faults. These abort the run; a policy
/// failure is not an error and is reported through `Verdict` instead.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to run linter `{program}`")]
    LinterSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `detail` is empty or a parenthesised explanation.
    #[error("no release tags found{detail}")]
    NoTags { detail: String },

    #[error("tag `{0}` does not exist")]
    TagNotFound(String),

    #[error("invalid exclude pattern `{pattern}`")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid config file {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
