use std::path::PathBuf;

use harvester_core::Cancelled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
