//! Line-oriented input files (credentials and proxies)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Credential;
use crate::proxy::EgressEndpoint;

/// Errors reading batch input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No entries found in {0}")]
    Empty(PathBuf),
}

/// Read non-blank, trimmed lines
pub fn read_lines(path: &Path) -> Result<Vec<String>, InputError> {
    let content = fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    debug!(path = %path.display(), count = lines.len(), "read_lines: done");
    Ok(lines)
}

/// Load the credential batch; an empty file is an error
pub fn load_credentials(path: &Path) -> Result<Vec<Credential>, InputError> {
    let lines = read_lines(path)?;
    if lines.is_empty() {
        return Err(InputError::Empty(path.to_path_buf()));
    }
    info!(count = lines.len(), path = %path.display(), "loaded credentials");
    Ok(lines.into_iter().map(Credential::new).collect())
}

/// Load egress endpoints
///
/// Returns None when the file does not exist (direct egress). Any other read
/// failure is an error.
pub fn load_endpoints(path: &Path) -> Result<Option<Vec<EgressEndpoint>>, InputError> {
    if !path.exists() {
        debug!(path = %path.display(), "load_endpoints: file missing");
        return Ok(None);
    }
    let endpoints: Vec<EgressEndpoint> = read_lines(path)?.into_iter().map(EgressEndpoint::new).collect();
    info!(count = endpoints.len(), path = %path.display(), "loaded proxies");
    Ok(Some(endpoints))
}
