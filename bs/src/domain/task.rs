//! Task and credential types

use std::fmt;

use tracing::debug;

/// Opaque secret material identifying one task
///
/// The secret never appears in `Debug` output; use [`Credential::expose`]
/// where the raw value is genuinely needed (derivation and the result logs).
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the raw secret
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

/// Per-credential unit of work
///
/// Mutated only by the retry controller that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// 1-based position in the input batch
    pub index: usize,

    /// Secret this task submits with
    pub credential: Credential,

    /// Index into the shared endpoint list (None = direct egress)
    pub proxy_cursor: Option<usize>,

    /// Budgeted attempt number, starting at 1
    pub attempt: u32,

    /// Number of endpoint rotations performed
    pub rotations: u32,

    /// Number of rate-limit signals received (these do not consume `attempt`)
    pub rate_limited: u32,
}

impl Task {
    /// Create a task with its initial endpoint cursor
    pub fn new(index: usize, credential: Credential, proxy_cursor: Option<usize>) -> Self {
        Self {
            index,
            credential,
            proxy_cursor,
            attempt: 1,
            rotations: 0,
            rate_limited: 0,
        }
    }

    /// Build one task per credential
    ///
    /// Indices are 1-based; the cursor starts at `index mod endpoint_count`
    /// when endpoints exist.
    pub fn batch(credentials: Vec<Credential>, endpoint_count: usize) -> Vec<Task> {
        debug!(count = credentials.len(), endpoint_count, "Task::batch: called");
        credentials
            .into_iter()
            .enumerate()
            .map(|(i, credential)| {
                let index = i + 1;
                let cursor = (endpoint_count > 0).then(|| index % endpoint_count);
                Task::new(index, credential, cursor)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("deadbeef");
        assert_eq!(format!("{:?}", cred), "Credential(***)");
        assert_eq!(cred.expose(), "deadbeef");
    }

    #[test]
    fn test_batch_assigns_cursors() {
        let creds = vec!["a".into(), "b".into(), "c".into()];
        let tasks = Task::batch(creds, 2);

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].index, 1);
        assert_eq!(tasks[0].proxy_cursor, Some(1));
        assert_eq!(tasks[1].proxy_cursor, Some(0));
        assert_eq!(tasks[2].proxy_cursor, Some(1));
        assert!(tasks.iter().all(|t| t.attempt == 1 && t.rotations == 0));
    }

    #[test]
    fn test_batch_without_endpoints() {
        let tasks = Task::batch(vec!["a".into()], 0);
        assert_eq!(tasks[0].proxy_cursor, None);
    }
}
