//! Append-only history of world snapshots.
//!
//! The log is a single flat sequence. Branch names are tags on commits,
//! not separate histories: forking only changes the tag applied to later
//! commits. Exactly one commit is active at any time once the log is
//! non-empty.

use crate::snapshot::WorldSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Minimum prefix length accepted by [`CommitLog::get`].
const MIN_PREFIX_LEN: usize = 4;

/// Length of the display form of a hash.
const SHORT_HASH_LEN: usize = 7;

/// Opaque random commit identifier. Not derived from content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitHash(String);

impl CommitHash {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing identifier (seeded history, tests).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 7-character display form.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(SHORT_HASH_LEN)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One checkpoint in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: CommitHash,
    pub message: String,
    pub branch: String,
    /// Wall-clock time of creation, for display.
    pub timestamp: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<WorldSnapshot>,
}

impl Commit {
    /// A commit stamped with the current local time, not yet active.
    pub fn new(message: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            hash: CommitHash::generate(),
            message: message.into(),
            branch: branch.into(),
            timestamp: display_time(),
            active: false,
            snapshot: None,
        }
    }

    pub fn with_hash(mut self, hash: CommitHash) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_snapshot(mut self, snapshot: WorldSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }

    /// Whether restoring this commit would change anything.
    pub fn is_restorable(&self) -> bool {
        self.snapshot.is_some()
    }
}

/// Result of activating a commit during restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The target had a snapshot; live state was replaced.
    Restored,
    /// The target carried no snapshot; nothing changed.
    Skipped,
}

/// The ordered commit history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitLog {
    commits: Vec<Commit>,
}

impl CommitLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a log from existing commits.
    ///
    /// The active flag is normalized: the last commit flagged active keeps
    /// it, or the tail if none was flagged.
    pub fn from_commits(mut commits: Vec<Commit>) -> Self {
        let active = commits
            .iter()
            .rposition(|c| c.active)
            .or_else(|| commits.len().checked_sub(1));
        for (i, commit) in commits.iter_mut().enumerate() {
            commit.active = Some(i) == active;
        }
        Self { commits }
    }

    /// Append a commit for `snapshot` on `branch` and make it the only
    /// active one.
    pub fn append(
        &mut self,
        snapshot: WorldSnapshot,
        message: impl Into<String>,
        branch: impl Into<String>,
    ) -> &Commit {
        let commit = Commit::new(message, branch).with_snapshot(snapshot);
        self.push_active(commit)
    }

    /// Record a fork: an ordinary commit of the unchanged `snapshot`,
    /// tagged with the new branch name.
    pub fn fork(&mut self, snapshot: WorldSnapshot, branch: impl Into<String>) -> &Commit {
        let branch = branch.into();
        let commit = Commit::new(format!("Branch Created: {branch}"), branch).with_snapshot(snapshot);
        self.push_active(commit)
    }

    /// Make the commit at `index` the active one, if it has a snapshot.
    ///
    /// Returns the snapshot to restore from, or `None` (leaving every flag
    /// untouched) when the commit has none.
    pub fn activate(&mut self, index: usize) -> Option<&WorldSnapshot> {
        if !self.commits.get(index)?.is_restorable() {
            debug!(index, "restore target has no snapshot, skipping");
            return None;
        }
        for (i, commit) in self.commits.iter_mut().enumerate() {
            commit.active = i == index;
        }
        let commit = &self.commits[index];
        debug!(hash = %commit.hash, branch = %commit.branch, "activated commit");
        commit.snapshot.as_ref()
    }

    fn push_active(&mut self, mut commit: Commit) -> &Commit {
        for existing in &mut self.commits {
            existing.active = false;
        }
        commit.active = true;
        debug!(
            hash = %commit.hash,
            branch = %commit.branch,
            message = %commit.message,
            "appended commit"
        );
        self.commits.push(commit);
        &self.commits[self.commits.len() - 1]
    }

    /// Find a commit by full hash or unique prefix.
    pub fn get(&self, hash: &str) -> Option<&Commit> {
        self.position(hash).map(|i| &self.commits[i])
    }

    /// Index of a commit by full hash or unique prefix (at least 4 chars).
    pub fn position(&self, hash: &str) -> Option<usize> {
        if let Some(i) = self.commits.iter().position(|c| c.hash.as_str() == hash) {
            return Some(i);
        }
        if hash.len() < MIN_PREFIX_LEN {
            return None;
        }
        let mut matches = self
            .commits
            .iter()
            .enumerate()
            .filter(|(_, c)| c.hash.as_str().starts_with(hash));
        match (matches.next(), matches.next()) {
            (Some((i, _)), None) => Some(i),
            _ => None,
        }
    }

    pub fn at(&self, index: usize) -> Option<&Commit> {
        self.commits.get(index)
    }

    /// The currently active commit.
    pub fn active(&self) -> Option<&Commit> {
        self.commits.iter().find(|c| c.active)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.commits.iter().position(|c| c.active)
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// The most recently appended commit.
    pub fn tail(&self) -> Option<&Commit> {
        self.commits.last()
    }

    /// Commits in causal (insertion) order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Commit> + ExactSizeIterator {
        self.commits.iter()
    }

    /// Commits newest first, the order the timeline shows them.
    pub fn history(&self) -> impl Iterator<Item = &Commit> {
        self.commits.iter().rev()
    }

    /// Commits carrying a given branch tag, oldest first.
    pub fn on_branch<'a>(&'a self, branch: &'a str) -> impl Iterator<Item = &'a Commit> {
        self.commits.iter().filter(move |c| c.branch == branch)
    }

    /// Distinct branch names in order of first appearance.
    pub fn branches(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for commit in &self.commits {
            if !names.contains(&commit.branch.as_str()) {
                names.push(&commit.branch);
            }
        }
        names
    }

    /// Number of commits currently flagged active.
    pub fn active_count(&self) -> usize {
        self.commits.iter().filter(|c| c.active).count()
    }
}

/// Local wall-clock time as `HH:MM:SS`.
fn display_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
