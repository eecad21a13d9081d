//! Push event to chat message formatting
//!
//! Formatting never fails: missing fields get placeholders, and a body that
//! cannot be parsed at all produces a short fallback message instead.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::webhook::{Commit, PushPayload};

/// Only the first few commit titles are listed in a message.
pub const MAX_LISTED_COMMITS: usize = 2;
/// Each file section shows at most this many paths.
pub const MAX_LISTED_FILES: usize = 3;

const DEFAULT_PUSHER: &str = "Unknown";
const DEFAULT_REF: &str = "refs/heads/unknown";
const DEFAULT_BRANCH: &str = "unknown";
const DEFAULT_REPO_FULL_NAME: &str = "unknown/unknown-repo";
const NO_COMMIT_MESSAGE: &str = "No commit message";
const BRANCH_PREFIX: &str = "refs/heads/";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Source of the current time for message footers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Files touched by a push, deduplicated and capped per section.
#[derive(Debug, Default, PartialEq)]
pub struct FileChanges<'a> {
    pub added: Vec<&'a str>,
    pub modified: Vec<&'a str>,
    pub removed: Vec<&'a str>,
}

impl<'a> FileChanges<'a> {
    /// Aggregates file lists across all commits, not only the listed ones.
    pub fn collect(commits: &'a [Commit]) -> Self {
        Self {
            added: dedup_truncate(commits.iter().flat_map(|c| c.added.iter())),
            modified: dedup_truncate(commits.iter().flat_map(|c| c.modified.iter())),
            removed: dedup_truncate(commits.iter().flat_map(|c| c.removed.iter())),
        }
    }
}

fn dedup_truncate<'a>(paths: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    paths
        .map(String::as_str)
        .filter(|path| seen.insert(*path))
        .take(MAX_LISTED_FILES)
        .collect()
}

/// Strips `refs/heads/` from a ref; an empty result becomes "unknown".
pub fn branch_name(git_ref: &str) -> &str {
    let branch = git_ref.strip_prefix(BRANCH_PREFIX).unwrap_or(git_ref);
    if branch.is_empty() {
        DEFAULT_BRANCH
    } else {
        branch
    }
}

fn render_list<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        return "  - None".to_string();
    }
    items
        .iter()
        .map(|item| format!("  - {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct PushEventFormatter {
    clock: Box<dyn Clock>,
}

impl Default for PushEventFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl PushEventFormatter {
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    pub fn timestamp(&self) -> String {
        self.clock.now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parses the raw body and formats it, or returns the fallback message
    /// if the body is not a usable push payload.
    pub fn format_raw(&self, body: &[u8]) -> String {
        match PushPayload::from_slice(body) {
            Ok(payload) => self.format(&payload),
            Err(e) => {
                warn!("Could not parse push payload, sending fallback message: {}", e);
                self.fallback_message()
            }
        }
    }

    pub fn fallback_message(&self) -> String {
        format!(
            "⚠️ Push event received, but processing failed.\n\n🕒 {}",
            self.timestamp()
        )
    }

    /// Renders the push notification message.
    pub fn format(&self, payload: &PushPayload) -> String {
        let pusher = payload.pusher_name().unwrap_or(DEFAULT_PUSHER);
        let branch = branch_name(payload.git_ref.as_deref().unwrap_or(DEFAULT_REF));
        let repository = payload
            .repository
            .as_ref()
            .and_then(|r| r.display_name())
            .unwrap_or(DEFAULT_REPO_FULL_NAME);

        let commits = &payload.commits;
        let commit_count = if commits.is_empty() {
            "0 (No commits found)".to_string()
        } else {
            commits.len().to_string()
        };

        let titles: Vec<&str> = commits
            .iter()
            .take(MAX_LISTED_COMMITS)
            .map(|c| c.title().unwrap_or(NO_COMMIT_MESSAGE))
            .collect();
        let top_commit = commits
            .first()
            .and_then(Commit::title)
            .unwrap_or(NO_COMMIT_MESSAGE);

        let files = FileChanges::collect(commits);
        debug!(
            "Formatting push to {} ({}) with {} commits",
            repository,
            branch,
            commits.len()
        );

        format!(
            "📢 GitHub Push Notification\n\
             {divider}\n\
             \n\
             👤 Pusher: {pusher}\n\
             📦 Repository: {repository}\n\
             🌿 Branch: {branch}\n\
             🔢 Commits: {commit_count}\n\
             \n\
             📝 Commit Messages:\n\
             {titles}\n\
             \n\
             🔝 Top Commit: {top_commit}\n\
             \n\
             ➕ Added Files:\n\
             {added}\n\
             \n\
             ✏️ Modified Files:\n\
             {modified}\n\
             \n\
             ➖ Removed Files:\n\
             {removed}\n\
             \n\
             {divider}\n\
             🕒 {timestamp}",
            divider = DIVIDER,
            titles = render_list(&titles),
            added = render_list(&files.added),
            modified = render_list(&files.modified),
            removed = render_list(&files.removed),
            timestamp = self.timestamp(),
        )
    }
}
