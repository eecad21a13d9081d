//! Push event payload structures
//!
//! Only the subset of GitHub's push event schema used for notifications is
//! modelled. Every field is optional and a value of the wrong JSON type is
//! treated as absent, so a partial payload never fails to deserialize.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PushPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub pusher: Option<Pusher>,
    #[serde(default, rename = "ref", deserialize_with = "lenient")]
    pub git_ref: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub repository: Option<Repository>,
    #[serde(default, deserialize_with = "lenient_commits")]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Pusher {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Repository {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Commit {
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub added: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub modified: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub removed: Vec<String>,
}

impl PushPayload {
    /// Parse a push payload from the raw request body.
    /// Fails if the body is not JSON or is a JSON scalar.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn pusher_name(&self) -> Option<&str> {
        self.pusher
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

impl Repository {
    /// `full_name` if set, else `name`. Empty strings count as unset.
    pub fn display_name(&self) -> Option<&str> {
        non_empty(&self.full_name).or_else(|| non_empty(&self.name))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Commit {
    /// First line of the commit message, if there is a non-empty one.
    pub fn title(&self) -> Option<&str> {
        self.message
            .as_deref()
            .and_then(|m| m.lines().next())
            .filter(|line| !line.trim().is_empty())
    }
}

/// Deserialize any value, falling back to the default when it has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A non-array becomes empty; a malformed element becomes an empty commit.
fn lenient_commits<'de, D>(deserializer: D) -> std::result::Result<Vec<Commit>, D::Error>
where
    D: Deserializer<'de>,
{
    let commits = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
    Ok(commits)
}

/// Keep only the string entries of an array.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let paths = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(path) => Some(path),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_payload() {
        let body = br#"{
            "ref": "refs/heads/main",
            "pusher": {"name": "octocat", "email": "octocat@github.com"},
            "repository": {"name": "hello-world", "full_name": "octocat/hello-world"},
            "commits": [
                {"id": "abc", "message": "Fix bug\n\nDetails", "added": ["a.rs"], "modified": [], "removed": ["b.rs"]}
            ]
        }"#;

        let payload = PushPayload::from_slice(body).unwrap();
        assert_eq!(payload.git_ref.as_deref(), Some("refs/heads/main"));
        assert_eq!(payload.pusher_name(), Some("octocat"));
        let repo = payload.repository.as_ref().unwrap();
        assert_eq!(repo.full_name.as_deref(), Some("octocat/hello-world"));
        assert_eq!(payload.commits.len(), 1);
        assert_eq!(payload.commits[0].title(), Some("Fix bug"));
        assert_eq!(payload.commits[0].added, vec!["a.rs"]);
        assert_eq!(payload.commits[0].removed, vec!["b.rs"]);
    }

    #[test]
    fn test_parse_empty_object() {
        let payload = PushPayload::from_slice(b"{}").unwrap();
        assert_eq!(payload, PushPayload::default());
    }

    #[test]
    fn test_wrong_types_are_treated_as_absent() {
        let body = br#"{
            "ref": 42,
            "pusher": "octocat",
            "repository": {"name": null, "full_name": ["x"]},
            "commits": {"message": "not a list"}
        }"#;

        let payload = PushPayload::from_slice(body).unwrap();
        assert!(payload.git_ref.is_none());
        assert!(payload.pusher.is_none());
        assert_eq!(payload.repository, Some(Repository::default()));
        assert!(payload.commits.is_empty());
    }

    #[test]
    fn test_malformed_commit_entries() {
        let body = br#"{"commits": ["oops", {"message": 7, "added": ["x", 1, null, "y"], "removed": "z"}]}"#;

        let payload = PushPayload::from_slice(body).unwrap();
        assert_eq!(payload.commits.len(), 2);
        assert_eq!(payload.commits[0], Commit::default());
        assert!(payload.commits[1].message.is_none());
        assert_eq!(payload.commits[1].added, vec!["x", "y"]);
        assert!(payload.commits[1].removed.is_empty());
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(PushPayload::from_slice(b"not json").is_err());
        assert!(PushPayload::from_slice(br#""push""#).is_err());
        assert!(PushPayload::from_slice(b"42").is_err());
        assert!(PushPayload::from_slice(b"").is_err());
    }

    #[test]
    fn test_empty_names_count_as_unset() {
        let payload = PushPayload::from_slice(
            br#"{"pusher": {"name": ""}, "repository": {"full_name": "", "name": "hello"}}"#,
        )
        .unwrap();
        assert_eq!(payload.pusher_name(), None);
        assert_eq!(
            payload.repository.as_ref().and_then(Repository::display_name),
            Some("hello")
        );

        let repo = Repository {
            name: Some("hello".to_string()),
            full_name: Some("octocat/hello".to_string()),
        };
        assert_eq!(repo.display_name(), Some("octocat/hello"));
        assert_eq!(Repository::default().display_name(), None);
    }

    #[test]
    fn test_commit_title() {
        let commit = |m: Option<&str>| Commit {
            message: m.map(String::from),
            ..Default::default()
        };

        assert_eq!(commit(Some("a\nb")).title(), Some("a"));
        assert_eq!(commit(Some("windows\r\nline")).title(), Some("windows"));
        assert_eq!(commit(Some("")).title(), None);
        assert_eq!(commit(Some("\nsecond")).title(), None);
        assert_eq!(commit(None).title(), None);
    }
}
