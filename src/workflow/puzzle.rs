use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::Status;
use super::table::Role;

/// A puzzle as the workflow engine sees it: identity, current status, and
/// the people attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub codename: String,
    pub status: Status,
    /// Last time `status` actually changed.
    pub status_mtime: DateTime<Utc>,
    #[serde(default)]
    pub authors: BTreeSet<String>,
    #[serde(default)]
    pub editors: BTreeSet<String>,
    #[serde(default)]
    pub factcheckers: BTreeSet<String>,
    #[serde(default)]
    pub postprodders: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

impl Puzzle {
    pub fn new(id: u64, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            codename: String::new(),
            status: Status::InitialIdea,
            status_mtime: at,
            authors: BTreeSet::new(),
            editors: BTreeSet::new(),
            factcheckers: BTreeSet::new(),
            postprodders: BTreeSet::new(),
            tags: BTreeSet::new(),
            answers: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_codename(mut self, codename: impl Into<String>) -> Self {
        self.codename = codename.into();
        self
    }

    pub fn with_author(mut self, user: impl Into<String>) -> Self {
        self.authors.insert(user.into());
        self
    }

    pub fn with_editor(mut self, user: impl Into<String>) -> Self {
        self.editors.insert(user.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Title safe to show people who are not spoiled on the puzzle.
    pub fn spoiler_free_title(&self) -> String {
        if self.codename.is_empty() {
            format!("Puzzle {}: {}", self.id, self.name)
        } else {
            format!("Puzzle {}: ({})", self.id, self.codename)
        }
    }

    pub fn people(&self, role: Role) -> Option<&BTreeSet<String>> {
        match role {
            Role::Authors => Some(&self.authors),
            Role::Editors => Some(&self.editors),
            Role::Factcheckers => Some(&self.factcheckers),
            Role::Postprodders => Some(&self.postprodders),
            Role::Testsolvers | Role::Nobody => None,
        }
    }

    pub fn has_role(&self, user: &str, role: Role) -> bool {
        self.people(role).is_some_and(|set| set.contains(user))
    }
}

/// A committed status change, published to hooks after the engine applies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub puzzle_id: u64,
    pub puzzle_title: String,
    pub from: Status,
    pub to: Status,
    pub actor: String,
    pub at: DateTime<Utc>,
}
