use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HuntdeskError;

/// A stage in a puzzle's production lifecycle.
///
/// Declaration order is the registry order: `rank()` is the position in
/// [`STATUSES`], and the two-letter code is the only form that crosses a
/// serialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "II")]
    InitialIdea,
    #[serde(rename = "AE")]
    AwaitingEditor,
    #[serde(rename = "ND")]
    NeedsDiscussion,
    #[serde(rename = "ID")]
    IdeaInDevelopment,
    #[serde(rename = "AA")]
    AwaitingAnswer,
    #[serde(rename = "W")]
    Writing,
    #[serde(rename = "WF")]
    WritingFlexible,
    #[serde(rename = "T")]
    Testsolving,
    #[serde(rename = "TR")]
    AwaitingTestsolveReview,
    #[serde(rename = "R")]
    Revising,
    #[serde(rename = "RP")]
    RevisingPostTestsolving,
    #[serde(rename = "NS")]
    NeedsSolution,
    #[serde(rename = "NP")]
    NeedsPostprod,
    #[serde(rename = "AP")]
    AwaitingPostprodApproval,
    #[serde(rename = "NF")]
    NeedsFactcheck,
    #[serde(rename = "NC")]
    NeedsCopyEdits,
    #[serde(rename = "D")]
    Done,
    #[serde(rename = "DF")]
    Deferred,
    #[serde(rename = "X")]
    Dead,
}

/// Every status, in registry order.
pub const STATUSES: &[Status] = &[
    Status::InitialIdea,
    Status::AwaitingEditor,
    Status::NeedsDiscussion,
    Status::IdeaInDevelopment,
    Status::AwaitingAnswer,
    Status::Writing,
    Status::WritingFlexible,
    Status::Testsolving,
    Status::AwaitingTestsolveReview,
    Status::Revising,
    Status::RevisingPostTestsolving,
    Status::NeedsSolution,
    Status::NeedsPostprod,
    Status::AwaitingPostprodApproval,
    Status::NeedsFactcheck,
    Status::NeedsCopyEdits,
    Status::Done,
    Status::Deferred,
    Status::Dead,
];

/// Rank returned for codes the registry does not know.
pub const UNKNOWN_RANK: i32 = -1;

/// Longest status code, for callers sizing storage columns.
pub const MAX_CODE_LENGTH: usize = 2;

impl Status {
    pub fn code(self) -> &'static str {
        match self {
            Status::InitialIdea => "II",
            Status::AwaitingEditor => "AE",
            Status::NeedsDiscussion => "ND",
            Status::IdeaInDevelopment => "ID",
            Status::AwaitingAnswer => "AA",
            Status::Writing => "W",
            Status::WritingFlexible => "WF",
            Status::Testsolving => "T",
            Status::AwaitingTestsolveReview => "TR",
            Status::Revising => "R",
            Status::RevisingPostTestsolving => "RP",
            Status::NeedsSolution => "NS",
            Status::NeedsPostprod => "NP",
            Status::AwaitingPostprodApproval => "AP",
            Status::NeedsFactcheck => "NF",
            Status::NeedsCopyEdits => "NC",
            Status::Done => "D",
            Status::Deferred => "DF",
            Status::Dead => "X",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Status::InitialIdea => "Initial idea",
            Status::AwaitingEditor => "Awaiting editor",
            Status::NeedsDiscussion => "Needs discussion",
            Status::IdeaInDevelopment => "Idea in development",
            Status::AwaitingAnswer => "Awaiting answer",
            Status::Writing => "Writing (answer assigned)",
            Status::WritingFlexible => "Writing (answer flexible)",
            Status::Testsolving => "Testsolving",
            Status::AwaitingTestsolveReview => "Awaiting testsolve review",
            Status::Revising => "Revising (needs testsolving)",
            Status::RevisingPostTestsolving => "Revising (done with testsolving)",
            Status::NeedsSolution => "Needs solution",
            Status::NeedsPostprod => "Needs postprod",
            Status::AwaitingPostprodApproval => "Awaiting approval after postprod",
            Status::NeedsFactcheck => "Needs factcheck",
            Status::NeedsCopyEdits => "Needs copy edits",
            Status::Done => "Done",
            Status::Deferred => "Deferred",
            Status::Dead => "Dead",
        }
    }

    pub fn from_code(code: &str) -> Option<Status> {
        STATUSES.iter().copied().find(|s| s.code() == code)
    }

    /// Reverse lookup by human-readable name, used to parse legacy comments.
    pub fn from_display_name(name: &str) -> Option<Status> {
        STATUSES.iter().copied().find(|s| s.display_name() == name)
    }

    pub fn rank(self) -> i32 {
        // STATUSES mirrors declaration order, so the discriminant is the rank.
        self as i32
    }

    /// True for statuses past writing and not beyond `Done`.
    pub fn past_writing(self) -> bool {
        in_progress_range(self.rank(), Status::WritingFlexible)
    }

    /// True for statuses past testsolving and not beyond `Done`.
    pub fn past_testsolving(self) -> bool {
        in_progress_range(self.rank(), Status::Revising)
    }

    pub fn is_pre_testsolving(self) -> bool {
        self.rank() < Status::Testsolving.rank()
    }

    pub fn is_post_testsolving(self) -> bool {
        self.past_testsolving() && self != Status::Done
    }
}

// Dead and Deferred rank above Done but never count as progress.
fn in_progress_range(rank: i32, reference: Status) -> bool {
    rank > reference.rank() && rank <= Status::Done.rank()
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Status {
    type Err = HuntdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::from_code(s).ok_or_else(|| HuntdeskError::UnknownStatus(s.to_string()))
    }
}

/// Rank of a raw code; [`UNKNOWN_RANK`] for anything not in the registry.
pub fn rank_of(code: &str) -> i32 {
    Status::from_code(code).map_or(UNKNOWN_RANK, Status::rank)
}

/// Display name of a raw code, falling back to the code itself.
pub fn display_of(code: &str) -> &str {
    match Status::from_code(code) {
        Some(status) => status.display_name(),
        None => code,
    }
}

pub fn past_writing(code: &str) -> bool {
    in_progress_range(rank_of(code), Status::WritingFlexible)
}

pub fn past_testsolving(code: &str) -> bool {
    in_progress_range(rank_of(code), Status::Revising)
}

/// `(code, display)` pairs in registry order, for populating pickers.
pub fn all_statuses() -> Vec<(&'static str, &'static str)> {
    STATUSES
        .iter()
        .map(|s| (s.code(), s.display_name()))
        .collect()
}

pub fn pre_testsolving_statuses() -> Vec<Status> {
    STATUSES
        .iter()
        .copied()
        .filter(|s| s.is_pre_testsolving())
        .collect()
}

pub fn post_testsolving_statuses() -> Vec<Status> {
    STATUSES
        .iter()
        .copied()
        .filter(|s| s.is_post_testsolving())
        .collect()
}

/// A status as recorded in history: either a registry status or a legacy
/// code that has since been removed from the registry.
///
/// Serializes as the bare code so old records round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusTag {
    Known(Status),
    Legacy(String),
}

impl StatusTag {
    pub fn code(&self) -> &str {
        match self {
            StatusTag::Known(status) => status.code(),
            StatusTag::Legacy(code) => code,
        }
    }

    pub fn status(&self) -> Option<Status> {
        match self {
            StatusTag::Known(status) => Some(*status),
            StatusTag::Legacy(_) => None,
        }
    }

    pub fn rank(&self) -> i32 {
        rank_of(self.code())
    }

    pub fn display_name(&self) -> &str {
        display_of(self.code())
    }
}

impl From<Status> for StatusTag {
    fn from(status: Status) -> Self {
        StatusTag::Known(status)
    }
}

impl From<String> for StatusTag {
    fn from(code: String) -> Self {
        match Status::from_code(&code) {
            Some(status) => StatusTag::Known(status),
            None => StatusTag::Legacy(code),
        }
    }
}

impl From<&str> for StatusTag {
    fn from(code: &str) -> Self {
        StatusTag::from(code.to_string())
    }
}

impl From<StatusTag> for String {
    fn from(tag: StatusTag) -> Self {
        match tag {
            StatusTag::Known(status) => status.code().to_string(),
            StatusTag::Legacy(code) => code,
        }
    }
}

impl PartialEq<Status> for StatusTag {
    fn eq(&self, other: &Status) -> bool {
        self.status() == Some(*other)
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
