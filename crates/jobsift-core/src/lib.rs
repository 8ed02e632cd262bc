//! Core domain model and pure tagging logic for jobsift.

mod classify;
mod location;

pub use classify::{classify, Classification, UNKNOWN_TAG};
pub use location::{normalize_location, LocationNorm};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CRATE_NAME: &str = "jobsift-core";

/// Board/API shape family a posting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceBoard {
    Greenhouse,
    Lever,
    Workable,
}

impl SourceBoard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greenhouse => "greenhouse",
            Self::Lever => "lever",
            Self::Workable => "workable",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "greenhouse" => Some(Self::Greenhouse),
            "lever" => Some(Self::Lever),
            "workable" => Some(Self::Workable),
            _ => None,
        }
    }
}

impl fmt::Display for SourceBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Board-specific connection settings for one employer's career site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "board", rename_all = "lowercase")]
pub enum BoardConfig {
    Greenhouse { board_token: String },
    Lever { site: String },
    Workable { subdomain: String },
}

impl BoardConfig {
    pub fn source(&self) -> SourceBoard {
        match self {
            Self::Greenhouse { .. } => SourceBoard::Greenhouse,
            Self::Lever { .. } => SourceBoard::Lever,
            Self::Workable { .. } => SourceBoard::Workable,
        }
    }
}

/// One configured employer board: a "source instance" in reconciliation terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInstance {
    pub company: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub board: BoardConfig,
}

fn default_enabled() -> bool {
    true
}

impl SourceInstance {
    pub fn scope(&self) -> SourceScope {
        SourceScope {
            source: self.board.source(),
            company: self.company.clone(),
        }
    }
}

/// Reconciliation partition: all postings for one company on one board.
/// Scopes never overlap, so deactivation in one scope cannot touch another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceScope {
    pub source: SourceBoard,
    pub company: String,
}

/// Uniform scraper handoff, one per upstream posting. Carries only what the
/// board payload provided; tagging happens downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub external_id: String,
    pub company: String,
    pub title: String,
    pub location_raw: Option<String>,
    pub url: String,
}

/// Fully tagged posting ready for the store. The store assigns the row id,
/// active flag and lifecycle timestamps at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingCandidate {
    pub source: SourceBoard,
    pub company: String,
    pub external_id: String,
    pub title: String,
    pub role: String,
    pub seniority: String,
    pub location_raw: Option<String>,
    pub location_city: Option<String>,
    pub location_remote: bool,
    pub url: String,
}

impl PostingCandidate {
    /// Classify and normalize a raw record into a storable candidate.
    pub fn from_raw(source: SourceBoard, raw: RawRecord) -> Self {
        let tags = classify(&raw.title);
        let loc = raw
            .location_raw
            .as_deref()
            .map(normalize_location)
            .unwrap_or_default();
        Self {
            source,
            company: raw.company,
            external_id: raw.external_id,
            title: raw.title,
            role: tags.role.to_string(),
            seniority: tags.seniority.to_string(),
            location_raw: raw.location_raw,
            location_city: loc.city.map(str::to_string),
            location_remote: loc.remote,
            url: raw.url,
        }
    }
}

/// Canonical persisted posting. `(source, external_id)` is the unique
/// reconciliation key; rows are deactivated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: Uuid,
    pub source: SourceBoard,
    pub company: String,
    pub external_id: String,
    pub title: String,
    pub role: String,
    pub seniority: String,
    pub location_raw: Option<String>,
    pub location_city: Option<String>,
    pub location_remote: bool,
    pub url: String,
    pub is_active: bool,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_carries_tags_and_normalized_location() {
        let raw = RawRecord {
            external_id: "42".into(),
            company: "Acme".into(),
            title: "Senior Backend Developer".into(),
            location_raw: Some("NYC / Remote".into()),
            url: "https://example.com/42".into(),
        };
        let candidate = PostingCandidate::from_raw(SourceBoard::Greenhouse, raw);
        assert_eq!(candidate.role, "Developer");
        assert_eq!(candidate.seniority, "Senior");
        assert_eq!(candidate.location_city.as_deref(), Some("New York"));
        assert!(candidate.location_remote);
        assert_eq!(candidate.location_raw.as_deref(), Some("NYC / Remote"));
    }

    #[test]
    fn candidate_without_location_stays_unlocated() {
        let raw = RawRecord {
            external_id: "7".into(),
            company: "Acme".into(),
            title: "Chief Vibes Officer".into(),
            location_raw: None,
            url: "https://example.com/7".into(),
        };
        let candidate = PostingCandidate::from_raw(SourceBoard::Lever, raw);
        assert_eq!(candidate.role, UNKNOWN_TAG);
        assert_eq!(candidate.location_city, None);
        assert!(!candidate.location_remote);
    }

    #[test]
    fn source_board_tags_round_trip() {
        for board in [
            SourceBoard::Greenhouse,
            SourceBoard::Lever,
            SourceBoard::Workable,
        ] {
            assert_eq!(SourceBoard::parse(board.as_str()), Some(board));
        }
        assert_eq!(SourceBoard::parse("monster"), None);
    }
}
