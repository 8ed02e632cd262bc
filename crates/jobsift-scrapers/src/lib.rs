//! One scraper per supported job-board API shape.
//!
//! Each scraper translates its board's payload into uniform [`RawRecord`]s
//! and nothing else: no classification, no normalization, no storage access.
//! The fetch/parse split keeps payload translation testable without a
//! network.

mod http;

pub use http::{FetchError, HttpClientConfig, HttpFetcher};

use async_trait::async_trait;
use jobsift_core::{BoardConfig, RawRecord, SourceBoard, SourceInstance};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const CRATE_NAME: &str = "jobsift-scrapers";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed {board} payload: {detail}")]
    Payload { board: SourceBoard, detail: String },
    #[error("{company} is not configured for {board}")]
    BoardMismatch { company: String, board: SourceBoard },
}

impl ScrapeError {
    fn payload(board: SourceBoard, detail: impl Into<String>) -> Self {
        Self::Payload {
            board,
            detail: detail.into(),
        }
    }

    fn mismatch(instance: &SourceInstance, board: SourceBoard) -> Self {
        Self::BoardMismatch {
            company: instance.company.clone(),
            board,
        }
    }
}

/// One board API shape. The set of implementations is closed and known at
/// build time; dispatch goes through [`scraper_for`].
#[async_trait]
pub trait BoardScraper: Send + Sync {
    fn board(&self) -> SourceBoard;

    /// Endpoint for one configured company on this board.
    fn endpoint(&self, instance: &SourceInstance) -> Result<String, ScrapeError>;

    /// Translate a raw response body into uniform records. A board with zero
    /// open postings yields `Ok(vec![])`, never an error.
    fn parse_payload(
        &self,
        instance: &SourceInstance,
        body: &[u8],
    ) -> Result<Vec<RawRecord>, ScrapeError>;

    /// Fetch current postings for one configured source instance.
    async fn fetch(
        &self,
        http: &HttpFetcher,
        instance: &SourceInstance,
    ) -> Result<Vec<RawRecord>, ScrapeError> {
        let url = self.endpoint(instance)?;
        let body = http.get_bytes(&instance.company, &url).await?;
        self.parse_payload(instance, &body)
    }
}

/// Closed dispatch over the supported board types.
pub fn scraper_for(config: &BoardConfig) -> &'static dyn BoardScraper {
    match config {
        BoardConfig::Greenhouse { .. } => &GreenhouseScraper,
        BoardConfig::Lever { .. } => &LeverScraper,
        BoardConfig::Workable { .. } => &WorkableScraper,
    }
}

fn parse_json(board: SourceBoard, body: &[u8]) -> Result<JsonValue, ScrapeError> {
    serde_json::from_slice(body).map_err(|err| ScrapeError::payload(board, err.to_string()))
}

fn json_str<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    cur.as_str()
}

/// Greenhouse job board API: `boards-api.greenhouse.io/v1/boards/{token}/jobs`.
#[derive(Debug, Clone, Copy)]
pub struct GreenhouseScraper;

#[async_trait]
impl BoardScraper for GreenhouseScraper {
    fn board(&self) -> SourceBoard {
        SourceBoard::Greenhouse
    }

    fn endpoint(&self, instance: &SourceInstance) -> Result<String, ScrapeError> {
        match &instance.board {
            BoardConfig::Greenhouse { board_token } => Ok(format!(
                "https://boards-api.greenhouse.io/v1/boards/{board_token}/jobs"
            )),
            _ => Err(ScrapeError::mismatch(instance, self.board())),
        }
    }

    fn parse_payload(
        &self,
        instance: &SourceInstance,
        body: &[u8],
    ) -> Result<Vec<RawRecord>, ScrapeError> {
        let value = parse_json(self.board(), body)?;
        let jobs = value
            .get("jobs")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| ScrapeError::payload(self.board(), "missing jobs array"))?;

        jobs.iter()
            .map(|job| {
                // Greenhouse ids are numeric in the payload but opaque to us.
                let external_id = match job.get("id") {
                    Some(JsonValue::Number(n)) => n.to_string(),
                    Some(JsonValue::String(s)) => s.clone(),
                    _ => return Err(ScrapeError::payload(self.board(), "job without id")),
                };
                let title = json_str(job, &["title"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "job without title"))?;
                let url = json_str(job, &["absolute_url"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "job without absolute_url"))?;
                Ok(RawRecord {
                    external_id,
                    company: instance.company.clone(),
                    title: title.to_string(),
                    location_raw: json_str(job, &["location", "name"]).map(str::to_string),
                    url: url.to_string(),
                })
            })
            .collect()
    }
}

/// Lever postings API: `api.lever.co/v0/postings/{site}?mode=json`.
#[derive(Debug, Clone, Copy)]
pub struct LeverScraper;

#[async_trait]
impl BoardScraper for LeverScraper {
    fn board(&self) -> SourceBoard {
        SourceBoard::Lever
    }

    fn endpoint(&self, instance: &SourceInstance) -> Result<String, ScrapeError> {
        match &instance.board {
            BoardConfig::Lever { site } => {
                Ok(format!("https://api.lever.co/v0/postings/{site}?mode=json"))
            }
            _ => Err(ScrapeError::mismatch(instance, self.board())),
        }
    }

    fn parse_payload(
        &self,
        instance: &SourceInstance,
        body: &[u8],
    ) -> Result<Vec<RawRecord>, ScrapeError> {
        let value = parse_json(self.board(), body)?;
        let postings = value
            .as_array()
            .ok_or_else(|| ScrapeError::payload(self.board(), "expected a top-level array"))?;

        postings
            .iter()
            .map(|posting| {
                let external_id = json_str(posting, &["id"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "posting without id"))?;
                let title = json_str(posting, &["text"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "posting without text"))?;
                let url = json_str(posting, &["hostedUrl"]).ok_or_else(|| {
                    ScrapeError::payload(self.board(), "posting without hostedUrl")
                })?;
                Ok(RawRecord {
                    external_id: external_id.to_string(),
                    company: instance.company.clone(),
                    title: title.to_string(),
                    location_raw: json_str(posting, &["categories", "location"])
                        .map(str::to_string),
                    url: url.to_string(),
                })
            })
            .collect()
    }
}

/// Workable widget API: `apply.workable.com/api/v1/widget/accounts/{subdomain}`.
#[derive(Debug, Clone, Copy)]
pub struct WorkableScraper;

#[async_trait]
impl BoardScraper for WorkableScraper {
    fn board(&self) -> SourceBoard {
        SourceBoard::Workable
    }

    fn endpoint(&self, instance: &SourceInstance) -> Result<String, ScrapeError> {
        match &instance.board {
            BoardConfig::Workable { subdomain } => Ok(format!(
                "https://apply.workable.com/api/v1/widget/accounts/{subdomain}"
            )),
            _ => Err(ScrapeError::mismatch(instance, self.board())),
        }
    }

    fn parse_payload(
        &self,
        instance: &SourceInstance,
        body: &[u8],
    ) -> Result<Vec<RawRecord>, ScrapeError> {
        let subdomain = match &instance.board {
            BoardConfig::Workable { subdomain } => subdomain,
            _ => return Err(ScrapeError::mismatch(instance, self.board())),
        };

        let value = parse_json(self.board(), body)?;
        let jobs = value
            .get("jobs")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| ScrapeError::payload(self.board(), "missing jobs array"))?;

        jobs.iter()
            .map(|job| {
                let shortcode = json_str(job, &["shortcode"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "job without shortcode"))?;
                let title = json_str(job, &["title"])
                    .ok_or_else(|| ScrapeError::payload(self.board(), "job without title"))?;
                Ok(RawRecord {
                    external_id: shortcode.to_string(),
                    company: instance.company.clone(),
                    title: title.to_string(),
                    location_raw: workable_location(job),
                    url: format!("https://apply.workable.com/{subdomain}/j/{shortcode}/"),
                })
            })
            .collect()
    }
}

// Workable splits location into structured city/country plus a remote flag;
// fold all three back into one raw string for the shared normalizer.
fn workable_location(job: &JsonValue) -> Option<String> {
    let mut parts: Vec<&str> = [
        json_str(job, &["location", "city"]),
        json_str(job, &["location", "country"]),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect();

    if job.get("remote").and_then(JsonValue::as_bool) == Some(true) {
        parts.push("Remote");
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(company: &str, board: BoardConfig) -> SourceInstance {
        SourceInstance {
            company: company.to_string(),
            enabled: true,
            board,
        }
    }

    fn greenhouse_instance() -> SourceInstance {
        instance(
            "Acme",
            BoardConfig::Greenhouse {
                board_token: "acme".into(),
            },
        )
    }

    #[test]
    fn greenhouse_payload_maps_to_raw_records() {
        let body = br#"{"jobs": [{
            "id": 4277538002,
            "title": "Engineering Manager",
            "absolute_url": "https://boards.greenhouse.io/acme/jobs/4277538002",
            "location": {"name": "London"}
        }]}"#;

        let records = GreenhouseScraper
            .parse_payload(&greenhouse_instance(), body)
            .unwrap();
        assert_eq!(
            records,
            vec![RawRecord {
                external_id: "4277538002".into(),
                company: "Acme".into(),
                title: "Engineering Manager".into(),
                location_raw: Some("London".into()),
                url: "https://boards.greenhouse.io/acme/jobs/4277538002".into(),
            }]
        );
    }

    #[test]
    fn greenhouse_empty_board_is_not_an_error() {
        let records = GreenhouseScraper
            .parse_payload(&greenhouse_instance(), br#"{"jobs": []}"#)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn greenhouse_rejects_malformed_payloads() {
        let err = GreenhouseScraper
            .parse_payload(&greenhouse_instance(), b"not json")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));

        let err = GreenhouseScraper
            .parse_payload(&greenhouse_instance(), br#"{"postings": []}"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));
    }

    #[test]
    fn lever_payload_maps_to_raw_records() {
        let inst = instance(
            "Initech",
            BoardConfig::Lever {
                site: "initech".into(),
            },
        );
        let body = br#"[{
            "id": "a1b2c3",
            "text": "Staff Product Designer",
            "hostedUrl": "https://jobs.lever.co/initech/a1b2c3",
            "categories": {"location": "Remote - US"}
        }]"#;

        let records = LeverScraper.parse_payload(&inst, body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].external_id, "a1b2c3");
        assert_eq!(records[0].title, "Staff Product Designer");
        assert_eq!(records[0].location_raw.as_deref(), Some("Remote - US"));
        assert_eq!(records[0].url, "https://jobs.lever.co/initech/a1b2c3");
    }

    #[test]
    fn lever_rejects_malformed_payloads() {
        let inst = instance(
            "Initech",
            BoardConfig::Lever {
                site: "initech".into(),
            },
        );

        let err = LeverScraper.parse_payload(&inst, b"not json").unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));

        // A JSON object is not the expected top-level array.
        let err = LeverScraper
            .parse_payload(&inst, br#"{"postings": []}"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));

        let err = LeverScraper
            .parse_payload(&inst, br#"[{"text": "Counsel"}]"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));
    }

    #[test]
    fn lever_posting_without_location_is_kept() {
        let inst = instance(
            "Initech",
            BoardConfig::Lever {
                site: "initech".into(),
            },
        );
        let body = br#"[{
            "id": "a1",
            "text": "Counsel",
            "hostedUrl": "https://jobs.lever.co/initech/a1"
        }]"#;

        let records = LeverScraper.parse_payload(&inst, body).unwrap();
        assert_eq!(records[0].location_raw, None);
    }

    #[test]
    fn workable_payload_builds_url_and_folds_remote_into_location() {
        let inst = instance(
            "Hooli",
            BoardConfig::Workable {
                subdomain: "hooli".into(),
            },
        );
        let body = br#"{"jobs": [{
            "shortcode": "AB12CD",
            "title": "Senior Backend Developer",
            "location": {"city": "New York", "country": "United States"},
            "remote": true
        }]}"#;

        let records = WorkableScraper.parse_payload(&inst, body).unwrap();
        assert_eq!(records[0].external_id, "AB12CD");
        assert_eq!(records[0].url, "https://apply.workable.com/hooli/j/AB12CD/");
        assert_eq!(
            records[0].location_raw.as_deref(),
            Some("New York, United States, Remote")
        );
    }

    #[test]
    fn workable_onsite_job_without_city_has_no_location() {
        let inst = instance(
            "Hooli",
            BoardConfig::Workable {
                subdomain: "hooli".into(),
            },
        );
        let body = br#"{"jobs": [{"shortcode": "ZZ99", "title": "Janitor", "location": {}}]}"#;

        let records = WorkableScraper.parse_payload(&inst, body).unwrap();
        assert_eq!(records[0].location_raw, None);
    }

    #[test]
    fn workable_rejects_malformed_payloads() {
        let inst = instance(
            "Hooli",
            BoardConfig::Workable {
                subdomain: "hooli".into(),
            },
        );

        let err = WorkableScraper.parse_payload(&inst, b"not json").unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));

        let err = WorkableScraper
            .parse_payload(&inst, br#"{"postings": []}"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));

        let err = WorkableScraper
            .parse_payload(&inst, br#"{"jobs": [{"title": "Janitor"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Payload { .. }));
    }

    #[test]
    fn scrapers_reject_mismatched_board_configuration() {
        let inst = instance(
            "Acme",
            BoardConfig::Lever {
                site: "acme".into(),
            },
        );
        let err = GreenhouseScraper.endpoint(&inst).unwrap_err();
        assert!(matches!(err, ScrapeError::BoardMismatch { .. }));
    }

    #[test]
    fn dispatch_matches_configuration_to_board() {
        let config = BoardConfig::Workable {
            subdomain: "hooli".into(),
        };
        assert_eq!(scraper_for(&config).board(), SourceBoard::Workable);
    }
}
