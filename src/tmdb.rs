//! TMDb secondary metadata service
//!
//! Used only by the resolver's last tier: when Plex has no hit for a
//! scraped title, TMDb supplies internationalized/alternate names for the
//! same release, which are then retried as bare-title searches. The whole
//! service is optional; every failure here is swallowed by the resolver.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::descriptor::MediaKind;

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// Only the first few search results are considered for a year match.
const RESULT_WINDOW: usize = 5;

/// Errors that can occur when querying TMDb.
#[derive(Debug, Error)]
pub enum TmdbError {
    /// Request to TMDb failed
    #[error("Request failed: {0}")]
    Request(String),

    /// TMDb returned a non-success status
    #[error("HTTP {0} from TMDb")]
    Status(u16),

    /// Failed to parse the TMDb JSON response
    #[error("Failed to parse TMDb response: {0}")]
    Parse(String),
}

/// Seam for the alternate-title lookup, mockable in resolver tests.
pub(crate) trait AlternativeTitles {
    /// Returns alternate titles for the release matching `title`/`year`.
    ///
    /// An empty list means no fallback candidates; the caller decides what
    /// that implies.
    fn alternative_titles(
        &self,
        title: &str,
        year: i32,
        kind: MediaKind,
    ) -> Result<Vec<String>, TmdbError>;
}

/// Blocking client for the TMDb v3 API.
pub struct TmdbClient {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Result<Self, TmdbError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| TmdbError::Request(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        let url = format!("{}{}", BASE_URL, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .map_err(|e| TmdbError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TmdbError::Status(status.as_u16()));
        }

        response.json().map_err(|e| TmdbError::Parse(e.to_string()))
    }
}

impl AlternativeTitles for TmdbClient {
    fn alternative_titles(
        &self,
        title: &str,
        year: i32,
        kind: MediaKind,
    ) -> Result<Vec<String>, TmdbError> {
        let search_path = match kind {
            MediaKind::Movie => "/search/movie",
            MediaKind::Show => "/search/tv",
        };
        let response: SearchResponse = self.get_json(search_path, &[("query", title)])?;

        let year = year.to_string();
        let mut candidates = Vec::new();

        for result in response.results.into_iter().take(RESULT_WINDOW) {
            // Results whose release year disagrees with the scraped year are
            // skipped entirely, never considered as weaker matches.
            if result.release_year() != Some(year.as_str()) {
                continue;
            }

            push_unique(&mut candidates, result.title.clone());
            push_unique(&mut candidates, result.original_title.clone());

            let media_segment = match kind {
                MediaKind::Movie => "movie",
                MediaKind::Show => "tv",
            };
            let alt_path = format!("/{}/{}/alternative_titles", media_segment, result.id);
            let alternates: AlternativeTitlesResponse = self.get_json(&alt_path, &[])?;
            for alternate in alternates.titles {
                push_unique(&mut candidates, Some(alternate.title));
            }

            // Only the first year-matching result contributes candidates.
            break;
        }

        Ok(candidates)
    }
}

fn push_unique(candidates: &mut Vec<String>, candidate: Option<String>) {
    if let Some(candidate) = candidate
        && !candidate.is_empty()
        && !candidates.contains(&candidate)
    {
        candidates.push(candidate);
    }
}

// --- TMDb JSON response shapes ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// One search result; movie and tv payloads use different key names for the
/// same fields, bridged here with aliases.
#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    #[serde(alias = "name")]
    title: Option<String>,
    #[serde(alias = "original_name")]
    original_title: Option<String>,
    #[serde(alias = "first_air_date")]
    release_date: Option<String>,
}

impl SearchResult {
    /// 4-digit year prefix of the release date, if present.
    fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|date| date.get(..4))
    }
}

/// The movie endpoint answers with `titles`, the tv endpoint with `results`.
#[derive(Debug, Deserialize)]
struct AlternativeTitlesResponse {
    #[serde(default, alias = "results")]
    titles: Vec<AlternativeTitle>,
}

#[derive(Debug, Deserialize)]
struct AlternativeTitle {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tv_search_result_aliases() {
        let json = r#"{"results": [{"id": 5, "name": "Foo", "original_name": "Le Foo", "first_air_date": "2020-04-01"}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let result = &response.results[0];
        assert_eq!(result.title.as_deref(), Some("Foo"));
        assert_eq!(result.original_title.as_deref(), Some("Le Foo"));
        assert_eq!(result.release_year(), Some("2020"));
    }

    #[test]
    fn test_release_year_of_empty_date() {
        let json = r#"{"results": [{"id": 5, "title": "Foo", "release_date": ""}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results[0].release_year(), None);
    }

    #[test]
    fn test_alternative_titles_movie_and_tv_keys() {
        let movie: AlternativeTitlesResponse =
            serde_json::from_str(r#"{"id": 1, "titles": [{"iso_3166_1": "DE", "title": "Der Foo"}]}"#)
                .unwrap();
        assert_eq!(movie.titles[0].title, "Der Foo");

        let tv: AlternativeTitlesResponse =
            serde_json::from_str(r#"{"id": 1, "results": [{"iso_3166_1": "JP", "title": "フー"}]}"#)
                .unwrap();
        assert_eq!(tv.titles[0].title, "フー");
    }

    #[test]
    fn test_push_unique_keeps_order_and_dedups() {
        let mut candidates = Vec::new();
        push_unique(&mut candidates, Some("Foo".to_string()));
        push_unique(&mut candidates, Some("Le Foo".to_string()));
        push_unique(&mut candidates, Some("Foo".to_string()));
        push_unique(&mut candidates, None);
        push_unique(&mut candidates, Some(String::new()));
        assert_eq!(candidates, vec!["Foo".to_string(), "Le Foo".to_string()]);
    }
}
