//! Plex media server collaborator
//!
//! Thin blocking client over the Plex HTTP API. Everything the pipeline
//! needs from Plex goes through here: section lookup, title search, season
//! lookup, and poster upload. Responses are requested as JSON and mirrored
//! by the serde structs at the bottom of this module.
//!
//! The two seams the rest of the pipeline depends on ([`SectionSearch`] and
//! [`ArtworkStore`]) are traits, so the resolver and applier can be tested
//! against in-memory fakes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur when talking to the Plex server.
#[derive(Debug, Error)]
pub enum PlexError {
    /// Request to the Plex server failed
    #[error("Request failed: {0}")]
    Request(String),

    /// Plex returned a non-success status
    #[error("HTTP {status} from Plex for {url}")]
    Status { url: String, status: u16 },

    /// Failed to parse the Plex JSON response
    #[error("Failed to parse Plex response: {0}")]
    Parse(String),

    /// The named library section does not exist on the server
    #[error("Library section not found: {0}")]
    SectionNotFound(String),

    /// The requested season does not exist on the show
    #[error("Season {index} not found for {show}")]
    SeasonNotFound { show: String, index: u32 },

    /// Failed to read the poster file for upload
    #[error("Failed to read poster file: {0}")]
    Io(#[from] io::Error),
}

/// One matched library entry: a movie, a show, or a season of a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryItem {
    pub rating_key: String,
    pub title: String,
    pub year: Option<i32>,
    /// On-disk locations Plex knows for this item. Shows report their
    /// series directories, movies report their media files.
    pub locations: Vec<PathBuf>,
}

impl LibraryItem {
    /// `"Title (Year)"` identity used for display and run-scoped dedup.
    pub fn identity(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Seam for searching a library section by title and optional year.
pub(crate) trait SectionSearch {
    /// Returns matches in server order; the first result wins downstream.
    fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<LibraryItem>, PlexError>;
}

/// Seam for pushing poster files to resolved items.
pub(crate) trait ArtworkStore {
    /// Uploads a whole-item poster (movie or show cover).
    fn upload_poster(&self, item: &LibraryItem, file: &Path) -> Result<(), PlexError>;

    /// Uploads a poster to one season of a show, addressed by Plex season
    /// index (0 is Specials).
    fn upload_season_poster(
        &self,
        item: &LibraryItem,
        season_index: u32,
        file: &Path,
    ) -> Result<(), PlexError>;
}

/// Connection to one Plex server.
pub struct PlexServer {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl PlexServer {
    /// Connects to the server and verifies it answers.
    pub fn connect(base_url: &str, token: &str) -> Result<Self, PlexError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| PlexError::Request(e.to_string()))?;

        let server = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        };

        // Identity round-trip proves address and token are usable.
        let _: Container<Identity> = server.get_json("/identity", &[])?;
        Ok(server)
    }

    /// Looks up a library section by its display title.
    pub fn section(&self, name: &str) -> Result<LibrarySection<'_>, PlexError> {
        let sections: Container<SectionList> = self.get_json("/library/sections", &[])?;
        sections
            .media_container
            .directories
            .into_iter()
            .find(|directory| directory.title == name)
            .map(|directory| LibrarySection {
                server: self,
                key: directory.key,
            })
            .ok_or_else(|| PlexError::SectionNotFound(name.to_string()))
    }

    /// Finds one season of a show by Plex season index.
    fn season(&self, show: &LibraryItem, index: u32) -> Result<LibraryItem, PlexError> {
        let path = format!("/library/metadata/{}/children", show.rating_key);
        let children: Container<ItemList> = self.get_json(&path, &[])?;
        children
            .media_container
            .metadata
            .into_iter()
            .find(|child| child.index == Some(index))
            .map(RawItem::into_item)
            .ok_or_else(|| PlexError::SeasonNotFound {
                show: show.title.clone(),
                index,
            })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, PlexError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("X-Plex-Token", self.token.as_str())])
            .query(query)
            .send()
            .map_err(|e| PlexError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlexError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response.json().map_err(|e| PlexError::Parse(e.to_string()))
    }

    fn post_poster(&self, rating_key: &str, file: &Path) -> Result<(), PlexError> {
        let url = format!("{}/library/metadata/{}/posters", self.base_url, rating_key);
        let bytes = fs::read(file)?;
        let response = self
            .client
            .post(&url)
            .query(&[("X-Plex-Token", self.token.as_str())])
            .body(bytes)
            .send()
            .map_err(|e| PlexError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlexError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

impl ArtworkStore for PlexServer {
    fn upload_poster(&self, item: &LibraryItem, file: &Path) -> Result<(), PlexError> {
        self.post_poster(&item.rating_key, file)
    }

    fn upload_season_poster(
        &self,
        item: &LibraryItem,
        season_index: u32,
        file: &Path,
    ) -> Result<(), PlexError> {
        let season = self.season(item, season_index)?;
        self.post_poster(&season.rating_key, file)
    }
}

/// One library section (a movie or show library) on a server.
pub struct LibrarySection<'a> {
    server: &'a PlexServer,
    key: String,
}

impl SectionSearch for LibrarySection<'_> {
    fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<LibraryItem>, PlexError> {
        let path = format!("/library/sections/{}/all", self.key);
        let year_value;
        let mut query = vec![("title", title)];
        if let Some(year) = year {
            year_value = year.to_string();
            query.push(("year", year_value.as_str()));
        }
        let items: Container<ItemList> = self.server.get_json(&path, &query)?;
        Ok(items
            .media_container
            .metadata
            .into_iter()
            .map(RawItem::into_item)
            .collect())
    }
}

// --- Plex JSON response shapes ---

#[derive(Debug, Deserialize)]
struct Container<T> {
    #[serde(rename = "MediaContainer")]
    media_container: T,
}

#[derive(Debug, Deserialize)]
struct Identity {
    #[serde(rename = "machineIdentifier")]
    _machine_identifier: String,
}

#[derive(Debug, Deserialize)]
struct SectionList {
    #[serde(rename = "Directory", default)]
    directories: Vec<SectionDirectory>,
}

#[derive(Debug, Deserialize)]
struct SectionDirectory {
    key: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(rename = "ratingKey")]
    rating_key: String,
    title: String,
    year: Option<i32>,
    /// Season index on children of a show (0 for Specials).
    index: Option<u32>,
    #[serde(rename = "Location", default)]
    locations: Vec<RawLocation>,
    #[serde(rename = "Media", default)]
    media: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    path: String,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Deserialize)]
struct RawPart {
    file: String,
}

impl RawItem {
    fn into_item(self) -> LibraryItem {
        // Shows carry Location entries; movies only expose their media
        // files, which stand in as locations like plexapi does.
        let locations = if self.locations.is_empty() {
            self.media
                .into_iter()
                .flat_map(|media| media.parts)
                .map(|part| PathBuf::from(part.file))
                .collect()
        } else {
            self.locations
                .into_iter()
                .map(|location| PathBuf::from(location.path))
                .collect()
        };

        LibraryItem {
            rating_key: self.rating_key,
            title: self.title,
            year: self.year,
            locations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_search_response_parses_locations() {
        let json = r#"{
            "MediaContainer": {
                "size": 1,
                "Metadata": [{
                    "ratingKey": "123",
                    "title": "Foo",
                    "year": 2020,
                    "Location": [{"path": "/media/tv/Foo (2020)"}]
                }]
            }
        }"#;
        let items: Container<ItemList> = serde_json::from_str(json).unwrap();
        let item = items.media_container.metadata.into_iter().next().unwrap().into_item();
        assert_eq!(item.rating_key, "123");
        assert_eq!(item.identity(), "Foo (2020)");
        assert_eq!(item.locations, vec![PathBuf::from("/media/tv/Foo (2020)")]);
    }

    #[test]
    fn test_movie_falls_back_to_media_part_files() {
        let json = r#"{
            "MediaContainer": {
                "Metadata": [{
                    "ratingKey": "77",
                    "title": "Dune",
                    "year": 2021,
                    "Media": [{"Part": [{"file": "/media/movies/Dune (2021)/Dune.mkv"}]}]
                }]
            }
        }"#;
        let items: Container<ItemList> = serde_json::from_str(json).unwrap();
        let item = items.media_container.metadata.into_iter().next().unwrap().into_item();
        assert_eq!(
            item.locations,
            vec![PathBuf::from("/media/movies/Dune (2021)/Dune.mkv")]
        );
    }

    #[test]
    fn test_empty_search_response() {
        let json = r#"{"MediaContainer": {"size": 0}}"#;
        let items: Container<ItemList> = serde_json::from_str(json).unwrap();
        assert!(items.media_container.metadata.is_empty());
    }

    #[test]
    fn test_identity_without_year() {
        let item = LibraryItem {
            rating_key: "9".to_string(),
            title: "Foo".to_string(),
            year: None,
            locations: Vec::new(),
        };
        assert_eq!(item.identity(), "Foo");
    }
}
