//! Canonical parsed representation of scraped posters.
//!
//! A [`PosterDescriptor`] is the immutable value handed from the scraper to
//! the resolver and applier. Show posters carry a season designator; movie
//! posters structurally cannot.

use std::fmt;

/// The broad library kind a descriptor (or section) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Show,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Show => write!(f, "show"),
        }
    }
}

/// Which poster of a show a descriptor targets.
///
/// `Cover` is the whole-series poster; `Specials` maps to Plex season
/// index 0; `Number` is a regular one-based season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonTarget {
    Cover,
    Specials,
    Number(u32),
}

impl SeasonTarget {
    /// The Plex season index this target addresses, or `None` for the cover.
    pub fn index(self) -> Option<u32> {
        match self {
            SeasonTarget::Cover => None,
            SeasonTarget::Specials => Some(0),
            SeasonTarget::Number(n) => Some(n),
        }
    }
}

impl fmt::Display for SeasonTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonTarget::Cover => write!(f, "Cover"),
            SeasonTarget::Specials => write!(f, "0"),
            SeasonTarget::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Kind-specific part of a descriptor.
///
/// Modeled as a tagged variant so a movie descriptor cannot carry a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterKind {
    Movie,
    Show { season: SeasonTarget },
}

impl PosterKind {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            PosterKind::Movie => MediaKind::Movie,
            PosterKind::Show { .. } => MediaKind::Show,
        }
    }
}

/// Where a descriptor was scraped from. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// A poster-set page listing many posters.
    Set,
    /// A single-poster page.
    Single,
}

/// One scraped poster, ready for resolution against the library.
///
/// `title` and `year` may be absent when the source page degraded (load
/// failure or unparseable title); such descriptors flow downstream and are
/// counted as skipped when the resolver cannot match them.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterDescriptor {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub kind: PosterKind,
    /// Direct asset URL, derived from the per-asset id, never the page URL.
    pub asset_url: String,
    pub provenance: Provenance,
}

impl PosterDescriptor {
    /// Title for display in progress output; never fails.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("<unknown>")
    }

    /// Season target for show descriptors, `None` for movies.
    pub fn season(&self) -> Option<SeasonTarget> {
        match self.kind {
            PosterKind::Movie => None,
            PosterKind::Show { season } => Some(season),
        }
    }
}
