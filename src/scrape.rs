//! ThePosterDB page scraping
//!
//! Turns fetched catalog pages into [`PosterDescriptor`]s. Both entry
//! points are pure functions of the page content: a failed page load or a
//! missing grid degrades to empty results (or a bare fallback descriptor
//! for single-poster pages), never an error. Asset URLs are always built
//! from the per-poster asset id, not from thumbnail or page URLs.
//!
//! Tied to ThePosterDB's DOM: the class lists and the `data-poster-id`
//! attribute below are the site's current page structure.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::descriptor::{PosterDescriptor, PosterKind, Provenance, SeasonTarget};

/// Host recognized as the catalog site in URLs and import files.
pub const CATALOG_DOMAIN: &str = "theposterdb.com";

const ASSET_URL_BASE: &str = "https://theposterdb.com/api/assets";

macro_rules! selector {
    ($name:ident, $css:expr) => {
        static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

selector!(GRID_SELECTOR, "div.row.d-flex.flex-wrap.m-0.w-100.mx-n1.mt-n1");
selector!(CELL_SELECTOR, "div.col-6.col-lg-2.p-1");
selector!(MEDIA_TYPE_SELECTOR, "a.text-white[data-toggle=\"tooltip\"]");
selector!(OVERLAY_SELECTOR, "div.overlay");
selector!(CELL_TITLE_SELECTOR, "p.p-0.mb-1.text-break");
selector!(DETAIL_FIELD_SELECTOR, "p.pb-0.mb-0");
selector!(STRONG_SELECTOR, "strong");
selector!(HEADING_SELECTOR, "p.h1.m-0.mt-2.text-center.text-md-left.text-wrap");
selector!(ANCHOR_SELECTOR, "a");
selector!(PAGE_TITLE_SELECTOR, "title");

static TITLE_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.+?)\s*\((\d{4})\)").unwrap());

/// Direct download URL for a poster asset id.
fn asset_url(poster_id: &str) -> String {
    format!("{}/{}", ASSET_URL_BASE, poster_id)
}

/// Scrapes a poster-set page into movie and show descriptors.
///
/// A missing page or absent poster grid is a soft failure and yields two
/// empty lists. Cells with missing attributes are silently dropped.
pub fn scrape_set(page: Option<&str>) -> (Vec<PosterDescriptor>, Vec<PosterDescriptor>) {
    let Some(page) = page else {
        return (Vec::new(), Vec::new());
    };
    let document = Html::parse_document(page);
    let Some(grid) = document.select(&GRID_SELECTOR).next() else {
        return (Vec::new(), Vec::new());
    };

    let mut movies = Vec::new();
    let mut shows = Vec::new();

    for cell in grid.select(&CELL_SELECTOR) {
        let media_type = cell
            .select(&MEDIA_TYPE_SELECTOR)
            .next()
            .and_then(|anchor| anchor.value().attr("title"));
        let poster_id = cell
            .select(&OVERLAY_SELECTOR)
            .next()
            .and_then(|overlay| overlay.value().attr("data-poster-id"));
        let title_text = cell
            .select(&CELL_TITLE_SELECTOR)
            .next()
            .map(|p| p.text().collect::<String>().trim().to_string());

        let (Some(media_type), Some(poster_id), Some(title_text)) =
            (media_type, poster_id, title_text)
        else {
            continue;
        };

        match media_type {
            "Movie" => {
                let (title, year) = parse_title_year(&title_text);
                movies.push(PosterDescriptor {
                    title,
                    year,
                    kind: PosterKind::Movie,
                    asset_url: asset_url(poster_id),
                    provenance: Provenance::Set,
                });
            }
            "Show" => {
                let (remainder, season) = split_season(&title_text);
                let (title, year) = parse_title_year(remainder);
                shows.push(PosterDescriptor {
                    title,
                    year,
                    kind: PosterKind::Show { season },
                    asset_url: asset_url(poster_id),
                    provenance: Provenance::Set,
                });
            }
            _ => {}
        }
    }

    (movies, shows)
}

/// Scrapes a single-poster page into descriptors.
///
/// The asset id comes from the trailing path segment of `source_url`, so an
/// asset URL exists even when the page never loaded. An unloadable page or
/// unparseable title yields one movie descriptor with no identity; the
/// caller hands it downstream as a fallback asset rather than dropping it.
pub fn scrape_single(
    page: Option<&str>,
    source_url: &str,
) -> (Vec<PosterDescriptor>, Vec<PosterDescriptor>) {
    let poster_id = source_url.rsplit('/').next().unwrap_or(source_url);
    let asset_url = asset_url(poster_id);

    let fallback = |asset_url: String| {
        (
            vec![PosterDescriptor {
                title: None,
                year: None,
                kind: PosterKind::Movie,
                asset_url,
                provenance: Provenance::Single,
            }],
            Vec::new(),
        )
    };

    let Some(page) = page else {
        return fallback(asset_url);
    };
    let document = Html::parse_document(page);

    // Labeled "Type:" field; pages without one are treated as movies.
    let media_type = document
        .select(&DETAIL_FIELD_SELECTOR)
        .find_map(|field| {
            let strong = field.select(&STRONG_SELECTOR).next()?;
            if strong.text().collect::<String>().trim() != "Type:" {
                return None;
            }
            let text = field.text().collect::<String>();
            text.split("Type:").nth(1).map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "Movie".to_string());

    // Primary heading, falling back to the page title tag.
    let title_text = document
        .select(&HEADING_SELECTOR)
        .next()
        .and_then(|heading| heading.select(&ANCHOR_SELECTOR).next())
        .map(|anchor| anchor.text().collect::<String>().trim().to_string())
        .or_else(|| {
            document
                .select(&PAGE_TITLE_SELECTOR)
                .next()
                .map(|title| title.text().collect::<String>().trim().to_string())
        })
        .unwrap_or_default();

    let Some(captures) = TITLE_YEAR_REGEX.captures(&title_text) else {
        return fallback(asset_url);
    };
    let title = captures[1].trim().to_string();
    let year = captures[2].parse::<i32>().ok();

    if media_type == "Movie" {
        return (
            vec![PosterDescriptor {
                title: Some(title),
                year,
                kind: PosterKind::Movie,
                asset_url,
                provenance: Provenance::Single,
            }],
            Vec::new(),
        );
    }

    let (_, season) = split_season(&title_text);
    (
        Vec::new(),
        vec![PosterDescriptor {
            title: Some(title),
            year,
            kind: PosterKind::Show { season },
            asset_url,
            provenance: Provenance::Single,
        }],
    )
}

/// Parses a `"Name (YYYY)"` display string, splitting on the last `" ("`.
///
/// The year is best-effort: anything that does not parse leaves the whole
/// string as the title with an absent year.
fn parse_title_year(text: &str) -> (Option<String>, Option<i32>) {
    if let Some((name, rest)) = text.rsplit_once(" (")
        && let Some(year_text) = rest.split(')').next()
        && let Ok(year) = year_text.parse::<i32>()
    {
        return (Some(name.to_string()), Some(year));
    }
    (Some(text.to_string()), None)
}

/// Splits a season designator off a show display string.
///
/// The trailing `" - "` segment encodes the season: `"Specials"`, or
/// `"Season N"` with an integer N. Anything else (including no separator at
/// all) is a cover request, and the segment stays part of the title.
fn split_season(text: &str) -> (&str, SeasonTarget) {
    if let Some((rest, segment)) = text.rsplit_once(" - ") {
        if segment == "Specials" {
            return (rest, SeasonTarget::Specials);
        }
        if segment.contains("Season")
            && let Some(number) = segment
                .split_whitespace()
                .nth(1)
                .and_then(|token| token.parse::<u32>().ok())
        {
            return (rest, SeasonTarget::Number(number));
        }
    }
    (text, SeasonTarget::Cover)
}
