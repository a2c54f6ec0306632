//! poster_sync - Synchronize ThePosterDB artwork into a Plex library
//!
//! This library scrapes poster metadata from ThePosterDB, resolves each
//! poster against the matching item in a Plex library, and applies the
//! artwork: download, JPEG normalization, upload to Plex, and a persistent
//! copy at a deterministic path under the configured poster directories.

mod apply;
mod compress;
mod config;
mod descriptor;
mod fetch;
mod input;
mod plex;
mod resolve;
mod scrape;
mod scratch;
mod tmdb;

use std::io;
use std::path::PathBuf;
use std::thread;

use thiserror::Error;

use apply::{ApplyOutcome, ArtworkApplier};
use fetch::AssetFetcher;
use plex::{ArtworkStore, PlexServer, SectionSearch};
use resolve::resolve;
use scrape::{scrape_set, scrape_single};
use tmdb::{AlternativeTitles, TmdbClient};

// Re-export error types
pub use compress::CompressError;
pub use config::ConfigError;
pub use fetch::FetchError;
pub use plex::PlexError;
pub use tmdb::TmdbError;

// Re-export the configuration and input surface
pub use config::Config;
pub use descriptor::{MediaKind, PosterDescriptor, PosterKind, Provenance, SeasonTarget};
pub use fetch::RetryPolicy;
pub use input::read_import_file;
pub use scrape::CATALOG_DOMAIN;

/// Progress event emitted during a synchronization run
///
/// These events allow library users to track progress and provide feedback
/// while posters are scraped, resolved, and applied.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Connecting to the Plex server
    Connecting { base_url: String },

    /// Plex connection established
    Connected,

    /// Starting on one input URL
    ProcessingUrl {
        index: usize,
        total: usize,
        url: String,
    },

    /// The catalog page could not be loaded; scraping degrades
    PageFetchFailed { url: String, error: String },

    /// Posters scraped from the current page
    PostersFound { movies: usize, shows: usize },

    /// A descriptor was matched to a library item
    Matched {
        item: String,
        season: Option<String>,
    },

    /// No library item matched a descriptor
    NoMatch { title: String },

    /// Resolution failed with a server error; the descriptor is skipped
    ResolveFailed { title: String, error: String },

    /// A redundant cover request was suppressed
    SkippedDuplicate { item: String },

    /// Poster uploaded and placed
    Applied { item: String, target: PathBuf },

    /// Poster could not be applied
    ApplyFailed { item: String, error: String },

    /// Run finished
    Complete,
}

/// Statistics accumulated over one synchronization run.
///
/// Printed by the caller at the end of the run; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
    /// Descriptive error strings for every failed upload or placement.
    pub errors: Vec<String>,
}

/// Top-level error type for poster_sync operations
///
/// Only setup problems end a run: bad configuration, an unreachable Plex
/// server, or a missing library section. Per-poster failures are
/// accumulated into [`RunStats`] instead.
#[derive(Debug, Error)]
pub enum PosterSyncError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error talking to the Plex server during setup
    #[error("Plex error: {0}")]
    Plex(#[from] PlexError),

    /// Error constructing the HTTP fetcher
    #[error("HTTP error: {0}")]
    Fetch(#[from] FetchError),

    /// Error constructing the TMDb client
    #[error("TMDb error: {0}")]
    Tmdb(#[from] TmdbError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Synchronizes posters from the given catalog URLs into the Plex library.
///
/// Each URL is scraped into poster descriptors (single-poster pages via
/// their `/poster/` path, everything else as a set page), every descriptor
/// is resolved against the matching library section, and each resolved
/// poster is downloaded, normalized, uploaded, and placed on disk. One
/// shared [`RunStats`] is accumulated across all URLs and returned; a
/// failing descriptor never aborts the rest of the run.
///
/// Progress events are emitted through the provided callback, allowing
/// library users to track progress, display status, or remain silent.
///
/// # Examples
///
/// ```no_run
/// use poster_sync::{sync_posters, Config, ProgressEvent};
///
/// let config = Config {
///     plex_base_url: "http://localhost:32400".to_string(),
///     plex_token: "plex-token-here".to_string(),
///     movies_poster_dir: "/data/posters/movies".into(),
///     series_poster_dir: "/data/posters/series".into(),
///     ..Config::default()
/// };
///
/// let urls = vec!["https://theposterdb.com/set/42".to_string()];
/// let stats = sync_posters(&config, &urls, |event| {
///     if let ProgressEvent::Applied { item, target } = event {
///         println!("{} -> {}", item, target.display());
///     }
/// }).unwrap();
/// println!("{} poster(s) applied", stats.success);
/// ```
pub fn sync_posters<F>(
    config: &Config,
    urls: &[String],
    mut progress_callback: F,
) -> Result<RunStats, PosterSyncError>
where
    F: FnMut(ProgressEvent),
{
    // Warnings are surfaced by the binary; hard errors stop the run here.
    config.validate()?;

    progress_callback(ProgressEvent::Connecting {
        base_url: config.plex_base_url.clone(),
    });
    let server = PlexServer::connect(&config.plex_base_url, &config.plex_token)?;
    progress_callback(ProgressEvent::Connected);

    let movies_section = server.section(&config.movies_library)?;
    let series_section = server.section(&config.series_library)?;

    let fetcher = fetch::HttpFetcher::new(config.page_retry, config.download_retry)?;
    let tmdb = match &config.tmdb_api_key {
        Some(api_key) if config.tmdb_enabled() => Some(TmdbClient::new(api_key.clone())?),
        _ => None,
    };

    let mut applier = ArtworkApplier::new(&fetcher, &server, config, std::env::temp_dir());
    let mut stats = RunStats::default();

    for (index, url) in urls.iter().enumerate() {
        progress_callback(ProgressEvent::ProcessingUrl {
            index,
            total: urls.len(),
            url: url.clone(),
        });

        let page = match fetcher.fetch_page(url) {
            Ok(page) => Some(page),
            Err(error) => {
                progress_callback(ProgressEvent::PageFetchFailed {
                    url: url.clone(),
                    error: error.to_string(),
                });
                None
            }
        };

        let (movie_posters, show_posters) = if url.contains("/poster/") {
            scrape_single(page.as_deref(), url)
        } else {
            scrape_set(page.as_deref())
        };
        progress_callback(ProgressEvent::PostersFound {
            movies: movie_posters.len(),
            shows: show_posters.len(),
        });

        process_descriptors(
            &movies_section,
            tmdb.as_ref(),
            &mut applier,
            &movie_posters,
            &mut stats,
            &mut progress_callback,
        );
        process_descriptors(
            &series_section,
            tmdb.as_ref(),
            &mut applier,
            &show_posters,
            &mut stats,
            &mut progress_callback,
        );

        // Pace batch processing so neither the catalog nor Plex is hammered.
        if index + 1 < urls.len() {
            thread::sleep(config.url_delay);
        }
    }

    progress_callback(ProgressEvent::Complete);
    Ok(stats)
}

/// Resolves and applies every descriptor against one library section.
fn process_descriptors<S, A, Fe, St, F>(
    section: &S,
    tmdb: Option<&A>,
    applier: &mut ArtworkApplier<'_, Fe, St>,
    descriptors: &[PosterDescriptor],
    stats: &mut RunStats,
    progress_callback: &mut F,
) where
    S: SectionSearch,
    A: AlternativeTitles,
    Fe: AssetFetcher,
    St: ArtworkStore,
    F: FnMut(ProgressEvent),
{
    for descriptor in descriptors {
        match resolve(section, tmdb, descriptor) {
            Ok(Some(item)) => {
                progress_callback(ProgressEvent::Matched {
                    item: item.identity(),
                    season: descriptor.season().map(|season| season.to_string()),
                });
                match applier.apply(&item, descriptor, stats) {
                    ApplyOutcome::Applied { target } => {
                        progress_callback(ProgressEvent::Applied {
                            item: item.identity(),
                            target,
                        });
                    }
                    ApplyOutcome::SkippedDuplicate => {
                        progress_callback(ProgressEvent::SkippedDuplicate {
                            item: item.identity(),
                        });
                    }
                    ApplyOutcome::DownloadFailed => {
                        progress_callback(ProgressEvent::ApplyFailed {
                            item: item.identity(),
                            error: "download failed after retries".to_string(),
                        });
                    }
                    ApplyOutcome::UploadFailed { error } | ApplyOutcome::MoveFailed { error } => {
                        progress_callback(ProgressEvent::ApplyFailed {
                            item: item.identity(),
                            error,
                        });
                    }
                }
            }
            Ok(None) => {
                stats.skipped += 1;
                progress_callback(ProgressEvent::NoMatch {
                    title: descriptor.display_title().to_string(),
                });
            }
            Err(error) => {
                stats.skipped += 1;
                stats
                    .errors
                    .push(format!("{}: {}", descriptor.display_title(), error));
                progress_callback(ProgressEvent::ResolveFailed {
                    title: descriptor.display_title().to_string(),
                    error: error.to_string(),
                });
            }
        }
    }
}
