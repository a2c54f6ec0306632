//! Artwork application
//!
//! Takes a resolved library item and its poster descriptor through
//! download, normalization, upload, and deterministic on-disk placement,
//! accumulating per-run statistics. Nothing here aborts the run: every
//! failure is converted into an [`ApplyOutcome`] and a stats update.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crate::RunStats;
use crate::compress::compress_image;
use crate::config::Config;
use crate::descriptor::{MediaKind, PosterDescriptor, SeasonTarget};
use crate::fetch::AssetFetcher;
use crate::plex::{ArtworkStore, LibraryItem};
use crate::scratch::{COMPRESSED_SCRATCH_NAME, RAW_SCRATCH_NAME, ScratchFile};

/// What happened to one descriptor in the apply step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    /// Poster uploaded and placed at the given path.
    Applied { target: PathBuf },
    /// Cover request for a show already handled in this run.
    SkippedDuplicate,
    /// Asset download exhausted its retries; nothing was uploaded.
    DownloadFailed,
    /// The server rejected the upload.
    UploadFailed { error: String },
    /// Upload succeeded but the persistent copy could not be placed.
    MoveFailed { error: String },
}

/// Applies posters to resolved items, one at a time.
///
/// Holds the run-scoped set of show identities that already received a
/// poster, which backs the cover-level idempotency guard.
pub(crate) struct ArtworkApplier<'a, F, S> {
    fetcher: &'a F,
    store: &'a S,
    config: &'a Config,
    scratch_dir: PathBuf,
    processed_shows: HashSet<String>,
}

impl<'a, F, S> ArtworkApplier<'a, F, S>
where
    F: AssetFetcher,
    S: ArtworkStore,
{
    pub fn new(fetcher: &'a F, store: &'a S, config: &'a Config, scratch_dir: PathBuf) -> Self {
        Self {
            fetcher,
            store,
            config,
            scratch_dir,
            processed_shows: HashSet::new(),
        }
    }

    /// Downloads, normalizes, uploads, and places one poster.
    ///
    /// Scratch files are cleaned up on every exit path; `stats` is updated
    /// exactly once per call.
    pub fn apply(
        &mut self,
        item: &LibraryItem,
        descriptor: &PosterDescriptor,
        stats: &mut RunStats,
    ) -> ApplyOutcome {
        let identity = item.identity();
        let season = descriptor.season();

        // Cover requests for a show handled earlier in this run are
        // redundant; season requests never are.
        if season == Some(SeasonTarget::Cover) && self.processed_shows.contains(&identity) {
            stats.skipped += 1;
            return ApplyOutcome::SkippedDuplicate;
        }

        let raw = ScratchFile::new(&self.scratch_dir, RAW_SCRATCH_NAME);
        let compressed = ScratchFile::new(&self.scratch_dir, COMPRESSED_SCRATCH_NAME);

        if self
            .fetcher
            .download(&descriptor.asset_url, raw.path())
            .is_err()
        {
            stats.failed += 1;
            return ApplyOutcome::DownloadFailed;
        }

        // Normalization failure is non-fatal: upload the raw download.
        let upload_path =
            match compress_image(raw.path(), compressed.path(), self.config.jpeg_quality) {
                Ok(()) => compressed.path(),
                Err(_) => raw.path(),
            };

        let upload_result = match season.and_then(SeasonTarget::index) {
            None => self.store.upload_poster(item, upload_path),
            Some(index) => self.store.upload_season_poster(item, index, upload_path),
        };
        if let Err(error) = upload_result {
            stats.failed += 1;
            let error = match season {
                Some(season) => format!("{} - Season {}: {}", item.title, season, error),
                None => format!("{}: Upload failed - {}", identity, error),
            };
            stats.errors.push(error.clone());
            return ApplyOutcome::UploadFailed { error };
        }

        // The Plex server dislikes rapid-fire poster uploads.
        thread::sleep(self.config.upload_delay);

        let target_dir = self.target_dir(item, descriptor.kind.media_kind());
        let target_path = target_dir.join(target_file_name(season));
        let placed = fs::create_dir_all(&target_dir).and_then(|_| move_file(upload_path, &target_path));
        if let Err(error) = placed {
            stats.failed += 1;
            let error = format!("Move failed for {}: {}", target_path.display(), error);
            stats.errors.push(error.clone());
            return ApplyOutcome::MoveFailed { error };
        }

        stats.success += 1;
        if season.is_some() {
            self.processed_shows.insert(identity);
        }
        ApplyOutcome::Applied {
            target: target_path,
        }
    }

    /// Deterministic directory for the persistent poster copy.
    ///
    /// Named after the item's on-disk folder when Plex knows one: the
    /// location itself for shows, the containing directory for movies
    /// (whose locations are media files). Items without locations fall back
    /// to a sanitized `"Title (Year)"` directory.
    fn target_dir(&self, item: &LibraryItem, kind: MediaKind) -> PathBuf {
        let base = match kind {
            MediaKind::Movie => &self.config.movies_poster_dir,
            MediaKind::Show => &self.config.series_poster_dir,
        };

        let dir_name = item
            .locations
            .first()
            .and_then(|location| match kind {
                MediaKind::Show => location.file_name(),
                MediaKind::Movie => location.parent().and_then(Path::file_name),
            })
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| clean_filename(&item.identity()));

        base.join(dir_name)
    }
}

/// File name for the persistent copy: `poster.jpg` for movies and show
/// covers, zero-padded `SeasonNN.jpg` for seasons (Specials is season 00).
pub(crate) fn target_file_name(season: Option<SeasonTarget>) -> String {
    match season.and_then(SeasonTarget::index) {
        Some(index) => format!("Season{:02}.jpg", index),
        None => "poster.jpg".to_string(),
    }
}

/// Strips characters that are invalid in directory names.
pub(crate) fn clean_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\\' | '/'))
        .collect()
}

/// Moves a file, falling back to copy + remove for cross-device targets.
fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)?;
    fs::remove_file(source)
}
