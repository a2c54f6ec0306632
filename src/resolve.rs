//! Tiered title resolution
//!
//! Matches one scraped descriptor to a concrete library item. Three tiers,
//! each tried only when the previous one came back empty:
//!
//! 1. exact search by title and year,
//! 2. bare search by title alone (covers year disagreements between the
//!    catalog and the server's metadata),
//! 3. alternate-title fallback: TMDb candidates for the same release,
//!    each retried as a bare search.
//!
//! The first result in server order always wins; there is no scoring. A
//! failing fallback service is never an error, just an empty tier.

use crate::descriptor::PosterDescriptor;
use crate::plex::{LibraryItem, PlexError, SectionSearch};
use crate::tmdb::AlternativeTitles;

/// Resolves a descriptor against a library section.
///
/// `Ok(None)` means no tier produced a match; descriptors without a title
/// (page-load fallbacks) resolve to `None` immediately.
pub(crate) fn resolve<S, A>(
    section: &S,
    alt_titles: Option<&A>,
    descriptor: &PosterDescriptor,
) -> Result<Option<LibraryItem>, PlexError>
where
    S: SectionSearch,
    A: AlternativeTitles,
{
    let Some(title) = descriptor.title.as_deref() else {
        return Ok(None);
    };

    if let Some(item) = section.search(title, descriptor.year)?.into_iter().next() {
        return Ok(Some(item));
    }

    if let Some(item) = section.search(title, None)?.into_iter().next() {
        return Ok(Some(item));
    }

    if let Some(alt_titles) = alt_titles
        && let Some(year) = descriptor.year
    {
        match alt_titles.alternative_titles(title, year, descriptor.kind.media_kind()) {
            Ok(candidates) => {
                for candidate in candidates {
                    if candidate == title {
                        continue;
                    }
                    if let Some(item) = section.search(&candidate, None)?.into_iter().next() {
                        return Ok(Some(item));
                    }
                }
            }
            // Fallback-service failures are swallowed; the tier just
            // contributes nothing.
            Err(_) => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MediaKind, PosterKind, Provenance};
    use crate::tmdb::TmdbError;
    use std::collections::HashMap;

    struct FakeSection {
        exact: HashMap<(String, i32), Vec<LibraryItem>>,
        bare: HashMap<String, Vec<LibraryItem>>,
    }

    impl FakeSection {
        fn empty() -> Self {
            Self {
                exact: HashMap::new(),
                bare: HashMap::new(),
            }
        }
    }

    impl SectionSearch for FakeSection {
        fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<LibraryItem>, PlexError> {
            let results = match year {
                Some(year) => self.exact.get(&(title.to_string(), year)),
                None => self.bare.get(title),
            };
            Ok(results.cloned().unwrap_or_default())
        }
    }

    /// Fallback that must never be consulted.
    struct PanickingAlternatives;

    impl AlternativeTitles for PanickingAlternatives {
        fn alternative_titles(
            &self,
            _title: &str,
            _year: i32,
            _kind: MediaKind,
        ) -> Result<Vec<String>, TmdbError> {
            panic!("fallback service must not be consulted");
        }
    }

    struct FailingAlternatives;

    impl AlternativeTitles for FailingAlternatives {
        fn alternative_titles(
            &self,
            _title: &str,
            _year: i32,
            _kind: MediaKind,
        ) -> Result<Vec<String>, TmdbError> {
            Err(TmdbError::Request("connection refused".to_string()))
        }
    }

    struct FixedAlternatives(Vec<String>);

    impl AlternativeTitles for FixedAlternatives {
        fn alternative_titles(
            &self,
            _title: &str,
            _year: i32,
            _kind: MediaKind,
        ) -> Result<Vec<String>, TmdbError> {
            Ok(self.0.clone())
        }
    }

    fn item(title: &str, year: i32) -> LibraryItem {
        LibraryItem {
            rating_key: "1".to_string(),
            title: title.to_string(),
            year: Some(year),
            locations: Vec::new(),
        }
    }

    fn movie_descriptor(title: &str, year: i32) -> PosterDescriptor {
        PosterDescriptor {
            title: Some(title.to_string()),
            year: Some(year),
            kind: PosterKind::Movie,
            asset_url: "https://theposterdb.com/api/assets/1".to_string(),
            provenance: Provenance::Set,
        }
    }

    #[test]
    fn test_exact_tier_wins() {
        let mut section = FakeSection::empty();
        section
            .exact
            .insert(("Foo".to_string(), 2020), vec![item("Foo", 2020)]);
        let resolved = resolve(&section, Some(&PanickingAlternatives), &movie_descriptor("Foo", 2020))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.title, "Foo");
    }

    #[test]
    fn test_bare_tier_wins_without_touching_fallback() {
        let mut section = FakeSection::empty();
        // The server disagrees about the year, so only the bare search hits.
        section.bare.insert("Foo".to_string(), vec![item("Foo", 2019)]);
        let resolved = resolve(&section, Some(&PanickingAlternatives), &movie_descriptor("Foo", 2020))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.year, Some(2019));
    }

    #[test]
    fn test_fallback_candidate_resolves() {
        let mut section = FakeSection::empty();
        section
            .bare
            .insert("Le Foo".to_string(), vec![item("Le Foo", 2020)]);
        let alternatives =
            FixedAlternatives(vec!["Foo".to_string(), "Le Foo".to_string()]);
        let resolved = resolve(&section, Some(&alternatives), &movie_descriptor("Foo", 2020))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.title, "Le Foo");
    }

    #[test]
    fn test_failing_fallback_yields_not_found() {
        let section = FakeSection::empty();
        let resolved = resolve(&section, Some(&FailingAlternatives), &movie_descriptor("Foo", 2020)).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_no_fallback_configured_yields_not_found() {
        let section = FakeSection::empty();
        let resolved =
            resolve::<_, PanickingAlternatives>(&section, None, &movie_descriptor("Foo", 2020))
                .unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_descriptor_without_title_resolves_to_none() {
        let section = FakeSection::empty();
        let descriptor = PosterDescriptor {
            title: None,
            year: None,
            kind: PosterKind::Movie,
            asset_url: "https://theposterdb.com/api/assets/1".to_string(),
            provenance: Provenance::Single,
        };
        let resolved =
            resolve(&section, Some(&PanickingAlternatives), &descriptor).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_fallback_needs_a_year() {
        let section = FakeSection::empty();
        let mut descriptor = movie_descriptor("Foo", 2020);
        descriptor.year = None;
        // Without a year the fallback tier is skipped entirely.
        let resolved =
            resolve(&section, Some(&PanickingAlternatives), &descriptor).unwrap();
        assert_eq!(resolved, None);
    }
}
