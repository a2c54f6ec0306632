//! Import file reading
//!
//! Batch mode reads a newline-delimited list of ThePosterDB URLs. Blank
//! lines, `#` comments, and lines not pointing at the catalog site are
//! ignored rather than treated as errors.

use std::fs;
use std::io;
use std::path::Path;

use crate::scrape::CATALOG_DOMAIN;

/// Reads an import file and returns the usable URLs in order.
pub fn read_import_file(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && line.contains(CATALOG_DOMAIN))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_import_file_filters_noise() {
        let path = std::env::temp_dir().join(format!("poster_sync_import_{}.txt", std::process::id()));
        fs::write(
            &path,
            "# my poster sets\n\
             https://theposterdb.com/set/42\n\
             \n\
             https://example.com/not-a-poster\n\
             # https://theposterdb.com/set/99\n\
             https://theposterdb.com/poster/7\n",
        )
        .unwrap();

        let urls = read_import_file(&path).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://theposterdb.com/set/42".to_string(),
                "https://theposterdb.com/poster/7".to_string(),
            ]
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_import_file_missing_file() {
        let result = read_import_file(Path::new("/nonexistent/poster_sync_urls.txt"));
        assert!(result.is_err());
    }
}
