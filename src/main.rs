use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use poster_sync::{
    CATALOG_DOMAIN, Config, ProgressEvent, RunStats, read_import_file, sync_posters,
};

/// Download posters from ThePosterDB and apply them to a Plex library
#[derive(Debug, Parser)]
#[command(name = "poster_sync", version, about)]
struct Cli {
    /// ThePosterDB set or poster URL to process
    url: Option<String>,

    /// File with one ThePosterDB URL per line (blank lines and # comments ignored)
    #[arg(long, value_name = "PATH")]
    import_file: Option<PathBuf>,

    /// Base URL of the Plex server, e.g. http://localhost:32400
    #[arg(long, env = "PLEX_BASE_URL")]
    plex_base_url: String,

    /// Plex authentication token
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    plex_token: String,

    /// Directory receiving persistent copies of movie posters
    #[arg(long, env = "MOVIES_POSTER_DIR")]
    movies_poster_dir: PathBuf,

    /// Directory receiving persistent copies of show posters
    #[arg(long, env = "SERIES_POSTER_DIR")]
    series_poster_dir: PathBuf,

    /// Name of the Plex movie library section
    #[arg(long, env = "MOVIES_LIBRARY", default_value = "Movies")]
    movies_library: String,

    /// Name of the Plex show library section
    #[arg(long, env = "SERIES_LIBRARY", default_value = "TV Shows")]
    series_library: String,

    /// JPEG quality used when recompressing posters (1-100)
    #[arg(long, env = "JPEG_QUALITY", default_value_t = 85)]
    jpeg_quality: u8,

    /// TMDb API key enabling the alternate-title fallback
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// Whether the TMDb alternate-title fallback is used
    #[arg(
        long,
        env = "USE_TMDB",
        action = ArgAction::Set,
        default_value_t = true,
        value_name = "BOOL"
    )]
    use_tmdb: bool,
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Connecting { base_url } => {
            println!("Connecting to Plex at {}...", base_url);
        }
        ProgressEvent::Connected => {
            println!("Connected.");
        }
        ProgressEvent::ProcessingUrl { index, total, url } => {
            println!("\n[{}/{}] Processing: {}", index + 1, total, url);
        }
        ProgressEvent::PageFetchFailed { url, error } => {
            println!("  Failed to load {}: {}", url, error);
        }
        ProgressEvent::PostersFound { movies, shows } => {
            println!(
                "  Found {} movie poster(s) and {} show poster(s)",
                movies, shows
            );
        }
        ProgressEvent::Matched { item, season } => match season {
            Some(season) if season != "Cover" => {
                println!("  Matched: {} (Season {})", item, season);
            }
            _ => println!("  Matched: {}", item),
        },
        ProgressEvent::NoMatch { title } => {
            println!("  No library match for '{}', skipping", title);
        }
        ProgressEvent::ResolveFailed { title, error } => {
            println!("  Lookup failed for '{}': {}", title, error);
        }
        ProgressEvent::SkippedDuplicate { item } => {
            println!("  Cover already applied for {}, skipping", item);
        }
        ProgressEvent::Applied { item, target } => {
            println!("  Applied: {} -> {}", item, target.display());
        }
        ProgressEvent::ApplyFailed { item, error } => {
            println!("  Failed: {} ({})", item, error);
        }
        ProgressEvent::Complete => {}
    }
}

/// Collects the catalog URLs to process, prompting when none were given.
fn gather_urls(url: Option<String>, import_file: Option<&PathBuf>) -> Result<Vec<String>, String> {
    let mut urls = Vec::new();

    if let Some(url) = url {
        urls.push(url);
    }
    if let Some(path) = import_file {
        let imported = read_import_file(path)
            .map_err(|e| format!("Cannot read import file {}: {}", path.display(), e))?;
        urls.extend(imported);
    }
    if !urls.is_empty() {
        return Ok(urls);
    }

    // Nothing on the command line: ask.
    let theme = ColorfulTheme::default();
    let choice = Select::with_theme(&theme)
        .with_prompt("No URL given. What would you like to do?")
        .items(&["Enter a ThePosterDB URL", "Import URLs from a file"])
        .default(0)
        .interact()
        .map_err(|e| e.to_string())?;

    if choice == 0 {
        let url: String = Input::with_theme(&theme)
            .with_prompt("ThePosterDB URL")
            .interact_text()
            .map_err(|e| e.to_string())?;
        urls.push(url.trim().to_string());
    } else {
        let path: String = Input::with_theme(&theme)
            .with_prompt("Path to URL file")
            .interact_text()
            .map_err(|e| e.to_string())?;
        let path = PathBuf::from(path.trim());
        let imported = read_import_file(&path)
            .map_err(|e| format!("Cannot read import file {}: {}", path.display(), e))?;
        urls.extend(imported);
    }

    Ok(urls)
}

fn print_summary(stats: &RunStats) {
    println!("\n=== Run Summary ===");
    println!("  Applied: {}", stats.success);
    println!("  Failed:  {}", stats.failed);
    println!("  Skipped: {}", stats.skipped);

    if !stats.errors.is_empty() {
        println!("\nErrors:");
        for error in &stats.errors {
            println!("  - {}", error);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = Config {
        plex_base_url: cli.plex_base_url,
        plex_token: cli.plex_token,
        movies_poster_dir: cli.movies_poster_dir,
        series_poster_dir: cli.series_poster_dir,
        movies_library: cli.movies_library,
        series_library: cli.series_library,
        jpeg_quality: cli.jpeg_quality,
        tmdb_api_key: cli.tmdb_api_key,
        use_tmdb: cli.use_tmdb,
        ..Config::default()
    };

    match config.validate() {
        Ok(warnings) => {
            for warning in warnings {
                eprintln!("Warning: {}", warning);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    let urls = match gather_urls(cli.url, cli.import_file.as_ref()) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if urls.is_empty() {
        eprintln!("No catalog URLs to process.");
        process::exit(1);
    }
    for url in &urls {
        if !url.contains(CATALOG_DOMAIN) {
            eprintln!("Error: Not a {} URL: {}", CATALOG_DOMAIN, url);
            process::exit(1);
        }
    }

    match sync_posters(&config, &urls, handle_progress_event) {
        Ok(stats) => {
            print_summary(&stats);
            if stats.failed > 0 {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\nError during synchronization: {}", e);
            process::exit(1);
        }
    }
}
