//! Trackshelf command-line front end
//!
//! Drives the list controller and mutation coordinator against a tracks
//! backend. Each subcommand maps to one user action of the tracks page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use trackshelf_common::config::{ClientConfig, ConfigResolver};
use trackshelf_common::time::format_date;
use trackshelf_common::{Track, TrackQuery};
use trackshelf_ui::forms::TrackDraft;
use trackshelf_ui::{
    AudioFile, Debouncer, FetchOutcome, HttpTrackApi, ListController, ListView,
    MutationCoordinator, MutationError, TrackApi,
};

/// Command-line arguments for trackshelf
#[derive(Parser, Debug)]
#[command(name = "trackshelf")]
#[command(about = "Browse, search and edit tracks on a tracks backend")]
#[command(version)]
struct Args {
    /// Backend base URL (e.g. http://localhost:8000/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: <config dir>/trackshelf/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of tracks
    List(PageArgs),
    /// Show available genres
    Genres,
    /// Create a track
    Create(DraftArgs),
    /// Edit a track on the selected page
    Edit {
        id: String,
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        draft: DraftArgs,
        /// Add or remove a genre (repeatable)
        #[arg(long = "toggle-genre")]
        toggle_genres: Vec<String>,
    },
    /// Delete a track
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Upload an MP3 or WAV file for a track
    Upload { id: String, path: PathBuf },
    /// Print the playback URL of a track on the selected page
    AudioUrl {
        id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Interactive search: one search term per line on stdin
    Browse {
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        artist: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    artist: Option<String>,
}

#[derive(ClapArgs, Debug, Default)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    artist_name: Option<String>,
    #[arg(long)]
    album: Option<String>,
    #[arg(long)]
    cover: Option<String>,
    /// Genre name (repeatable); replaces the current selection
    #[arg(long = "with-genre")]
    genres: Vec<String>,
}

impl DraftArgs {
    fn apply(&self, draft: &mut TrackDraft) {
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(artist) = &self.artist_name {
            draft.artist = artist.clone();
        }
        if let Some(album) = &self.album {
            draft.album = album.clone();
        }
        if let Some(cover) = &self.cover {
            draft.cover_image = cover.clone();
        }
        if !self.genres.is_empty() {
            draft.genres = self.genres.clone();
        }
    }
}

struct App {
    api: Arc<HttpTrackApi>,
    list: Arc<ListController>,
    mutations: MutationCoordinator,
    config: ClientConfig,
}

impl App {
    fn new(config: ClientConfig) -> Result<Self> {
        let api = Arc::new(HttpTrackApi::from_config(&config).context("Failed to create API client")?);
        let dyn_api: Arc<dyn TrackApi> = api.clone();
        let list = Arc::new(ListController::new(dyn_api.clone(), config.page_limit));
        let mutations = MutationCoordinator::new(dyn_api, Arc::clone(&list));
        Ok(Self {
            api,
            list,
            mutations,
            config,
        })
    }

    /// Apply page selection flags and fetch
    async fn load_page(&self, args: &PageArgs) -> Result<ListView> {
        let query = TrackQuery::new(
            args.page.unwrap_or(1),
            args.limit.unwrap_or(self.config.page_limit),
        )
        .with_search(args.search.clone())
        .with_genre(args.genre.clone())
        .with_artist(args.artist.clone());

        match self.list.set_query(query).await {
            FetchOutcome::Failed(e) => Err(e).context("Failed to load tracks"),
            _ => {
                let view = self.list.view().await;
                if let Some(error) = &view.error {
                    bail!("Failed to load tracks: {}", error);
                }
                Ok(view)
            }
        }
    }

    async fn find_on_page(&self, id: &str, args: &PageArgs) -> Result<Track> {
        self.load_page(args).await?;
        match self.list.find(id).await {
            Some(track) => Ok(track),
            None => bail!("Track {} is not on the selected page (narrow with --search)", id),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .with_api_url(args.api_url.clone())
        .with_config_path(args.config.clone())
        .resolve()
        .context("Failed to load configuration")?;

    // Logs go to stderr so stdout stays clean for listings
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting trackshelf v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base_url
    );

    let app = App::new(config)?;
    let result = run(&app, args.command).await;
    app.list.close();
    result
}

async fn run(app: &App, command: Command) -> Result<()> {
    match command {
        Command::List(page) => {
            let view = app.load_page(&page).await?;
            print_view(&view, &app.api);
        }

        Command::Genres => {
            app.list.load_genres().await.context("Failed to load genres")?;
            for genre in app.list.view().await.genres {
                if genre.id == genre.name {
                    println!("{}", genre.name);
                } else {
                    println!("{}\t{}", genre.id, genre.name);
                }
            }
        }

        Command::Create(draft) => {
            app.mutations.open_create().await;
            app.mutations.update_draft(|d| draft.apply(d)).await;
            let track = submit(app).await?;
            println!("Created {} ({})", track.id, track.slug);
        }

        Command::Edit {
            id,
            page,
            draft,
            toggle_genres,
        } => {
            let track = app.find_on_page(&id, &page).await?;
            app.mutations.open_edit(&track).await;
            app.mutations.update_draft(|d| draft.apply(d)).await;
            for genre in &toggle_genres {
                app.mutations.toggle_genre(genre).await;
            }
            let track = submit(app).await?;
            println!("Updated {} ({})", track.id, track.slug);
        }

        Command::Delete { id, yes } => {
            app.mutations.request_delete(&id).await;
            let confirmed = match app.mutations.pending_delete().await {
                Some(prompt) if !yes => confirm(prompt.message).await?,
                _ => true,
            };
            if !confirmed {
                app.mutations.cancel_delete().await;
                println!("Cancelled");
                return Ok(());
            }
            match app.mutations.confirm_delete().await {
                Ok(id) => println!("Deleted {}", id),
                Err(MutationError::Api(e)) => bail!("{}", e.user_message()),
                Err(e) => return Err(e.into()),
            }
        }

        Command::Upload { id, path } => {
            let file = read_audio_file(&path).await?;
            match app.mutations.upload_audio(&id, file).await {
                Ok(track) => println!(
                    "Uploaded {} for {}",
                    track.audio_file.as_deref().unwrap_or("audio"),
                    track.id
                ),
                Err(MutationError::Api(e)) => bail!("Upload failed: {}", e.user_message()),
                Err(e) => bail!("{}", e),
            }
        }

        Command::AudioUrl { id, page } => {
            let track = app.find_on_page(&id, &page).await?;
            match app.api.audio_url(&track) {
                Some(url) => println!("{}", url),
                None => bail!("Track {} has no audio file", id),
            }
        }

        Command::Browse { genre, artist } => browse(app, genre, artist).await?,
    }
    Ok(())
}

async fn submit(app: &App) -> Result<Track> {
    match app.mutations.submit().await {
        Ok(track) => Ok(track),
        Err(MutationError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                eprintln!("{}: {}", field.name(), message);
            }
            bail!("Form has {} invalid field(s)", errors.len())
        }
        Err(MutationError::Api(e)) => bail!("{}", e.user_message()),
        Err(e) => Err(e.into()),
    }
}

async fn browse(app: &App, genre: Option<String>, artist: Option<String>) -> Result<()> {
    let query = TrackQuery::new(1, app.config.page_limit)
        .with_genre(genre)
        .with_artist(artist);
    app.list.set_query(query).await;
    if let Err(e) = app.list.load_genres().await {
        warn!(error = %e, "Genre list unavailable, continuing without it");
    }
    print_view(&app.list.view().await, &app.api);

    let debouncer = Debouncer::new(String::new(), app.config.search_debounce);
    let feed = app.list.spawn_search_feed(debouncer.subscribe());

    let list = Arc::clone(&app.list);
    let api = Arc::clone(&app.api);
    let mut revisions = app.list.subscribe();
    let printer = tokio::spawn(async move {
        while revisions.changed().await.is_ok() {
            revisions.borrow_and_update();
            print_view(&list.view().await, &api);
        }
    });

    eprintln!("Type a search term and press enter (Ctrl-D to quit)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        debouncer.set(line);
    }

    drop(debouncer);
    app.list.close();
    let _ = feed.await;
    printer.abort();
    Ok(())
}

async fn confirm(message: &str) -> Result<bool> {
    eprint!("{} [y/N] ", message);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let answer = lines.next_line().await.context("Failed to read answer")?;
    Ok(matches!(
        answer.as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes")
    ))
}

/// Read a file and determine its media type from content, then extension
async fn read_audio_file(path: &Path) -> Result<AudioFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type().to_string())
        .or_else(|| {
            let ext = path.extension()?.to_str()?.to_ascii_lowercase();
            match ext.as_str() {
                "mp3" => Some("audio/mpeg".to_string()),
                "wav" => Some("audio/wav".to_string()),
                _ => None,
            }
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    // Sniffers report WAV as audio/x-wav; the backend expects audio/wav
    let content_type = match content_type.as_str() {
        "audio/x-wav" | "audio/wave" => "audio/wav".to_string(),
        _ => content_type,
    };

    Ok(AudioFile::new(file_name, content_type, bytes))
}

fn print_view(view: &ListView, api: &HttpTrackApi) {
    if let Some(error) = &view.error {
        eprintln!("Error: {}", error);
    }

    for track in &view.items {
        let mut line = format!("{}\t{} / {}", track.id, track.title, track.artist);
        if let Some(album) = &track.album {
            line.push_str(&format!(" [{}]", album));
        }
        if !track.genres.is_empty() {
            line.push_str(&format!(" ({})", track.genres.join(", ")));
        }
        line.push_str(&format!("\tcreated {}", format_date(&track.created_at)));
        if let Some(url) = api.audio_url(track) {
            line.push_str(&format!("\t{}", url));
        }
        println!("{}", line);
    }

    println!(
        "Page {} of {} ({} tracks){}{}",
        view.pagination.page,
        view.pagination.total_pages.max(1),
        view.total,
        if view.pagination.has_prev { "  <prev" } else { "" },
        if view.pagination.has_next { "  next>" } else { "" },
    );
}
