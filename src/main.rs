use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use newsdeck::catalog::ArticleCatalog;
use newsdeck::config::{Config, USER_ID_ENV};
use newsdeck::favorites::{FavoriteSynchronizer, FavoritesList};
use newsdeck::feed::{FeedController, FilterCriteria, LoadOutcome, Paginator};
use newsdeck::gateway::{Article, ArticleId, HttpGateway, RemoteGateway};
use newsdeck::preferences::{PreferenceSet, PreferenceStore, SaveOutcome};
use newsdeck::session::Session;
use newsdeck::util::{strip_control_chars, truncate_to_width};

/// Widest title printed in list output.
const TITLE_WIDTH: usize = 80;

/// Get the config file path (~/.config/newsdeck/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("newsdeck")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdeck", about = "Personalized news feed client")]
struct Args {
    /// User id (overrides NEWSDECK_USER_ID and the config file)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Config file (default: ~/.config/newsdeck/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the personalized feed
    Feed {
        /// Only this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// Only this sentiment: positive, negative or neutral
        #[arg(long)]
        sentiment: Option<String>,
        /// Only articles whose title, summary or content contains this text
        #[arg(long)]
        search: Option<String>,
        /// Page to show
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// List the categories available for preferences
    Categories,
    /// Show trending articles
    Trending {
        /// Number of articles (1-50, default from config)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one article in full
    Article { id: ArticleId },
    /// Show or change saved category preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },
    /// Manage favorite articles
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    /// Print the saved categories
    Show,
    /// Replace the saved categories (none clears them)
    Set { categories: Vec<String> },
    /// Add or remove one category
    Toggle { category: String },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List favorite articles
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Tell whether an article is a favorite
    Check { id: ArticleId },
    /// Add or remove an article from the favorites
    Toggle { id: ArticleId },
    /// Remove an article from the favorites
    Remove { id: ArticleId },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
        config.validate().context("Invalid --base-url")?;
    }

    let env_user = std::env::var(USER_ID_ENV).ok();
    let user_id = config.resolve_user_id(args.user.as_deref(), env_user.as_deref())?;
    let session = Session::new(user_id);

    let gateway: Arc<dyn RemoteGateway> = Arc::new(
        HttpGateway::new(&config.base_url, session.clone(), config.gateway_options())
            .context("Failed to set up backend client")?,
    );

    match args.command {
        Command::Feed {
            category,
            sentiment,
            search,
            page,
        } => {
            let criteria = FilterCriteria {
                category,
                sentiment,
                query: search,
            };
            run_feed(session, gateway, &config, criteria, page).await
        }
        Command::Categories => run_categories(gateway).await,
        Command::Trending { limit } => {
            run_trending(session, gateway, &config, limit.unwrap_or(config.trending_limit)).await
        }
        Command::Article { id } => run_article(session, gateway, &config, id).await,
        Command::Prefs { action } => run_prefs(session, gateway, action).await,
        Command::Favorites { action } => run_favorites(session, gateway, &config, action).await,
    }
}

async fn run_feed(
    session: Session,
    gateway: Arc<dyn RemoteGateway>,
    config: &Config,
    criteria: FilterCriteria,
    page: usize,
) -> Result<()> {
    let mut feed = FeedController::new(session, gateway, config.page_size);
    if feed.load().await == LoadOutcome::Degraded {
        if let Some(msg) = feed.status_message() {
            eprintln!("Warning: {msg}");
        }
    }
    if !feed.preferences().is_empty() {
        let prefs: Vec<&str> = feed.preferences().iter().collect();
        println!("Preferences: {}", prefs.join(", "));
    }
    if !criteria.is_empty() {
        feed.apply_filter(criteria);
    }
    if page != 1 && !feed.change_page(page) {
        eprintln!(
            "Page {page} does not exist (1-{}), showing page 1",
            feed.paginator().total_pages()
        );
    }

    if feed.visible().is_empty() {
        println!("No articles found.");
        return Ok(());
    }
    for article in feed.current_page().items {
        print_article_line(article);
    }
    print_page_controls(feed.paginator());
    Ok(())
}

async fn run_categories(gateway: Arc<dyn RemoteGateway>) -> Result<()> {
    let mut catalog = ArticleCatalog::new(gateway);
    catalog
        .load_categories()
        .await
        .context("Failed to load categories")?;
    if catalog.categories().is_empty() {
        println!("No categories available.");
    }
    for category in catalog.categories().iter() {
        println!("{}", strip_control_chars(category));
    }
    Ok(())
}

async fn run_trending(
    session: Session,
    gateway: Arc<dyn RemoteGateway>,
    config: &Config,
    limit: u32,
) -> Result<()> {
    let mut feed = FeedController::new(session, gateway, config.page_size);
    let trending = feed
        .load_trending(limit)
        .await
        .context("Failed to load trending articles")?;
    if trending.is_empty() {
        println!("No trending articles.");
    }
    for article in trending {
        print_article_line(article);
    }
    Ok(())
}

async fn run_article(
    session: Session,
    gateway: Arc<dyn RemoteGateway>,
    config: &Config,
    id: ArticleId,
) -> Result<()> {
    let feed = FeedController::new(session.clone(), Arc::clone(&gateway), config.page_size);
    let article = feed
        .article(id)
        .await
        .with_context(|| format!("Failed to load article {id}"))?;

    let mut favorite = FavoriteSynchronizer::new(session, gateway, id);
    let star = match favorite.check().await {
        Ok(true) => " ★",
        Ok(false) | Err(_) => "",
    };

    println!("{}{star}", strip_control_chars(&article.title));
    println!(
        "[{}] [{}]{}",
        strip_control_chars(article.display_category()),
        article.sentiment,
        article
            .published
            .map(|t| format!(" {}", t.format("%Y-%m-%d %H:%M")))
            .unwrap_or_default()
    );
    if let Some(link) = article.source_link() {
        println!("{link}");
    }
    if !article.summary.is_empty() {
        println!();
        println!("{}", strip_control_chars(&article.summary));
    }
    if !article.content.is_empty() {
        println!();
        println!("{}", strip_control_chars(&article.content));
    }
    Ok(())
}

async fn run_prefs(
    session: Session,
    gateway: Arc<dyn RemoteGateway>,
    action: PrefsCommand,
) -> Result<()> {
    let mut store = PreferenceStore::new(session, gateway);
    let set = match action {
        PrefsCommand::Show => {
            let current = store
                .fetch()
                .await
                .context("Failed to load preferences")?;
            print_preferences(&current);
            return Ok(());
        }
        PrefsCommand::Set { categories } => PreferenceSet::from_labels(categories),
        PrefsCommand::Toggle { category } => {
            let mut set = store
                .fetch()
                .await
                .context("Failed to load preferences")?;
            if set.toggle(&category) {
                println!("Selected {}", category.trim());
            } else {
                println!("Deselected {}", category.trim());
            }
            set
        }
    };

    match store.save(set).await? {
        SaveOutcome::Confirmed => println!("Preferences saved."),
        SaveOutcome::Unconfirmed => {
            eprintln!("Warning: preferences saved but could not be re-read")
        }
    }
    print_preferences(store.current());
    Ok(())
}

async fn run_favorites(
    session: Session,
    gateway: Arc<dyn RemoteGateway>,
    config: &Config,
    action: FavoritesCommand,
) -> Result<()> {
    match action {
        FavoritesCommand::List { page } => {
            let mut list = FavoritesList::new(session, gateway, config.page_size);
            list.load().await.context("Failed to load favorites")?;
            if list.items().is_empty() {
                println!("No favorites yet.");
                return Ok(());
            }
            if page != 1 && !list.change_page(page) {
                eprintln!(
                    "Page {page} does not exist (1-{}), showing page 1",
                    list.paginator().total_pages()
                );
            }
            for article in list.current_page().items {
                print_article_line(article);
            }
            print_page_controls(list.paginator());
        }
        FavoritesCommand::Check { id } => {
            let mut favorite = FavoriteSynchronizer::new(session, gateway, id);
            if favorite.check().await? {
                println!("Article {id} is a favorite.");
            } else {
                println!("Article {id} is not a favorite.");
            }
        }
        FavoritesCommand::Toggle { id } => {
            let mut favorite = FavoriteSynchronizer::new(session, gateway, id);
            favorite.check().await?;
            if favorite.toggle().await? {
                println!("Added article {id} to favorites.");
            } else {
                println!("Removed article {id} from favorites.");
            }
        }
        FavoritesCommand::Remove { id } => {
            let mut list = FavoritesList::new(session, gateway, config.page_size);
            list.remove(id).await?;
            println!("Removed article {id} from favorites.");
        }
    }
    Ok(())
}

fn print_article_line(article: &Article) {
    let title = strip_control_chars(&article.title);
    println!(
        "#{:<6} [{}] [{}] {}",
        article.id,
        strip_control_chars(article.display_category()),
        article.sentiment,
        truncate_to_width(&title, TITLE_WIDTH)
    );
    let summary = article.summary_preview();
    if !summary.is_empty() {
        println!("        {}", strip_control_chars(&summary));
    }
}

fn print_page_controls(paginator: &Paginator) {
    if !paginator.controls_visible() {
        return;
    }
    let current = paginator.current_page();
    let window: Vec<String> = paginator
        .window()
        .map(|p| {
            if p == current {
                format!("[{p}]")
            } else {
                p.to_string()
            }
        })
        .collect();
    println!();
    println!(
        "Page {current} of {}   {}",
        paginator.total_pages(),
        window.join(" ")
    );
}

fn print_preferences(set: &PreferenceSet) {
    if set.is_empty() {
        println!("No saved preferences; the feed shows every category.");
        return;
    }
    for category in set.iter() {
        println!("{}", strip_control_chars(category));
    }
}
