use crate::api::{ForumApi, ForumClient};
use crate::cli::{Args, Commands};
use crate::error::ApiError;
use crate::feed::{FeedController, Update};
use crate::models::*;
use crate::post_view::{sync_cards, PostCard};
use crate::session::{Session, SessionStore};
use crate::settings::merge_settings_with_args;

use anyhow::{anyhow, bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Text};
use log::info;
use owo_colors::OwoColorize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(args: Args) -> Result<()> {
    let args = merge_settings_with_args(&args)?;
    let base_url = args
        .url
        .clone()
        .ok_or_else(|| anyhow!("no forum URL configured"))?;
    let store = SessionStore::from_env()?;

    match args.command {
        Commands::Login { username, password } => {
            login(&base_url, &store, username, password).await
        }
        Commands::Logout => {
            store.clear()?;
            println!("Logged out.");
            Ok(())
        }
        command => {
            let session = store
                .load()?
                .ok_or_else(|| anyhow!("not logged in, run `forum login` first"))?;
            let client = ForumClient::new(&base_url, Some(&session.token))?;
            run_authenticated(command, client, &session).await
        }
    }
}

async fn run_authenticated(command: Commands, client: ForumClient, session: &Session) -> Result<()> {
    let viewer = session.current_user();

    match command {
        Commands::Feed { category } => {
            let posts = with_spinner("Loading feed...", client.list_posts(&category)).await?;
            print_posts(&posts, viewer);
        }
        Commands::Search { text, category } => {
            let query = QueryState {
                search_text: text,
                category,
            };
            if query.search_mode() != SearchMode::Active {
                bail!("search needs at least {} characters", MIN_SEARCH_LEN);
            }
            let posts = with_spinner(
                "Searching...",
                client.search_posts(query.search_term(), &query.category),
            )
            .await?;
            print_posts(&posts, viewer);
        }
        Commands::Browse { category } => browse(Arc::new(client), session, category).await?,
        Commands::Post { content } => {
            let post = create_post(&client, content).await?;
            println!("{}", "Post published.".bright_green());
            print_posts(&[post], viewer);
        }
        Commands::Like { id } => {
            let mut card = PostCard::new(client.get_post(id).await?);
            card.like(&client, viewer).await.map_err(notification)?;
            print!("{}", card.render(viewer));
        }
        Commands::Flag { id } => {
            let mut card = PostCard::new(client.get_post(id).await?);
            card.flag(&client, viewer).await.map_err(notification)?;
            print!("{}", card.render(viewer));
        }
        Commands::Comments { id } => {
            let mut card = PostCard::new(client.get_post(id).await?);
            card.toggle_comments(&client).await;
            print!("{}", card.render(viewer));
        }
        Commands::Comment { id, content } => {
            let mut card = PostCard::new(client.get_post(id).await?);
            card.toggle_comments(&client).await;
            card.set_draft(content);
            card.add_comment(&client).await.map_err(notification)?;
            print!("{}", card.render(viewer));
        }
        Commands::Login { .. } | Commands::Logout => bail!("command does not take a session"),
    }

    Ok(())
}

async fn login(
    base_url: &str,
    store: &SessionStore,
    username: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => Text::new("Username:").prompt()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new("Password:").without_confirmation().prompt()?,
    };

    let client = ForumClient::new(base_url, None)?;
    let credentials = Credentials { username, password };

    let session = match client.login(&credentials).await {
        Ok(response) => Session::from(response),
        Err(e) if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) => {
            bail!("Invalid credentials.")
        }
        Err(e) => return Err(e),
    };

    store.save(&session)?;
    if let Some(user) = session.current_user() {
        info!("logged in as {} (moderator: {})", user.username, user.is_moderator);
        println!("Signed in as {}.", user.username.bright_cyan());
    }
    Ok(())
}

async fn create_post(api: &dyn ForumApi, content: String) -> Result<Post> {
    if content.trim().is_empty() {
        bail!("post content is empty");
    }
    api.create_post(&NewPost { content })
        .await
        .map_err(|e| notification(e.context("Failed to publish post")))
}

#[derive(Debug, PartialEq, Eq)]
enum BrowseInput {
    Quit,
    Category(Category),
    Post(String),
    Comments(PostId),
    Like(PostId),
    Unknown(String),
    Search(String),
}

fn parse_browse_input(line: &str) -> BrowseInput {
    let trimmed = line.trim_start();
    if !trimmed.starts_with(':') {
        return BrowseInput::Search(line.to_string());
    }

    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim();
    let unknown = || BrowseInput::Unknown(trimmed.trim_end().to_string());
    match command {
        ":quit" | ":q" => BrowseInput::Quit,
        ":cat" => BrowseInput::Category(rest.parse().unwrap_or_default()),
        ":post" => BrowseInput::Post(rest.to_string()),
        ":comments" => rest.parse().map(BrowseInput::Comments).unwrap_or_else(|_| unknown()),
        ":like" => rest.parse().map(BrowseInput::Like).unwrap_or_else(|_| unknown()),
        _ => unknown(),
    }
}

async fn browse(api: Arc<dyn ForumApi>, session: &Session, category: Category) -> Result<()> {
    let viewer = session.current_user();
    let mut controller = FeedController::new(Arc::clone(&api));
    let mut cards: Vec<PostCard> = Vec::new();
    controller.on_category_changed(category);
    controller.on_session_established();

    println!(
        "{}",
        "Type to search (3+ characters), empty line for the feed, :cat <name>, :post <text>, \
         :comments <id>, :like <id>, :quit"
            .dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_browse_input(&line) {
                    BrowseInput::Quit => break,
                    BrowseInput::Category(category) => controller.on_category_changed(category),
                    BrowseInput::Search(text) => controller.on_search_text_changed(text),
                    BrowseInput::Post(content) => match create_post(api.as_ref(), content).await {
                        Ok(post) => {
                            controller.on_post_created(post);
                            cards = sync_cards(cards, controller.posts());
                            print_feed(&controller, &cards, viewer);
                        }
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    },
                    BrowseInput::Comments(id) => match cards.iter_mut().find(|card| card.post().id == id) {
                        Some(card) => {
                            card.toggle_comments(api.as_ref()).await;
                            print!("{}", card.render(viewer));
                        }
                        None => eprintln!("{}", format!("post {} is not listed", id).red()),
                    },
                    BrowseInput::Like(id) => match cards.iter_mut().find(|card| card.post().id == id) {
                        Some(card) => match card.like(api.as_ref(), viewer).await {
                            Ok(()) => print!("{}", card.render(viewer)),
                            Err(e) => eprintln!("{}", notification(e).to_string().red()),
                        },
                        None => eprintln!("{}", format!("post {} is not listed", id).red()),
                    },
                    BrowseInput::Unknown(command) => {
                        eprintln!("{}", format!("unknown command: {}", command).red())
                    }
                }
                if controller.loading() {
                    let label = if controller.is_searching() { "Searching..." } else { "Loading..." };
                    println!("{}", label.dimmed());
                }
            }
            Some(update) = controller.process_next() => {
                if matches!(update, Update::Applied(_) | Update::Failed(_)) {
                    cards = sync_cards(cards, controller.posts());
                    print_feed(&controller, &cards, viewer);
                }
            }
        }
    }

    controller.on_session_ended();
    Ok(())
}

fn print_feed(controller: &FeedController, cards: &[PostCard], viewer: Option<&User>) {
    let query = controller.query();
    let heading = match query.search_mode() {
        SearchMode::Active => format!("Results for \"{}\" in {}", query.search_term(), query.category),
        _ => format!("Feed: {}", query.category),
    };
    println!("\n{}", heading.bright_green().bold());

    if let Some(error) = controller.last_error() {
        eprintln!("{}", error.red());
    }
    print_cards(cards, viewer);
}

fn print_posts(posts: &[Post], viewer: Option<&User>) {
    let cards: Vec<PostCard> = posts.iter().cloned().map(PostCard::new).collect();
    print_cards(&cards, viewer);
}

fn print_cards(cards: &[PostCard], viewer: Option<&User>) {
    if cards.is_empty() {
        println!("{}", "No posts.".dimmed());
    }
    for card in cards {
        println!("{}", "-".repeat(40).dimmed());
        print!("{}", card.render(viewer));
    }
}

/// Shortens an API failure to what the server said, for display.
fn notification(e: anyhow::Error) -> anyhow::Error {
    match e.downcast_ref::<ApiError>() {
        Some(api_error) => anyhow!(api_error.user_message()),
        None => e,
    }
}

async fn with_spinner<T, F>(message: &'static str, task: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = task.await;
    spinner.finish_and_clear();
    result
}
