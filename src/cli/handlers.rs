use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use super::render::{render_feed, render_post, render_resources, short_id};
use crate::auth::{guard, sign_in, sign_up, Gate, Route, SIGN_IN_REQUIRED};
use crate::backend::{Backend, LocalBackend};
use crate::config::AppConfig;
use crate::dashboard::Dashboard;
use crate::entity::{NewPost, NewResource, ResourceType};
use crate::error::{DevfeedError, ErrorKind, Result};
use crate::feed::{FeedController, PostFilter, PrintLinkSharer};
use crate::storage::DEVFEED_DIR;

/// Find the project root by looking for .devfeed/ in the current directory or
/// any parent.
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(DEVFEED_DIR).exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_project() -> Result<(Arc<LocalBackend>, AppConfig)> {
    let root = find_project_root();
    let backend = LocalBackend::open(&root)?;
    let config = AppConfig::load(backend.data_dir())?;
    Ok((Arc::new(backend), config))
}

async fn open_dashboard() -> Result<Dashboard> {
    let (backend, config) = open_project()?;
    match Dashboard::open(backend, Arc::new(PrintLinkSharer), config).await {
        Ok(dashboard) => {
            print_notices(dashboard.feed());
            Ok(dashboard)
        }
        Err(e) => {
            if e.kind() == ErrorKind::Auth {
                eprintln!("{}", SIGN_IN_REQUIRED);
            }
            Err(e)
        }
    }
}

fn print_notices(feed: &FeedController) {
    for notice in feed.take_notices() {
        eprintln!("{}", notice);
    }
}

async fn read_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    if atty::is(atty::Stream::Stdin) {
        eprint!("Password: ");
        std::io::stderr().flush()?;
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Resolve a post id or prefix, looking in the other filter if the loaded list
/// does not have it.
async fn locate(feed: &FeedController, id: &str) -> Result<String> {
    if let Ok(found) = feed.resolve_post_id(id) {
        return Ok(found);
    }
    let other = match feed.filter() {
        PostFilter::Trending => PostFilter::Recent,
        PostFilter::Recent => PostFilter::Trending,
    };
    feed.load_posts(other).await?;
    feed.resolve_post_id(id)
}

pub async fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let backend = LocalBackend::init(&root)?;
    AppConfig::default().save(backend.data_dir())?;

    println!("Initialized devfeed project in {}", root.display());
    Ok(())
}

pub async fn handle_signup(name: String, email: String, password: Option<String>) -> Result<()> {
    let (backend, _config) = open_project()?;
    let password = read_password(password).await?;

    let identity = sign_up(backend.as_ref(), &name, &email, &password).await?;

    eprintln!("✓ Account created successfully!");
    println!("Signed in as {} <{}>", identity.name, identity.email);
    Ok(())
}

pub async fn handle_login(email: String, password: Option<String>) -> Result<()> {
    let (backend, _config) = open_project()?;
    let password = read_password(password).await?;

    let identity = sign_in(backend.as_ref(), &email, &password).await?;

    eprintln!("✓ Welcome back!");
    println!("Signed in as {} <{}>", identity.name, identity.email);
    Ok(())
}

pub async fn handle_logout() -> Result<()> {
    let (backend, _config) = open_project()?;
    backend.delete_session().await?;
    eprintln!("✓ Logged out successfully");
    Ok(())
}

pub async fn handle_whoami(json: bool) -> Result<()> {
    let (backend, _config) = open_project()?;
    let identity = backend.get_session().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&identity)?);
    } else {
        println!("{} <{}>", identity.name, identity.email);
    }
    Ok(())
}

pub async fn handle_route(path: String) -> Result<()> {
    let (backend, _config) = open_project()?;
    let route = Route::from_path(&path);

    match guard(backend.as_ref(), route).await {
        Gate::Render(page) => println!("render {}", page),
        Gate::Redirect(page) => {
            if route == Route::Dashboard {
                eprintln!("{}", SIGN_IN_REQUIRED);
            }
            println!("redirect {}", page);
        }
    }
    Ok(())
}

pub async fn handle_feed(filter: PostFilter, expand: Vec<String>, json: bool) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let feed = dashboard.feed();

    if filter != feed.filter() {
        let loaded = feed.load_posts(filter).await;
        print_notices(feed);
        loaded?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&feed.posts())?);
        return Ok(());
    }

    for id in &expand {
        let id = feed.resolve_post_id(id)?;
        feed.toggle_comment_visibility(&id);
    }
    print!("{}", render_feed(feed));
    Ok(())
}

pub async fn handle_post(title: String, content: Option<String>, stdin: bool) -> Result<()> {
    let content = match content {
        Some(content) => content,
        None if stdin => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            content
        }
        None => return Err(DevfeedError::validation("content", "is required")),
    };

    let dashboard = open_dashboard().await?;
    let created = dashboard.create_post(NewPost::new(title, content)).await;
    print_notices(dashboard.feed());
    let post = created?;

    println!("Created post ({}) - {}", short_id(&post.id), post.title);
    Ok(())
}

pub async fn handle_like(id: String) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let feed = dashboard.feed();
    let id = locate(feed, &id).await?;

    let liked = feed.like(&id).await;
    print_notices(feed);
    println!("♥ {}", liked?);
    Ok(())
}

pub async fn handle_comment(id: String, text: String) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let feed = dashboard.feed();
    let id = locate(feed, &id).await?;

    let added = feed.comment(&id, &text).await;
    print_notices(feed);
    println!("{}", added?);
    Ok(())
}

pub async fn handle_share(id: String) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let feed = dashboard.feed();
    let id = locate(feed, &id).await?;

    let shared = feed.share(&id).await;
    print_notices(feed);
    println!("↗ {}", shared?);
    Ok(())
}

pub async fn handle_resources(json: bool) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let resources = dashboard.resources();

    if json {
        println!("{}", serde_json::to_string_pretty(&resources)?);
    } else {
        print!("{}", render_resources(&resources));
    }
    Ok(())
}

pub async fn handle_resource_add(
    title: String,
    url: String,
    kind: ResourceType,
    description: Option<String>,
) -> Result<()> {
    let dashboard = open_dashboard().await?;
    let draft = NewResource {
        title,
        kind,
        url,
        description,
    };

    let added = dashboard.create_resource(draft).await;
    print_notices(dashboard.feed());
    let resource = added?;

    println!(
        "Added {} ({}) - {}",
        resource.kind,
        short_id(&resource.id),
        resource.title
    );
    Ok(())
}

const DASHBOARD_HELP: &str = "\
Commands:
  trending | recent          switch the feed filter
  refresh                    reload the current filter
  like <id>                  like a post
  comment <id> <text>        comment on a post
  share <id>                 share a post
  toggle <id>                show or hide a post's comments
  post <title> | <content>   publish a post
  resources                  list shared resources
  logout                     sign out and leave
  quit                       leave";

enum Step {
    Continue,
    Quit,
}

/// Run one dashboard command line against the open session.
async fn dashboard_step(dashboard: &Dashboard, line: &str) -> Result<Step> {
    let feed = dashboard.feed();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "help" | "?" => println!("{}", DASHBOARD_HELP),
        "quit" | "exit" => return Ok(Step::Quit),
        "trending" | "recent" => {
            let filter = if command == "trending" {
                PostFilter::Trending
            } else {
                PostFilter::Recent
            };
            feed.load_posts(filter).await?;
            print!("{}", render_feed(feed));
        }
        "refresh" => {
            feed.reload().await?;
            print!("{}", render_feed(feed));
        }
        "like" => {
            let id = locate(feed, rest).await?;
            println!("♥ {}", feed.like(&id).await?);
        }
        "share" => {
            let id = locate(feed, rest).await?;
            println!("↗ {}", feed.share(&id).await?);
        }
        "comment" => {
            let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
            let id = locate(feed, id).await?;
            feed.comment(&id, text).await?;
            if !feed.is_comment_open(&id) {
                feed.toggle_comment_visibility(&id);
            }
            if let Some(post) = feed.post(&id) {
                print!("{}", render_post(&post, feed.filter(), true));
            }
        }
        "toggle" => {
            let id = feed.resolve_post_id(rest)?;
            let open = feed.toggle_comment_visibility(&id);
            if let Some(post) = feed.post(&id) {
                print!("{}", render_post(&post, feed.filter(), open));
            }
        }
        "post" => {
            let (title, content) = rest.split_once(" | ").unwrap_or((rest, ""));
            dashboard
                .create_post(NewPost::new(title.trim(), content.trim()))
                .await?;
            print!("{}", render_feed(feed));
        }
        "resources" => {
            dashboard.load_resources().await?;
            print!("{}", render_resources(&dashboard.resources()));
        }
        "logout" => {
            dashboard.logout().await?;
            return Ok(Step::Quit);
        }
        other => eprintln!("Unknown command '{}'. Type 'help' for a list.", other),
    }
    Ok(Step::Continue)
}

/// Interactive session over one dashboard, so in-memory changes to trending
/// posts last until the session ends.
pub async fn handle_dashboard() -> Result<()> {
    let dashboard = open_dashboard().await?;
    let interactive = atty::is(atty::Stream::Stdin);

    print!("{}", render_feed(dashboard.feed()));
    if interactive {
        println!("\nType 'help' for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let step = dashboard_step(&dashboard, line.trim()).await;
        print_notices(dashboard.feed());
        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Quit) => break,
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}
