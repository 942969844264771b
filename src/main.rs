//! Forum Admin - command line client for the forum and events admin backend.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use forum_admin::api::AdminApiClient;
use forum_admin::config::ClientConfig;
use forum_admin::forms::{split_tags, EventDraft, ForumDraft, ReplyDraft, TagList};
use forum_admin::render::{preview, render_thread};
use forum_admin::schema::{Event, ForumPost, UserRef};
use forum_admin::session::Session;
use forum_admin::thread::{load_thread, Thread};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "forum-admin", version, about = "Admin client for forum posts, comments and events")]
struct Cli {
    /// Backend base URL (overrides ADMIN_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Show the signed-in admin
    Me,
    /// List forum posts
    Forums {
        /// Only posts created by me
        #[arg(long)]
        mine: bool,
    },
    #[command(subcommand)]
    Forum(ForumCommand),
    #[command(subcommand)]
    Comment(CommentCommand),
    /// List events
    Events {
        /// Only events created by me
        #[arg(long)]
        mine: bool,
    },
    #[command(subcommand)]
    Event(EventCommand),
}

#[derive(Subcommand)]
enum ForumCommand {
    /// Show a post with its comment thread
    Show { id: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        /// Comma separated
        #[arg(long, default_value = "")]
        tags: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum CommentCommand {
    /// Add a top-level comment
    Add { forum_id: String, content: String },
    /// Reply to a comment
    Reply {
        forum_id: String,
        comment_id: String,
        content: String,
    },
    Delete { forum_id: String, comment_id: String },
}

#[derive(Subcommand)]
enum EventCommand {
    Show { id: String },
    /// Create an event from a JSON form file
    Create {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forum_admin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env(cli.api_url)?;
    let session = Session::load(&config.token_file)
        .with_context(|| format!("Failed to read token file {:?}", config.token_file))?;
    let client = AdminApiClient::new(&config)?.with_token(session.token().map(str::to_owned));

    let mut app = App {
        config,
        session,
        client,
    };

    app.run(cli.command).await
}

struct App {
    config: ClientConfig,
    session: Session,
    client: AdminApiClient,
}

impl App {
    async fn run(&mut self, command: Command) -> Result<()> {
        if !matches!(command, Command::Login { .. } | Command::Logout) {
            self.session.require_token()?;
        }

        match command {
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::Logout => {
                self.session.sign_out()?;
                println!("Logged out");
                Ok(())
            }
            Command::Me => self.me().await,
            Command::Forums { mine } => self.forums(mine).await,
            Command::Forum(cmd) => self.forum(cmd).await,
            Command::Comment(cmd) => self.comment(cmd).await,
            Command::Events { mine } => self.events(mine).await,
            Command::Event(cmd) => self.event(cmd).await,
        }
    }

    async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let token = self.client.login(email, password).await?;
        self.session.sign_in(token)?;
        self.client.set_token(self.session.token().map(str::to_owned));
        println!("Logged in as {}", email);
        Ok(())
    }

    async fn admin_id(&mut self) -> Result<String> {
        Ok(self.client.current_admin(&mut self.session).await?.id)
    }

    async fn me(&mut self) -> Result<()> {
        let admin = self.client.current_admin(&mut self.session).await?;
        println!("Welcome, {}!", admin.name.as_deref().unwrap_or("admin"));
        println!("Email: {}", admin.email.as_deref().unwrap_or("-"));
        if let Some(since) = &admin.created_at {
            println!("Member since: {}", since);
        }
        println!("Id: {}", admin.id);
        Ok(())
    }

    // ========================================================================
    // Forum
    // ========================================================================

    async fn forums(&mut self, mine: bool) -> Result<()> {
        let forums = if mine {
            let admin_id = self.admin_id().await?;
            self.client.list_forums_by_admin(&admin_id).await?
        } else {
            self.client.list_forums().await?
        };

        if forums.is_empty() {
            println!("No forums found");
        }
        for forum in &forums {
            println!("{}  {}", forum.id, forum.title);
            println!("    Tags: {}", join_or(&forum.tags, "None"));
            println!(
                "    By: {} | {}",
                display_user(forum.created_by.as_ref(), "Unknown"),
                forum.created_at.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    async fn forum(&mut self, cmd: ForumCommand) -> Result<()> {
        match cmd {
            ForumCommand::Show { id } => {
                let forum = self.client.get_forum(&id).await?;
                print_forum(&forum);
                let thread = load_thread(&self.client, &id).await?;
                print_thread(&thread);
            }
            ForumCommand::Create { title, body, tags } => {
                let draft = ForumDraft {
                    title,
                    body,
                    tags: TagList::new(split_tags(&tags)),
                };
                self.client.create_forum(&draft.validate()?).await?;
                println!("Forum created");
            }
            ForumCommand::Edit {
                id,
                title,
                body,
                add_tags,
                remove_tags,
            } => {
                let forum = self.owned_forum(&id).await?;
                let mut draft = ForumDraft::from_post(&forum);
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(body) = body {
                    draft.body = body;
                }
                for tag in &add_tags {
                    draft.tags.add(tag);
                }
                for tag in &remove_tags {
                    draft.tags.remove(tag);
                }
                let updated = self.client.update_forum(&id, &draft.validate()?).await?;
                print_forum(&updated);
            }
            ForumCommand::Delete { id } => {
                self.owned_forum(&id).await?;
                self.client.delete_forum(&id).await?;
                println!("Forum {} deleted", id);
            }
        }
        Ok(())
    }

    /// Fetch a post and check the signed-in admin created it.
    async fn owned_forum(&mut self, id: &str) -> Result<ForumPost> {
        let forum = self.client.get_forum(id).await?;
        let admin_id = self.admin_id().await?;
        if !forum.is_created_by(&admin_id) {
            bail!("Only the creator of forum {} can change it", id);
        }
        Ok(forum)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    async fn comment(&mut self, cmd: CommentCommand) -> Result<()> {
        let forum_id = match cmd {
            CommentCommand::Add { forum_id, content } => {
                let user_id = self.author_id().await?;
                let comment = ReplyDraft::new(content).into_comment(&forum_id, &user_id, None)?;
                self.client.add_comment(&comment).await?;
                forum_id
            }
            CommentCommand::Reply {
                forum_id,
                comment_id,
                content,
            } => {
                let thread = load_thread(&self.client, &forum_id).await?;
                let parent = thread
                    .find(&comment_id)
                    .with_context(|| format!("Comment {} not found on forum {}", comment_id, forum_id))?;
                println!("Replying to: {}", preview(&parent.comment.content, 50));

                let user_id = self.author_id().await?;
                let reply = ReplyDraft::new(content).into_comment(
                    &forum_id,
                    &user_id,
                    Some(comment_id.as_str()),
                )?;
                self.client.add_comment(&reply).await?;
                forum_id
            }
            CommentCommand::Delete {
                forum_id,
                comment_id,
            } => {
                self.client.delete_comment(&comment_id).await?;
                forum_id
            }
        };

        // Refresh after the mutation.
        let thread = load_thread(&self.client, &forum_id).await?;
        print_thread(&thread);
        Ok(())
    }

    /// Author for new comments: the signed-in admin, or the configured fallback.
    async fn author_id(&mut self) -> Result<String> {
        let fallback = self.config.fallback_user_id.as_deref();
        Ok(self.client.author_id(&mut self.session, fallback).await?)
    }

    // ========================================================================
    // Events
    // ========================================================================

    async fn events(&mut self, mine: bool) -> Result<()> {
        let admin_id = if mine {
            Some(self.admin_id().await?)
        } else {
            None
        };
        let events = self.client.list_events(admin_id.as_deref()).await?;

        if events.is_empty() {
            println!("No events found");
        }
        for event in &events {
            println!("{}  {}", event.id, event.event_name);
            println!("    Tags: {}", join_or(&event.tags, "None"));
            println!(
                "    By: {} | {}",
                display_user(event.created_by.as_ref(), "Unknown"),
                event.created_at.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    async fn event(&mut self, cmd: EventCommand) -> Result<()> {
        match cmd {
            EventCommand::Show { id } => {
                let event = self.client.get_event(&id).await?;
                print_event(&event);
            }
            EventCommand::Create { file } => {
                let raw = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read event form: {:?}", file))?;
                let draft: EventDraft = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse event form: {:?}", file))?;
                let event = draft.into_payload()?;
                self.client.create_event(&event).await?;
                info!("Event form {:?} submitted", file);
                println!("Event {} created", event.event_name);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn display_user<'a>(user: Option<&'a UserRef>, fallback: &'a str) -> &'a str {
    user.and_then(UserRef::display_name).unwrap_or(fallback)
}

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

fn print_forum(forum: &ForumPost) {
    println!("{}", forum.title);
    println!();
    println!("{}", forum.body);
    println!();
    println!("Tags: {}", join_or(&forum.tags, "No tags"));
    println!("Created by: {}", display_user(forum.created_by.as_ref(), "Unknown"));
    println!("Created on: {}", forum.created_at.as_deref().unwrap_or("Unknown"));
    println!("Forum ID: {}", forum.id);
}

fn print_thread(thread: &Thread) {
    println!();
    println!("Comments ({})", thread.len());
    if thread.is_empty() {
        println!("No comments yet");
        return;
    }
    print!("{}", render_thread(&thread.roots));
}

fn print_event(event: &Event) {
    let time = event
        .event_time
        .as_ref()
        .map(|t| format!("{} - {}", t.from, t.to))
        .unwrap_or_default();
    let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_default();

    println!("{}", event.event_name);
    println!("Organizer:       {}", event.organizer.as_deref().unwrap_or(""));
    println!("Date:            {}", event.date.as_deref().unwrap_or(""));
    println!("Time:            {}", time);
    println!("Place:           {}", event.place.as_deref().unwrap_or(""));
    println!("Duration:        {}", event.duration.as_deref().unwrap_or(""));
    println!("Max Attendees:   {}", count(event.max_attendees));
    println!("Available Slots: {}", count(event.available_slots));
    println!("Tags:            {}", join_or(&event.tags, "None"));
    if event.image.is_some() {
        println!("Image:           attached");
    }
    println!();
    println!("{}", event.description.as_deref().unwrap_or(""));

    if !event.pricing.is_empty() {
        println!();
        println!("Pricing");
        for tier in &event.pricing {
            print!("  {}: {:.2}", tier.name, tier.price);
            if let Some(slots) = tier.slots_available {
                print!(" ({} slots)", slots);
            }
            println!();
            if !tier.description.is_empty() {
                println!("    {}", tier.description);
            }
            if !tier.tags.is_empty() {
                println!("    Tags: {}", tier.tags.join(", "));
            }
        }
    }

    if !event.discount_options.is_empty() {
        println!();
        println!("Discounts");
        for discount in &event.discount_options {
            println!(
                "  {}: {}% off for {} members",
                discount.name, discount.percentage_discount, discount.total_members_needed
            );
        }
    }

    println!();
    println!("Created: {}", event.created_at.as_deref().unwrap_or(""));
}
