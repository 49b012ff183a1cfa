use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::anyhow;
use chatline::backend::{ProfileStore, SessionProvider as _};
use chatline::chat::{ChatThread, DisplayMessage, MessageBody, MessageRenderer};
use chatline::config::{AppConfig, ConfigManager};
use chatline::contact::{ContactListManager, Summarizer};
use chatline::models::{Attachment, AttachmentKind, MessageId, Session, User, UserId};
use chatline::profile::{ProfileEditor, ProfileField, UserDetails};
use chatline::storage::{SqliteBackend, Storage};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex as TokioMutex;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "chatline", version, about = "Encrypted one-to-one chat client")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, help = "Path of the JSON config file")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Directory of the local store")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Sign in as an existing or new user")]
    Login {
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    #[command(about = "Forget the signed-in user")]
    Logout,
    #[command(about = "Add a user to the directory")]
    AddUser {
        user_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        about: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
    },
    #[command(about = "List users you have chats with, newest first")]
    Contacts {
        #[arg(long, help = "Filter by name or username")]
        search: Option<String>,
    },
    #[command(about = "Show the chat with a user")]
    Thread {
        peer: String,
        #[arg(long, help = "Show long messages in full")]
        full: bool,
    },
    #[command(about = "Send a message to a user")]
    Send {
        peer: String,
        text: Option<String>,
        #[arg(long, conflicts_with_all = ["text", "document"])]
        image: Option<String>,
        #[arg(long, conflicts_with = "text")]
        document: Option<String>,
        #[arg(long, help = "File name shown for the attachment")]
        file_name: Option<String>,
    },
    #[command(about = "Delete one of your messages")]
    Delete { peer: String, message_id: String },
    #[command(about = "Show your profile")]
    Profile,
    #[command(about = "Change one field of your profile")]
    SetProfile { field: ProfileField, value: String },
    #[command(about = "Show details of another user")]
    User { user_id: String },
}

struct App {
    backend: Arc<SqliteBackend>,
    config_manager: ConfigManager,
    renderer: MessageRenderer,
}

impl App {
    async fn open(config: &AppConfig) -> Result<Self, anyhow::Error> {
        let storage = Arc::new(TokioMutex::new(Storage::open(&config.data_dir).await?));
        let config_manager = ConfigManager::new(storage.clone());
        let secret = config_manager.master_secret().await?;
        let renderer = MessageRenderer::new(Arc::new(secret), config.render.clone());
        Ok(Self {
            backend: Arc::new(SqliteBackend::new(storage)),
            config_manager,
            renderer,
        })
    }

    async fn session(&self) -> Result<Session, anyhow::Error> {
        self.config_manager
            .current_session()
            .await?
            .ok_or_else(|| chatline::Error::NoSession.into())
    }

    async fn open_thread(&self, peer: &str) -> Result<ChatThread, anyhow::Error> {
        let session = self.session().await?;
        let peer = UserId::parse(peer)?;
        ChatThread::open(session, peer, self.backend.clone(), self.renderer.clone()).await
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = match AppConfig::load(&config_path).await {
        Ok(v) => v,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    init_tracing(&config.log_filter);
    let app = match App::open(&config).await {
        Ok(v) => v,
        Err(err) => {
            tracing::error!(?err, "Failed to open store");
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    match run(&app, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(app: &App, command: Command) -> Result<(), anyhow::Error> {
    match command {
        Command::Login {
            user_id,
            name,
            email,
        } => {
            let user_id = UserId::parse(user_id)?;
            if app.backend.get_profile(&user_id).await?.is_none() {
                let mut user = User::new(user_id.clone(), name.clone());
                user.email = email.clone();
                app.backend.upsert_user(&user).await?;
            }
            let mut session = Session::new(user_id, name);
            session.email = email;
            app.config_manager.sign_in(&session).await?;
            println!("Signed in as {}", session.user_id);
        }
        Command::Logout => {
            app.config_manager.sign_out().await?;
            println!("Signed out");
        }
        Command::AddUser {
            user_id,
            name,
            username,
            email,
            about,
            photo_url,
        } => {
            let mut user = User::new(UserId::parse(user_id)?, name);
            user.username = username;
            user.email = email;
            user.about = about;
            user.photo_url = photo_url;
            app.backend.upsert_user(&user).await?;
            println!("Added {}", user.id);
        }
        Command::Contacts { search } => {
            let session = app.session().await?;
            let summarizer = Summarizer::new(app.backend.clone(), app.renderer.clone());
            let manager = ContactListManager::new(app.backend.clone(), Arc::new(summarizer));
            manager.refresh(&session).await?;
            let contacts = match search {
                Some(query) => manager.search(&query).await,
                None => manager.contacts().await,
            };
            if contacts.is_empty() {
                println!("No chats yet");
            }
            for contact in contacts {
                let time = contact
                    .last_message_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let streak = if contact.has_streak() {
                    format!(" [{}]", contact.streak)
                } else {
                    String::new()
                };
                println!(
                    "{} ({}){}  {}  {}",
                    contact.display_name, contact.user_id, streak, time, contact.last_message
                );
            }
        }
        Command::Thread { peer, full } => {
            let mut thread = app.open_thread(&peer).await?;
            if full {
                let ids: Vec<MessageId> = thread.messages().iter().map(|m| m.id.clone()).collect();
                for id in &ids {
                    thread.expand(id);
                }
            }
            for message in thread.messages() {
                print_message(message);
            }
        }
        Command::Send {
            peer,
            text,
            image,
            document,
            file_name,
        } => {
            let mut thread = app.open_thread(&peer).await?;
            let attachment = match (image, document) {
                (Some(url), _) => Some((url, AttachmentKind::Image)),
                (None, Some(url)) => Some((url, AttachmentKind::Document)),
                (None, None) => None,
            };
            let sent = match (attachment, text) {
                (Some((url, kind)), _) => {
                    thread
                        .send_attachment(Attachment {
                            url,
                            kind,
                            name: file_name,
                        })
                        .await?
                }
                (None, Some(text)) => thread.send_text(&text).await?,
                (None, None) => return Err(anyhow!("Nothing to send")),
            };
            println!("Sent {}", sent.id);
        }
        Command::Delete { peer, message_id } => {
            let mut thread = app.open_thread(&peer).await?;
            thread.delete_message(&MessageId::new(message_id)).await?;
            println!("Deleted");
        }
        Command::Profile => {
            let session = app.session().await?;
            let editor = ProfileEditor::load(app.backend.clone(), session).await;
            let profile = editor.profile();
            for field in ProfileField::ALL {
                println!("{:<9} {}", field.name(), profile.get(field));
            }
        }
        Command::SetProfile { field, value } => {
            let session = app.session().await?;
            let mut editor = ProfileEditor::load(app.backend.clone(), session).await;
            editor.update(field, &value).await?;
            println!("Updated {}", field);
        }
        Command::User { user_id } => {
            let user_id = UserId::parse(user_id)?;
            let user = app
                .backend
                .get_profile(&user_id)
                .await?
                .ok_or_else(|| anyhow!("Unknown user {}", user_id))?;
            let details = UserDetails::from(&user);
            println!("{}", details.display_name);
            if !details.username.is_empty() {
                println!("{}", details.username);
            }
            if !details.email.is_empty() {
                println!("{}", details.email);
            }
            println!("{}", details.about);
        }
    }
    Ok(())
}

fn print_message(message: &DisplayMessage) {
    let marker = if message.sent_by_me { ">" } else { "<" };
    let body = match &message.body {
        MessageBody::Text { text, overflow } => {
            let visible = overflow.visible(text);
            if overflow.shows_see_more() {
                format!("{visible}... (See more)")
            } else {
                visible.to_string()
            }
        }
        MessageBody::Image { url, name, .. } => {
            format!("[image] {}", name.as_deref().unwrap_or(url))
        }
        MessageBody::Document { url, name } => format!("[document] {name} <{url}>"),
        MessageBody::Empty => String::new(),
    };
    println!(
        "{} {} {} [{}] {}",
        message.time, marker, message.sender, message.id, body
    );
}
