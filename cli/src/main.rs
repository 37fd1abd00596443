use std::sync::Arc;
use std::time::Duration;

use bookswap::chat::{ChatError, ConversationView, OpenParams};
use bookswap::config::{ClientConfig, ConfigError, clamp_poll_interval, normalize_base_url};
use bookswap::conversations::ConversationList;
use bookswap::net::{ApiError, ChatApi, ConversationId, HttpChatApi, Message, MessageId, OutgoingMessage, UserId};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("message body is empty")]
    EmptyMessage,
}

#[derive(Parser, Debug)]
#[command(name = "bookswap", about = "Book exchange chat client")]
struct Cli {
    #[arg(long, env = "BOOKSWAP_API_URL")]
    base_url: Option<String>,

    #[arg(long, env = "BOOKSWAP_API_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "CHAT_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    #[arg(long, env = "CHAT_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the user's conversations.
    Conversations {
        #[arg(long)]
        user: i64,
    },
    /// Fetch messages once and print them as JSON.
    Messages {
        conversation: i64,
        #[arg(long)]
        after: Option<i64>,
    },
    /// Send one message as the given user.
    Send {
        conversation: i64,
        #[arg(long)]
        user: i64,
        text: String,
    },
    /// Tell the backend the user has viewed the conversation.
    Seen {
        conversation: i64,
        #[arg(long)]
        user: i64,
    },
    /// Open a live conversation; each stdin line is sent as a message.
    Chat {
        conversation: i64,
        #[arg(long)]
        user: i64,
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let api: Arc<dyn ChatApi> = Arc::new(HttpChatApi::from_config(&config)?);

    match cli.command {
        Command::Conversations { user } => run_conversations(api.as_ref(), UserId(user)).await,
        Command::Messages { conversation, after } => {
            run_messages(api.as_ref(), ConversationId(conversation), after.map(MessageId)).await
        }
        Command::Send { conversation, user, text } => {
            run_send(api.as_ref(), ConversationId(conversation), UserId(user), text).await
        }
        Command::Seen { conversation, user } => {
            api.mark_seen(ConversationId(conversation), UserId(user)).await?;
            println!("ok");
            Ok(())
        }
        Command::Chat { conversation, user, title } => {
            let params = OpenParams {
                user: Some(UserId(user)),
                conversation: Some(ConversationId(conversation)),
                title,
            };
            run_chat(api, params, &config).await
        }
    }
}

/// Environment first, then explicit flags on top.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = normalize_base_url(base_url)?;
    }
    if let Some(token) = cli.token.as_ref().filter(|t| !t.trim().is_empty()) {
        config.token = Some(token.clone());
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = clamp_poll_interval(Duration::from_millis(ms));
    }
    if let Some(secs) = cli.request_timeout_secs {
        config.timeouts.request = Duration::from_secs(secs);
    }
    Ok(config)
}

async fn run_conversations(api: &dyn ChatApi, user: UserId) -> Result<(), CliError> {
    let list = ConversationList::load(api, Some(user)).await?;
    if list.is_empty() {
        println!("no conversations");
        return Ok(());
    }
    for summary in &list.conversations {
        let with = summary
            .other_user
            .as_ref()
            .map(|u| format!(" with {}", u.username))
            .unwrap_or_default();
        let unread = summary.unread_count.filter(|n| *n > 0).map(|n| format!(" ({n} unread)")).unwrap_or_default();
        println!("{}\t{}{with}{unread}", summary.id, summary.display_title());
    }
    Ok(())
}

async fn run_messages(api: &dyn ChatApi, conversation: ConversationId, after: Option<MessageId>) -> Result<(), CliError> {
    let messages = api.fetch_messages(conversation, after).await?;
    print_json(&serde_json::to_value(messages)?)
}

async fn run_send(api: &dyn ChatApi, conversation: ConversationId, user: UserId, text: String) -> Result<(), CliError> {
    let body = text.trim();
    if body.is_empty() {
        return Err(CliError::EmptyMessage);
    }
    let outgoing = OutgoingMessage { sender_id: user, body: body.to_owned() };
    let created = api.send_message(conversation, &outgoing).await?;
    print_json(&serde_json::to_value(created.into_message(&outgoing))?)
}

async fn run_chat(api: Arc<dyn ChatApi>, params: OpenParams, config: &ClientConfig) -> Result<(), CliError> {
    let mut view = ConversationView::open(api, params, config).await?;
    println!("== {} ==", view.title());
    if let Some(error) = view.load_error() {
        warn!(conversation = %view.conversation(), "{error}");
    }

    let mut rendered = render_new(&view, MessageId::NONE);
    let mut revisions = view.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                rendered = render_new(&view, rendered);
            }
            line = lines.next_line() => {
                let Some(text) = line? else {
                    break;
                };
                view.set_draft(text);
                match view.send().await {
                    Ok(_) => rendered = render_new(&view, rendered),
                    Err(e) => warn!(code = e.error_code(), error = %e, draft = view.draft(), "send failed; draft kept"),
                }
            }
        }
    }

    view.close();
    Ok(())
}

/// Print every message newer than `after`; returns the last id printed.
fn render_new(view: &ConversationView, after: MessageId) -> MessageId {
    let fresh = view.messages_after(after);
    for message in &fresh {
        println!("{}", format_line(view, message));
    }
    fresh.last().map_or(after, |m| m.id)
}

fn format_line(view: &ConversationView, message: &Message) -> String {
    let who = if view.is_my_message(message) {
        "me".to_owned()
    } else {
        format!("user {}", message.sender_id)
    };
    format!("[{}] {who}: {}", message.id, message.body)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
