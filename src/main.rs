//! webchat-shim - entity access over a captured web-client runtime.
//!
//! Loads a host capture, discovers the module registry, and answers
//! contact/chat/group/message queries through the gateway.
//!
//! CHANGELOG:
//! - 08/27/2026 - Initial CLI surface

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::process::ExitCode;

use webchat_shim::output::OutputControls;
use webchat_shim::service::Gateway;

/// Entity access over a captured web-client runtime.
#[derive(Parser, Debug)]
#[command(name = "webchat-shim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the host capture (JSON)
    #[arg(long, global = true, default_value = "capture.json")]
    snapshot: String,

    /// Output as JSON (default)
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // REGISTRY
    // =========================================================================
    /// Show which capabilities the registry scan resolved
    Capabilities,

    // =========================================================================
    // CONTACTS
    // =========================================================================
    /// List address-book contacts
    Contacts,

    /// Get one contact by identifier
    Contact {
        /// Contact identifier (user@server)
        id: String,
    },

    /// Find a contact by display name
    ContactByName {
        /// Display name (exact match)
        name: String,
    },

    /// Show the logged-in user
    Me,

    // =========================================================================
    // CHATS AND MESSAGES
    // =========================================================================
    /// List conversations
    Chats,

    /// Get one conversation by identifier
    Chat {
        /// Chat identifier (user@server)
        id: String,
    },

    /// Messages of a conversation
    Messages {
        /// Chat identifier
        id: String,

        /// Include self-authored messages
        #[arg(long)]
        include_me: bool,
    },

    /// Unread messages of one conversation (consumes seen flags)
    UnreadChat {
        /// Chat identifier
        id: String,
    },

    /// Unread messages across all conversations (advances read cursors)
    Unread,

    /// Mark every conversation read
    MarkAllRead,

    /// Send a message to a conversation
    Send {
        /// Chat identifier
        id: String,

        /// Message body
        message: Vec<String>,
    },

    // =========================================================================
    // GROUPS
    // =========================================================================
    /// List group metadata
    Groups,

    /// Metadata for one group (refreshes stale entries)
    Group {
        /// Group identifier
        id: String,
    },

    /// Participant identifiers of a group
    Participants {
        /// Group identifier
        id: String,
    },

    /// Admin identifiers of a group
    Admins {
        /// Group identifier
        id: String,
    },

    /// Owner identifier of a group
    Owner {
        /// Group identifier
        id: String,
    },
}

impl Command {
    /// Gateway method name plus parameters for the dispatch boundary.
    fn request(&self) -> (&'static str, serde_json::Value) {
        match self {
            Command::Capabilities => ("capabilities", json!({})),
            Command::Contacts => ("contacts", json!({})),
            Command::Contact { id } => ("contact", json!({"id": id})),
            Command::ContactByName { name } => ("contact_by_name", json!({"name": name})),
            Command::Me => ("me", json!({})),
            Command::Chats => ("chats", json!({})),
            Command::Chat { id } => ("chat", json!({"id": id})),
            Command::Messages { id, include_me } => {
                ("messages", json!({"id": id, "include_me": include_me}))
            }
            Command::UnreadChat { id } => ("unread_chat", json!({"id": id})),
            Command::Unread => ("unread", json!({})),
            Command::MarkAllRead => ("mark_all_read", json!({})),
            Command::Send { id, message } => {
                ("send", json!({"id": id, "body": message.join(" ")}))
            }
            Command::Groups => ("group_metadata_all", json!({})),
            Command::Group { id } => ("group_metadata", json!({"id": id})),
            Command::Participants { id } => ("group_participants", json!({"id": id})),
            Command::Admins { id } => ("group_admins", json!({"id": id})),
            Command::Owner { id } => ("group_owner", json!({"id": id})),
        }
    }
}

async fn run(cli: Cli, controls: &OutputControls) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&cli.snapshot)
        .with_context(|| format!("reading capture {}", cli.snapshot))?;
    let root: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing capture {}", cli.snapshot))?;

    let mut gateway = Gateway::attach(root);
    let (method, params) = cli.command.request();
    let result = gateway
        .dispatch(method, &params)
        .await
        .with_context(|| format!("running {method}"))?;

    controls.print(&result);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    // Build output controls from global flags
    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    match run(cli, &output_controls).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
