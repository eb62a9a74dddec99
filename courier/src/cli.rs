use clap::{Args, Parser, Subcommand, ValueEnum};
use courier_core::entity::{ConversationType, TaskStatus};
use std::path::PathBuf;

use crate::config::Overrides;

/// Courier: talk to a native backend over the typed command bridge.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON file describing the backend transport.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend executable, spawned once per call (stdio transport).
    #[arg(long, env = "COURIER_BACKEND", global = true)]
    pub backend: Option<PathBuf>,

    /// Argument passed to the backend executable (repeatable).
    #[arg(long = "backend-arg", global = true, allow_hyphen_values = true)]
    pub backend_args: Vec<String>,

    /// Base URL of a backend listening on HTTP.
    #[arg(long, env = "COURIER_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token for the HTTP backend.
    #[arg(long, env = "COURIER_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Per-call timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Increase verbosity (use multiple times for more).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            backend_args: self.backend_args.clone(),
            url: self.url.clone(),
            token: self.token.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the backend answers.
    Health,
    /// Print the backend version.
    Version,
    /// Manage conversations.
    Conversation(ConversationArgs),
    /// Manage messages.
    Message(MessageArgs),
    /// Manage tasks.
    Task(TaskArgs),
    /// Manage plans.
    Plan(PlanArgs),
}

/// Generic operations available for every entity kind.
#[derive(Subcommand, Debug)]
pub enum CrudCommands {
    /// Fetch one record by id.
    Get { id: String },
    /// List records.
    List {
        /// Filter as a JSON object, e.g. '{"status":"Pending"}'.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Create a record from a JSON object.
    Create { json: String },
    /// Update a record with a JSON object of changed fields.
    Update { id: String, json: String },
    /// Delete a record.
    Delete {
        id: String,
        /// Skip confirmation.
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConversationArgs {
    #[command(subcommand)]
    pub command: ConversationCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConversationCommands {
    #[command(flatten)]
    Crud(CrudCommands),
    /// List the participants of a conversation.
    Participants { conversation_id: String },
    /// Add a participant to a conversation.
    AddParticipant { conversation_id: String, user_id: String },
    /// Remove a participant from a conversation.
    RemoveParticipant { conversation_id: String, user_id: String },
    /// Create a conversation and post its first message.
    Start {
        title: String,
        /// Text of the first message.
        text: String,
        #[arg(long, value_enum, default_value_t = KindArg::Group)]
        kind: KindArg,
    },
    /// Show a conversation with its participants and latest messages.
    Open {
        id: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Add several participants, stopping at the first failure.
    Invite {
        conversation_id: String,
        #[arg(required = true)]
        user_ids: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct MessageArgs {
    #[command(subcommand)]
    pub command: MessageCommands,
}

#[derive(Subcommand, Debug)]
pub enum MessageCommands {
    #[command(flatten)]
    Crud(CrudCommands),
    /// List the messages of a conversation.
    History {
        conversation_id: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Mark a message as read.
    Read { message_id: String },
}

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    #[command(flatten)]
    Crud(CrudCommands),
    /// Change the status of a task.
    Status {
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Assign a task to a user.
    Assign { id: String, assignee_id: String },
    /// Mark a task as completed.
    Complete { id: String },
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(subcommand)]
    pub command: CrudCommands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Direct,
    Group,
}

impl From<KindArg> for ConversationType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Direct => ConversationType::Direct,
            KindArg::Group => ConversationType::Group,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl From<StatusArg> for TaskStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => TaskStatus::Pending,
            StatusArg::InProgress => TaskStatus::InProgress,
            StatusArg::Completed => TaskStatus::Completed,
            StatusArg::Cancelled => TaskStatus::Cancelled,
        }
    }
}
