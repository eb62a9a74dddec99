use std::process::ExitCode;

use anyhow::{Context, Result};
use console::style;
use courier_core::entity::{MessageContent, PageRequest, StatusChange};
use serde::Serialize;

use crate::cli::{
    Commands, ConversationArgs, ConversationCommands, MessageArgs, MessageCommands, PlanArgs,
    TaskArgs, TaskCommands,
};
use crate::AppContext;

mod crud;

pub use crud::run_crud;

// --- Handler Functions ---

pub async fn dispatch(command: Commands, cx: &AppContext) -> Result<ExitCode> {
    match command {
        Commands::Health => return handle_health(cx).await,
        Commands::Version => {
            let version = cx.controllers.system.get_version().await?;
            println!("{}", version);
        }
        Commands::Conversation(args) => handle_conversation(args, cx).await?,
        Commands::Message(args) => handle_message(args, cx).await?,
        Commands::Task(args) => handle_task(args, cx).await?,
        Commands::Plan(PlanArgs { command }) => run_crud(&cx.controllers.plans, command).await?,
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn handle_health(cx: &AppContext) -> Result<ExitCode> {
    if cx.controllers.system.health_check().await {
        println!("{} backend is healthy", style("✔").green());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} backend is not responding", style("✘").red());
        Ok(ExitCode::FAILURE)
    }
}

pub async fn handle_conversation(args: ConversationArgs, cx: &AppContext) -> Result<()> {
    let conversations = &cx.controllers.conversations;
    match args.command {
        ConversationCommands::Crud(command) => run_crud(conversations, command).await?,
        ConversationCommands::Participants { conversation_id } => {
            print_json(&conversations.get_participants(&conversation_id).await?)?;
        }
        ConversationCommands::AddParticipant { conversation_id, user_id } => {
            conversations.add_participant(&conversation_id, &user_id).await?;
            println!("Added {} to conversation {}", user_id, conversation_id);
        }
        ConversationCommands::RemoveParticipant { conversation_id, user_id } => {
            conversations.remove_participant(&conversation_id, &user_id).await?;
            println!("Removed {} from conversation {}", user_id, conversation_id);
        }
        ConversationCommands::Start { title, text, kind } => {
            let started = cx
                .controllers
                .conversation_service()
                .start_conversation(&title, kind.into(), MessageContent::text(text))
                .await?;
            print_json(&started)?;
        }
        ConversationCommands::Open { id, limit, offset } => {
            let view = cx
                .controllers
                .conversation_service()
                .open_conversation(&id, PageRequest { limit, offset })
                .await?;
            print_json(&view)?;
        }
        ConversationCommands::Invite { conversation_id, user_ids } => {
            cx.controllers
                .conversation_service()
                .invite(&conversation_id, &user_ids)
                .await?;
            println!("Invited {} participant(s) to {}", user_ids.len(), conversation_id);
        }
    }
    Ok(())
}

pub async fn handle_message(args: MessageArgs, cx: &AppContext) -> Result<()> {
    let messages = &cx.controllers.messages;
    match args.command {
        MessageCommands::Crud(command) => run_crud(messages, command).await?,
        MessageCommands::History { conversation_id, limit, offset } => {
            let page = messages
                .list_for_conversation(&conversation_id, PageRequest { limit, offset })
                .await?;
            print_json(&page)?;
        }
        MessageCommands::Read { message_id } => {
            messages.mark_as_read(&message_id).await?;
            println!("Marked {} as read", message_id);
        }
    }
    Ok(())
}

pub async fn handle_task(args: TaskArgs, cx: &AppContext) -> Result<()> {
    let tasks = &cx.controllers.tasks;
    match args.command {
        TaskCommands::Crud(command) => run_crud(tasks, command).await?,
        TaskCommands::Status { id, status } => {
            let change = StatusChange { id, status: status.into() };
            print_json(&tasks.update_status(&change).await?)?;
        }
        TaskCommands::Assign { id, assignee_id } => {
            print_json(&tasks.assign(&id, &assignee_id).await?)?;
        }
        TaskCommands::Complete { id } => {
            print_json(&cx.controllers.task_service().complete_task(&id).await?)?;
        }
    }
    Ok(())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to format backend response")?;
    println!("{}", text);
    Ok(())
}
