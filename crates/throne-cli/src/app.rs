use anyhow::Result;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use throne_core::constants::persona;
use throne_core::{ChatController, ProviderReply, Session, ThroneError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::commands::{self, CommandResult};

/// What the chat loop should do after a line has been handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Say(String),
    Quit,
}

// ── Terminal chat ───────────────────────────────────────────────────────

pub async fn run_chat(controller: &ChatController) -> Result<()> {
    let session = controller.start().await?;
    println!("{} Throne Room :: {}", persona::SIGIL, persona::CODENAME);
    println!("{}", describe_session(&session));
    println!("Type /help for commands. Ctrl-C cancels a pending reply; at the prompt, Ctrl-C, Ctrl-D or /quit exits.\n");

    chat_loop(controller, BufReader::new(tokio::io::stdin()), ctrl_c).await?;

    println!("The flame endures. Farewell.");
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the signal cannot be watched.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Read lines until end of input, `/quit`, or an interrupt at the prompt.
/// An interrupt while a reply is pending cancels only that reply.
pub async fn chat_loop<R, F, Fut>(controller: &ChatController, reader: R, interrupt: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut lines = reader.lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let next = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupt() => {
                println!();
                break;
            }
        };
        let Some(line) = next else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let step = match commands::handle_command(line) {
            CommandResult::NotACommand => send_interruptible(controller, line, &interrupt).await,
            command => execute(controller, command).await,
        };
        match step {
            Step::Say(text) => println!("{text}\n"),
            Step::Quit => break,
        }
    }
    Ok(())
}

/// Send `line`, cancelling the pending reply if an interrupt arrives first.
async fn send_interruptible<F, Fut>(controller: &ChatController, line: &str, interrupt: &F) -> Step
where
    F: Fn() -> Fut,
    Fut: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let send = controller.send_with_cancel(line, &cancel);
    tokio::pin!(send);

    let outcome = tokio::select! {
        outcome = &mut send => outcome,
        _ = interrupt() => {
            cancel.cancel();
            send.await
        }
    };
    send_outcome(outcome)
}

pub async fn send_line(controller: &ChatController, line: &str) -> Step {
    send_outcome(controller.send(line).await)
}

fn send_outcome(outcome: throne_core::Result<ProviderReply>) -> Step {
    match outcome {
        Ok(reply) => Step::Say(render_reply(&reply)),
        Err(ThroneError::Cancelled) => Step::Say("Cancelled.".into()),
        Err(e) => Step::Say(format!("Error: {e}")),
    }
}

pub fn render_reply(reply: &ProviderReply) -> String {
    format!("[{} · {}]\n{}", reply.source, reply.model_name, reply.text)
}

fn describe_session(session: &Session) -> String {
    format!(
        "Session: {} ({} messages, model {})",
        session.title,
        session.messages.len(),
        session.model
    )
}

/// Carry out a parsed slash command against the controller.
pub async fn execute(controller: &ChatController, command: CommandResult) -> Step {
    match run_command(controller, command).await {
        Ok(step) => step,
        Err(e) => Step::Say(format!("Error: {e}")),
    }
}

async fn run_command(
    controller: &ChatController,
    command: CommandResult,
) -> throne_core::Result<Step> {
    let step = match command {
        CommandResult::Message(msg) => Step::Say(msg),
        CommandResult::Quit => Step::Quit,
        CommandResult::NotACommand => Step::Say(String::new()),
        CommandResult::NewSession => {
            let session = controller.new_session().await?;
            Step::Say(format!("New session started: {}", session.title))
        }
        CommandResult::ListSessions => {
            let sessions = controller.sessions().await;
            if sessions.is_empty() {
                Step::Say("No sessions yet.".into())
            } else {
                let current = controller.current().await.map(|s| s.id);
                let mut list = String::from("Sessions:\n");
                for s in &sessions {
                    let marker = if current.as_deref() == Some(s.id.as_str()) { "*" } else { " " };
                    list.push_str(&format!(
                        "{} {} | {} | {} msgs | {}\n",
                        marker,
                        short_id(&s.id),
                        s.title,
                        s.messages.len(),
                        s.updated_at.format("%Y-%m-%d %H:%M"),
                    ));
                }
                list.push_str("\nUse /load <id> to switch sessions.");
                Step::Say(list)
            }
        }
        CommandResult::LoadSession(id) => {
            let id = resolve_session_id(&controller.sessions().await, &id)?;
            let session = controller.select_session(&id).await?;
            let mut text = format!("Loaded {}", describe_session(&session));
            for message in &session.messages {
                text.push_str(&format!("\n  {:?}: {}", message.role, message.content));
            }
            Step::Say(text)
        }
        CommandResult::Rename(title) => {
            controller.rename(&title).await?;
            Step::Say(format!("Session renamed to: {title}"))
        }
        CommandResult::Clear => {
            controller.clear().await?;
            Step::Say("Session cleared.".into())
        }
        CommandResult::Delete(id) => {
            let target = match id {
                Some(id) => Some(resolve_session_id(&controller.sessions().await, &id)?),
                None => None,
            };
            match controller.delete(target.as_deref()).await? {
                Some(fresh) => Step::Say(format!("Session deleted. Started {}", fresh.title)),
                None => Step::Say("Session deleted.".into()),
            }
        }
        CommandResult::Export(dir) => {
            let dir = dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let path = controller.export(None).await?.write_to(&dir)?;
            Step::Say(format!("Exported to {}", path.display()))
        }
        CommandResult::ModelChanged(model) => {
            controller.set_model(&model).await?;
            Step::Say(format!("Model changed to: {model}"))
        }
        CommandResult::ListModels => match controller.gateway().list_local_models().await {
            Ok(models) if models.is_empty() => Step::Say("No local models installed.".into()),
            Ok(models) => {
                let mut list = String::from("Local models:\n");
                for m in &models {
                    list.push_str(&format!("  {} ({:.1} GB)\n", m.name, m.size as f64 / 1e9));
                }
                Step::Say(list.trim_end().to_string())
            }
            Err(e) => Step::Say(format!("Could not list local models: {e}")),
        },
        CommandResult::SetPrimary(prefer) => {
            controller.set_prefer_primary(prefer).await;
            let state = if prefer { "on" } else { "off" };
            Step::Say(format!("Primary provider: {state}"))
        }
        CommandResult::ShowStatus => {
            let session = controller.current().await;
            let status = format!(
                "Status:\n\
                 Session: {}\n\
                 Messages: {}\n\
                 Model: {}\n\
                 Primary provider: {} ({})\n\
                 Sessions on this device: {}",
                session.as_ref().map(|s| s.title.as_str()).unwrap_or("none"),
                session.as_ref().map(|s| s.messages.len()).unwrap_or(0),
                controller.model().await,
                if controller.prefer_primary().await { "on" } else { "off" },
                if controller.gateway().has_primary() { "configured" } else { "no API key" },
                controller.sessions().await.len(),
            );
            Step::Say(status)
        }
    };
    Ok(step)
}

/// First eight characters of a session ID, for listings.
fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Accept a full session ID or an unambiguous prefix of one.
fn resolve_session_id(sessions: &[Session], wanted: &str) -> throne_core::Result<String> {
    if sessions.iter().any(|s| s.id == wanted) {
        return Ok(wanted.to_string());
    }
    let mut matches = sessions.iter().filter(|s| s.id.starts_with(wanted));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only.id.clone()),
        (Some(_), Some(_)) => Err(ThroneError::Validation(format!(
            "session id prefix '{wanted}' is ambiguous"
        ))),
        _ => Err(ThroneError::NotFound(wanted.to_string())),
    }
}
