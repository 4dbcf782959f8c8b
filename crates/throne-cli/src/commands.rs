/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh session.
    NewSession,
    /// List this device's sessions.
    ListSessions,
    /// Switch to a session by ID.
    LoadSession(String),
    /// Rename the current session.
    Rename(String),
    /// Drop every message from the current session.
    Clear,
    /// Delete a session; the current one when no ID is given.
    Delete(Option<String>),
    /// Write the current session to a JSON file in a directory.
    Export(Option<String>),
    /// Change the model.
    ModelChanged(String),
    /// List local models.
    ListModels,
    /// Toggle whether the primary provider is consulted.
    SetPrimary(bool),
    /// Show status (session, model, provider preference).
    ShowStatus,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let parts: Vec<&str> = input.trim().splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,

        // Session commands
        "/new" => CommandResult::NewSession,
        "/list" | "/sessions" => CommandResult::ListSessions,
        "/load" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /load <session-id>".into())
            } else {
                CommandResult::LoadSession(arg.to_string())
            }
        }
        "/rename" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /rename <title>".into())
            } else {
                CommandResult::Rename(arg.to_string())
            }
        }
        "/clear" => CommandResult::Clear,
        "/delete" => CommandResult::Delete(non_empty(arg)),
        "/export" => CommandResult::Export(non_empty(arg)),

        // Model commands
        "/model" => {
            if arg.is_empty() {
                CommandResult::Message("Current model is shown in /status. Use: /model <model-name>".into())
            } else {
                CommandResult::ModelChanged(arg.to_string())
            }
        }
        "/models" => CommandResult::ListModels,
        "/primary" => match arg {
            "on" => CommandResult::SetPrimary(true),
            "off" => CommandResult::SetPrimary(false),
            _ => CommandResult::Message("Usage: /primary on|off".into()),
        },
        "/status" => CommandResult::ShowStatus,
        "/version" => CommandResult::Message(format!("Throne Room v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.trim_start().starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn non_empty(arg: &str) -> Option<String> {
    (!arg.is_empty()).then(|| arg.to_string())
}

fn show_help() -> CommandResult {
    let help_text = "\
╭─ Throne Room Commands ─────────────────────────────────────────╮

  SESSIONS
    /new                      Start a new sacred dialogue
    /list, /sessions          List this device's sessions
    /load <id>                Switch to a session
    /rename <title>           Rename the current session
    /clear                    Clear the current session's messages
    /delete [id]              Delete a session (current if omitted)
    /export [dir]             Export the current session as JSON

  MODEL & PROVIDER
    /model <name>             Change model for this session
    /models                   List local models
    /primary on|off           Consult the primary provider first
    /status                   Show session, model and provider state

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit

╰────────────────────────────────────────────────────────────────╯";

    CommandResult::Message(help_text.into())
}
