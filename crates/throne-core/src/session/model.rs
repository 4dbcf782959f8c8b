use crate::constants::sessions::{
    DEFAULT_TITLE, EXPORTED_BY, EXPORT_VERSION, PREVIEW_MAX_CHARS, TITLE_MAX_CHARS,
};
use crate::error::Result;
use crate::llm::{ChatTurn, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One message in a session. Never modified after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            model: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn to_turn(&self) -> ChatTurn {
        ChatTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A persisted conversation thread owned by one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub device_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub model: String,
    /// Set by an explicit rename; the first user message no longer retitles.
    #[serde(default)]
    pub renamed: bool,
}

impl Session {
    pub fn new(device_id: impl Into<String>, title: impl Into<String>, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            title: title.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            model: model.into(),
            renamed: false,
        }
    }

    /// Bump `updated_at`, never moving it before `created_at`.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(Message::to_turn).collect()
    }

    /// First user message shortened for listings, or the placeholder title.
    pub fn preview(&self) -> String {
        if self.messages.is_empty() {
            return DEFAULT_TITLE.to_string();
        }
        match self.messages.iter().find(|m| m.role == Role::User) {
            Some(first) => truncate_with_ellipsis(&first.content, PREVIEW_MAX_CHARS),
            None => self.title.clone(),
        }
    }
}

/// Title derived from the opening user message.
pub fn derive_title(content: &str) -> String {
    truncate_with_ellipsis(content, TITLE_MAX_CHARS)
}

pub(crate) fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// A session snapshot annotated for export. Export is one-way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    #[serde(flatten)]
    pub session: Session,
    pub exported_at: DateTime<Utc>,
    pub exported_by: String,
    pub version: String,
}

impl SessionExport {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            exported_at: Utc::now(),
            exported_by: EXPORTED_BY.to_string(),
            version: EXPORT_VERSION.to_string(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn file_name(&self) -> String {
        format!(
            "session-{}-{}.json",
            self.session.id,
            self.exported_at.timestamp_millis()
        )
    }

    /// Write the export into `dir` and return the file path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_json_pretty()?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_truncates() {
        assert_eq!(derive_title("short"), "short");
        let exact = "a".repeat(50);
        assert_eq!(derive_title(&exact), exact);
        let long = "b".repeat(51);
        assert_eq!(derive_title(&long), format!("{}...", "b".repeat(50)));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let flames = "🔥".repeat(45);
        assert_eq!(truncate_with_ellipsis(&flames, 40), format!("{}...", "🔥".repeat(40)));
    }

    #[test]
    fn test_preview() {
        let mut session = Session::new("device", "Named", "gpt-4o");
        assert_eq!(session.preview(), DEFAULT_TITLE);

        session.messages.push(Message::assistant("greeting", "gpt-4o"));
        assert_eq!(session.preview(), "Named");

        session.messages.push(Message::user("x".repeat(41)));
        assert_eq!(session.preview(), format!("{}...", "x".repeat(40)));
    }

    #[test]
    fn test_session_serializes_camel_case() {
        let session = Session::new("device-1", "t", "gpt-4o");
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["deviceId"], "device-1");
        assert!(value["createdAt"].is_string());
        assert!(value.get("device_id").is_none());
    }

    #[test]
    fn test_export_carries_metadata() {
        let export = SessionExport::new(Session::new("d", "t", "m"));
        let value: serde_json::Value =
            serde_json::from_str(&export.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["exportedBy"], EXPORTED_BY);
        assert_eq!(value["version"], EXPORT_VERSION);
        assert_eq!(value["id"], export.session.id);
        assert!(export.file_name().starts_with(&format!("session-{}-", export.session.id)));
    }
}
