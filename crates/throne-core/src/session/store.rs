use super::model::{derive_title, Message, Session, SessionExport};
use super::storage::KeyValueStorage;
use crate::constants::sessions::{
    DEFAULT_TITLE, DEVICE_ID_KEY, MAX_SESSIONS_PER_DEVICE, SESSIONS_KEY,
};
use crate::error::{Result, ThroneError};
use crate::llm::Role;
use std::collections::HashMap;

/// Generate a device identifier of the form `device-<unix-millis>-<8 hex>`.
pub fn generate_device_id() -> String {
    format!(
        "device-{}-{:08x}",
        chrono::Utc::now().timestamp_millis(),
        rand::random::<u32>()
    )
}

/// Device-scoped session persistence over a key-value storage.
///
/// The in-memory list is authoritative; storage writes that fail are logged
/// and the operation still succeeds.
pub struct SessionStore {
    storage: Box<dyn KeyValueStorage>,
    device_id: String,
    sessions: Vec<Session>,
    max_per_device: usize,
}

impl SessionStore {
    /// Load the device identifier and sessions from `storage`, creating and
    /// persisting a device identifier on first use.
    pub fn open(mut storage: Box<dyn KeyValueStorage>) -> Self {
        let device_id = match storage.get(DEVICE_ID_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => id,
            Ok(_) => {
                let id = generate_device_id();
                if let Err(e) = storage.set(DEVICE_ID_KEY, &id) {
                    tracing::warn!("Failed to persist device id: {}", e);
                }
                tracing::info!("Generated device id {}", id);
                id
            }
            Err(e) => {
                tracing::warn!("Failed to read device id: {}", e);
                generate_device_id()
            }
        };

        let sessions = match storage.get(SESSIONS_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Session>>(&raw) {
                Ok(sessions) => sessions,
                Err(e) => {
                    tracing::warn!("Stored sessions are malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read sessions: {}", e);
                Vec::new()
            }
        };

        Self {
            storage,
            device_id,
            sessions,
            max_per_device: MAX_SESSIONS_PER_DEVICE,
        }
    }

    pub fn with_max_sessions(mut self, max_per_device: usize) -> Self {
        self.max_per_device = max_per_device.max(1);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn create(&mut self, title: Option<&str>, model: &str) -> Session {
        let session = Session::new(
            self.device_id.clone(),
            title.unwrap_or(DEFAULT_TITLE),
            model,
        );
        self.sessions.insert(0, session.clone());
        self.persist();
        session
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Append a message. The first user message becomes the title unless
    /// the session was renamed.
    pub fn append(&mut self, id: &str, message: Message) -> Result<()> {
        let session = self.session_mut(id)?;
        let derive =
            session.messages.is_empty() && message.role == Role::User && !session.renamed;
        if derive {
            session.title = derive_title(&message.content);
        }
        session.messages.push(message);
        session.touch();
        self.persist();
        Ok(())
    }

    pub fn rename(&mut self, id: &str, title: &str) -> Result<()> {
        let session = self.session_mut(id)?;
        session.title = title.to_string();
        session.renamed = true;
        session.touch();
        self.persist();
        Ok(())
    }

    /// Wipe messages and reset the title. Clearing an empty session is a no-op
    /// apart from the timestamp.
    pub fn clear(&mut self, id: &str) -> Result<()> {
        let session = self.session_mut(id)?;
        session.messages.clear();
        session.title = DEFAULT_TITLE.to_string();
        session.renamed = false;
        session.touch();
        self.persist();
        Ok(())
    }

    pub fn set_model(&mut self, id: &str, model: &str) -> Result<()> {
        let session = self.session_mut(id)?;
        session.model = model.to_string();
        session.touch();
        self.persist();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            tracing::warn!("Session not found: {}", id);
            return Err(ThroneError::NotFound(id.to_string()));
        }
        self.persist();
        Ok(())
    }

    /// Sessions owned by `device_id`, most recently updated first.
    pub fn list_for_device(&self, device_id: &str) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| s.device_id == device_id)
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions
    }

    pub fn list(&self) -> Vec<&Session> {
        self.list_for_device(&self.device_id)
    }

    pub fn export(&self, id: &str) -> Result<SessionExport> {
        self.get(id)
            .cloned()
            .map(SessionExport::new)
            .ok_or_else(|| ThroneError::NotFound(id.to_string()))
    }

    fn session_mut(&mut self, id: &str) -> Result<&mut Session> {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => Ok(session),
            None => {
                tracing::warn!("Session not found: {}", id);
                Err(ThroneError::NotFound(id.to_string()))
            }
        }
    }

    /// Keep the most recently updated sessions of every device.
    fn enforce_retention(&mut self) {
        self.sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let mut seen: HashMap<String, usize> = HashMap::new();
        let max = self.max_per_device;
        let before = self.sessions.len();
        self.sessions.retain(|s| {
            let count = seen.entry(s.device_id.clone()).or_insert(0);
            *count += 1;
            *count <= max
        });
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            tracing::debug!("Retention dropped {} sessions", dropped);
        }
    }

    fn persist(&mut self) {
        self.enforce_retention();
        let result = serde_json::to_string(&self.sessions)
            .map_err(ThroneError::from)
            .and_then(|raw| self.storage.set(SESSIONS_KEY, &raw));
        if let Err(e) = result {
            tracing::warn!("Failed to persist sessions: {}", e);
        }
    }
}
