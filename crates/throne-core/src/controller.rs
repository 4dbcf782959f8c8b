use crate::error::{Result, ThroneError};
use crate::llm::{validate_message, ProviderGateway, ProviderReply, ReplyRequest};
use crate::session::{Message, Session, SessionExport, SessionStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

struct ChatState {
    current: Option<String>,
    model: String,
    prefer_primary: bool,
}

/// Clears the busy flag when the pending reply finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ThroneError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wires user input to the provider gateway and the session store. At most
/// one reply is pending at a time.
pub struct ChatController {
    gateway: Arc<ProviderGateway>,
    store: Mutex<SessionStore>,
    state: Mutex<ChatState>,
    busy: AtomicBool,
}

impl ChatController {
    pub fn new(gateway: Arc<ProviderGateway>, store: SessionStore, model: impl Into<String>) -> Self {
        Self {
            gateway,
            store: Mutex::new(store),
            state: Mutex::new(ChatState {
                current: None,
                model: model.into(),
                prefer_primary: true,
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn gateway(&self) -> &Arc<ProviderGateway> {
        &self.gateway
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Resume the most recent session of this device, or create one.
    pub async fn start(&self) -> Result<Session> {
        let mut state = self.state.lock().await;
        let mut store = self.store.lock().await;
        let device = store.device_id().to_string();
        let latest = store.list_for_device(&device).first().map(|s| (*s).clone());
        let session = match latest {
            Some(latest) => latest,
            None => store.create(None, &state.model),
        };
        state.model = session.model.clone();
        state.current = Some(session.id.clone());
        tracing::info!("Active session {} ({} messages)", session.id, session.messages.len());
        Ok(session)
    }

    pub async fn send(&self, input: &str) -> Result<ProviderReply> {
        self.send_with_cancel(input, &CancellationToken::new()).await
    }

    /// Append `input` to the current session, obtain a reply and append it.
    /// A reply for a cancelled request is discarded.
    pub async fn send_with_cancel(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<ProviderReply> {
        validate_message(input)?;
        let _guard = BusyGuard::acquire(&self.busy)?;

        let (session_id, model, prefer_primary) = {
            let mut state = self.state.lock().await;
            let mut store = self.store.lock().await;
            let id = match state.current.clone().filter(|id| store.get(id).is_some()) {
                Some(id) => id,
                None => {
                    let created = store.create(None, &state.model);
                    state.current = Some(created.id.clone());
                    created.id
                }
            };
            (id, state.model.clone(), state.prefer_primary)
        };

        let history = {
            let mut store = self.store.lock().await;
            let history = store
                .get(&session_id)
                .map(Session::history)
                .unwrap_or_default();
            store.append(&session_id, Message::user(input))?;
            history
        };

        let request = ReplyRequest {
            message: input.to_string(),
            history,
            model: Some(model),
            prefer_primary,
        };
        let reply = self.gateway.get_reply(&request, cancel).await;

        if reply.is_cancelled() {
            tracing::info!("Discarding reply for cancelled request");
            return Err(ThroneError::Cancelled);
        }

        let mut store = self.store.lock().await;
        if let Err(e) = store.append(
            &session_id,
            Message::assistant(reply.text.clone(), reply.model_name.clone()),
        ) {
            tracing::warn!("Reply arrived for a session that is gone: {}", e);
        }
        Ok(reply)
    }

    pub async fn new_session(&self) -> Result<Session> {
        let mut state = self.state.lock().await;
        let mut store = self.store.lock().await;
        let session = store.create(None, &state.model);
        state.current = Some(session.id.clone());
        Ok(session)
    }

    pub async fn select_session(&self, id: &str) -> Result<Session> {
        let mut state = self.state.lock().await;
        let store = self.store.lock().await;
        let session = store
            .get(id)
            .cloned()
            .ok_or_else(|| ThroneError::NotFound(id.to_string()))?;
        state.current = Some(session.id.clone());
        state.model = session.model.clone();
        Ok(session)
    }

    /// Change the selected model and record it on the current session.
    pub async fn set_model(&self, model: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.model = model.to_string();
        if let Some(id) = state.current.as_deref() {
            self.store.lock().await.set_model(id, model)?;
        }
        Ok(())
    }

    pub async fn model(&self) -> String {
        self.state.lock().await.model.clone()
    }

    pub async fn set_prefer_primary(&self, prefer: bool) {
        self.state.lock().await.prefer_primary = prefer;
    }

    pub async fn prefer_primary(&self) -> bool {
        self.state.lock().await.prefer_primary
    }

    pub async fn rename(&self, title: &str) -> Result<()> {
        let id = self.current_id().await?;
        self.store.lock().await.rename(&id, title)
    }

    pub async fn clear(&self) -> Result<()> {
        let id = self.current_id().await?;
        self.store.lock().await.clear(&id)
    }

    /// Delete `id` (or the current session). Deleting the current session
    /// starts a fresh one, which is returned.
    pub async fn delete(&self, id: Option<&str>) -> Result<Option<Session>> {
        let mut state = self.state.lock().await;
        let target = match id {
            Some(id) => id.to_string(),
            None => state
                .current
                .clone()
                .ok_or_else(|| ThroneError::NotFound("no active session".into()))?,
        };

        let mut store = self.store.lock().await;
        store.delete(&target)?;

        if state.current.as_deref() == Some(target.as_str()) {
            let fresh = store.create(None, &state.model);
            state.current = Some(fresh.id.clone());
            return Ok(Some(fresh));
        }
        Ok(None)
    }

    pub async fn export(&self, id: Option<&str>) -> Result<SessionExport> {
        let target = match id {
            Some(id) => id.to_string(),
            None => self.current_id().await?,
        };
        self.store.lock().await.export(&target)
    }

    /// This device's sessions, most recent first.
    pub async fn sessions(&self) -> Vec<Session> {
        self.store.lock().await.list().into_iter().cloned().collect()
    }

    pub async fn current(&self) -> Option<Session> {
        let id = self.state.lock().await.current.clone()?;
        self.store.lock().await.get(&id).cloned()
    }

    async fn current_id(&self) -> Result<String> {
        self.state
            .lock()
            .await
            .current
            .clone()
            .ok_or_else(|| ThroneError::NotFound("no active session".into()))
    }
}
