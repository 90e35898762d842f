use crate::application::session::SessionManager;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct ServerState {
    sessions: Arc<SessionManager>,
    started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self {
            sessions,
            started_at: Utc::now(),
        }
    }

    pub(crate) fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub(crate) fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
