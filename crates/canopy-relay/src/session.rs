//! Session store: maps a session to the surfaces registered in it.

use std::collections::HashMap;
use std::sync::Arc;

use canopy_common::Route;
use tokio::sync::{mpsc, RwLock};

struct Member {
    conn_id: String,
    tx: mpsc::Sender<String>,
}

/// Thread-safe registry of `session -> surface name -> connection`.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, Member>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a surface. A previous connection under the same name is
    /// replaced; returns `true` in that case.
    pub async fn register(
        &self,
        session: &str,
        name: &str,
        conn_id: &str,
        tx: mpsc::Sender<String>,
    ) -> bool {
        let mut map = self.sessions.write().await;
        let members = map.entry(session.to_string()).or_default();
        members
            .insert(
                name.to_string(),
                Member {
                    conn_id: conn_id.to_string(),
                    tx,
                },
            )
            .is_some()
    }

    /// Remove a surface, but only if `conn_id` still owns the name. Returns
    /// `true` if something was removed.
    pub async fn unregister(&self, session: &str, name: &str, conn_id: &str) -> bool {
        let mut map = self.sessions.write().await;
        let Some(members) = map.get_mut(session) else {
            return false;
        };
        let owned = members.get(name).is_some_and(|m| m.conn_id == conn_id);
        if owned {
            members.remove(name);
            if members.is_empty() {
                map.remove(session);
            }
        }
        owned
    }

    /// Senders a routed envelope should be delivered to.
    pub async fn targets(&self, session: &str, route: &Route) -> Vec<mpsc::Sender<String>> {
        let map = self.sessions.read().await;
        let Some(members) = map.get(session) else {
            return Vec::new();
        };
        match route {
            Route::Surface(name) => members.get(name).map(|m| m.tx.clone()).into_iter().collect(),
            Route::AllExcept(sender) => members
                .iter()
                .filter(|(name, _)| *name != sender)
                .map(|(_, m)| m.tx.clone())
                .collect(),
            Route::Nowhere => Vec::new(),
        }
    }

    /// Names registered in `session`, sorted.
    pub async fn names(&self, session: &str) -> Vec<String> {
        let map = self.sessions.read().await;
        let mut names: Vec<String> = map
            .get(session)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Number of sessions with at least one surface.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
