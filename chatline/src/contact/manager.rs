use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex as TokioMutex;

use crate::backend::UserDirectory;
use crate::models::{ContactSummary, Session};

use super::{ContactListListener, StubListener, Summarizer, filter_contacts};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with this many contacts.
    Applied(usize),
    /// A load started later was applied first; this result was dropped.
    Superseded,
}

// Contact list together with the load that produced it.
#[derive(Default)]
struct Loaded {
    generation: u64,
    contacts: Vec<ContactSummary>,
}

/// Owns the contact list shown in the sidebar.
///
/// Every load replaces the whole list. When loads overlap, a result is
/// dropped once a load started after it has been applied. A failed load
/// supersedes nothing.
pub struct ContactListManager {
    users: Arc<dyn UserDirectory>,
    summarizer: Arc<Summarizer>,
    loaded: TokioMutex<Loaded>,
    generation: AtomicU64,
    listener: Arc<dyn ContactListListener>,
}

impl ContactListManager {
    pub fn new(users: Arc<dyn UserDirectory>, summarizer: Arc<Summarizer>) -> Self {
        Self::with_listener(users, summarizer, Arc::new(StubListener))
    }

    pub fn with_listener<L>(
        users: Arc<dyn UserDirectory>,
        summarizer: Arc<Summarizer>,
        listener: Arc<L>,
    ) -> Self
    where
        L: ContactListListener + 'static,
    {
        Self {
            users,
            summarizer,
            loaded: TokioMutex::new(Loaded::default()),
            generation: AtomicU64::new(0),
            listener,
        }
    }

    /// Rebuild the list for `session`.
    ///
    /// Fails only when the user directory cannot be listed; the previous list
    /// is kept in that case.
    pub async fn refresh(&self, session: &Session) -> Result<LoadOutcome, anyhow::Error> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(generation, user_id = %session.user_id, "Loading contact list");
        let users = match self.users.list_users().await {
            Ok(v) => v,
            Err(err) => {
                tracing::error!(?err, "Error fetching chats with messages");
                self.listener.on_load_failed(err.to_string()).await;
                return Err(err);
            }
        };
        let list = self.summarizer.build_contact_list(session, users).await;
        let mut loaded = self.loaded.lock().await;
        if loaded.generation > generation {
            tracing::debug!(
                generation,
                applied = loaded.generation,
                "Dropping superseded contact list"
            );
            return Ok(LoadOutcome::Superseded);
        }
        loaded.generation = generation;
        loaded.contacts = list.clone();
        drop(loaded);
        let count = list.len();
        self.listener.on_contacts_loaded(list).await;
        Ok(LoadOutcome::Applied(count))
    }

    pub async fn contacts(&self) -> Vec<ContactSummary> {
        self.loaded.lock().await.contacts.clone()
    }

    pub async fn search(&self, query: &str) -> Vec<ContactSummary> {
        let loaded = self.loaded.lock().await;
        filter_contacts(&loaded.contacts, query)
    }
}
