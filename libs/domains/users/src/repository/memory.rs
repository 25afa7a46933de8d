//! In-memory store with the same transactional behaviour as the Postgres
//! repositories, for tests and local development.
//!
//! A write transaction works on a private copy of the table taken at
//! `begin`. `commit` re-validates every touched row against the live table
//! under the write lock (version match, email uniqueness) and applies all
//! changes at once or none of them. Dropping the transaction discards it.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use super::{UserCommandRepository, UserCommandTx, UserQueryRepository, UserQuerySession};
use crate::error::{UserError, UserResult};
use crate::models::{NewUser, Page, User, UserView};

type Rows = BTreeMap<i64, User>;

/// Shared table backing both repositories
#[derive(Debug, Clone)]
pub struct InMemoryUserStore {
    rows: Arc<RwLock<Rows>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn command_repository(&self) -> InMemoryCommandRepository {
        InMemoryCommandRepository {
            store: self.clone(),
        }
    }

    pub fn query_repository(&self) -> InMemoryQueryRepository {
        InMemoryQueryRepository {
            store: self.clone(),
        }
    }

    /// Committed row, bypassing transactions
    pub async fn get(&self, id: i64) -> Option<User> {
        self.rows.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCommandRepository {
    store: InMemoryUserStore,
}

#[derive(Debug, Clone)]
pub struct InMemoryQueryRepository {
    store: InMemoryUserStore,
}

/// Staged change for one row
#[derive(Debug, Clone)]
struct Change {
    /// Version the row had when first touched; `None` for rows inserted here
    expected_version: Option<i64>,
    /// Row after the transaction; `None` when deleted
    after: Option<User>,
}

pub struct MemoryCommandTx {
    store: InMemoryUserStore,
    working: Rows,
    changes: BTreeMap<i64, Change>,
    finished: bool,
}

impl MemoryCommandTx {
    fn touch(&mut self, id: i64, after: Option<User>) {
        let expected = self.working.get(&id).map(|u| u.version);
        self.changes
            .entry(id)
            .and_modify(|change| change.after = after.clone())
            .or_insert(Change {
                expected_version: expected,
                after,
            });
    }

    /// Check every staged change against the committed table
    fn validate(&self, live: &Rows) -> UserResult<()> {
        for (id, change) in &self.changes {
            match (change.expected_version, &change.after) {
                (Some(expected), _) => {
                    if live.get(id).map(|u| u.version) != Some(expected) {
                        return Err(UserError::Conflict(*id));
                    }
                }
                (None, Some(inserted)) => {
                    let taken = live
                        .values()
                        .any(|other| other.email == inserted.email && !self.deletes(other.id));
                    if taken {
                        return Err(UserError::duplicate_email(&inserted.email));
                    }
                }
                (None, None) => {}
            }
        }
        Ok(())
    }

    fn deletes(&self, id: i64) -> bool {
        matches!(self.changes.get(&id), Some(Change { after: None, .. }))
    }
}

impl Drop for MemoryCommandTx {
    fn drop(&mut self) {
        if !self.finished && !self.changes.is_empty() {
            tracing::debug!(changes = self.changes.len(), "Uncommitted transaction rolled back");
        }
    }
}

#[async_trait]
impl UserCommandRepository for InMemoryCommandRepository {
    type Tx = MemoryCommandTx;

    async fn begin(&self) -> UserResult<Self::Tx> {
        let working = self.store.rows.read().await.clone();
        Ok(MemoryCommandTx {
            store: self.store.clone(),
            working,
            changes: BTreeMap::new(),
            finished: false,
        })
    }
}

#[async_trait]
impl UserCommandTx for MemoryCommandTx {
    async fn exists_by_email(&mut self, email: &str) -> UserResult<bool> {
        Ok(self.working.values().any(|u| u.email == email))
    }

    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<User>> {
        Ok(self.working.get(&id).cloned())
    }

    async fn insert(&mut self, user: NewUser) -> UserResult<User> {
        if self.working.values().any(|u| u.email == user.email) {
            return Err(UserError::duplicate_email(&user.email));
        }

        let id = self.store.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
            version: 0,
        };

        self.touch(id, Some(user.clone()));
        self.working.insert(id, user.clone());
        Ok(user)
    }

    async fn update(&mut self, user: User) -> UserResult<User> {
        let current_version = self.working.get(&user.id).map(|u| u.version);
        if current_version != Some(user.version) {
            return Err(UserError::Conflict(user.id));
        }

        // A row committed elsewhere since we first read it fails here, like a
        // versioned UPDATE matching zero rows
        let first_seen = match self.changes.get(&user.id) {
            Some(change) => change.expected_version,
            None => current_version,
        };
        if let Some(expected) = first_seen {
            let committed = self.store.rows.read().await.get(&user.id).map(|u| u.version);
            if committed != Some(expected) {
                return Err(UserError::Conflict(user.id));
            }
        }

        let updated = User {
            version: user.version + 1,
            ..user
        };
        self.touch(updated.id, Some(updated.clone()));
        self.working.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn exists_by_id(&mut self, id: i64) -> UserResult<bool> {
        Ok(self.working.contains_key(&id))
    }

    async fn delete_by_id(&mut self, id: i64) -> UserResult<()> {
        if self.working.contains_key(&id) {
            self.touch(id, None);
            self.working.remove(&id);
        }
        Ok(())
    }

    async fn commit(mut self) -> UserResult<()> {
        let mut live = self.store.rows.write().await;
        self.validate(&live)?;

        for (id, change) in std::mem::take(&mut self.changes) {
            match change.after {
                Some(user) => {
                    live.insert(id, user);
                }
                None => {
                    live.remove(&id);
                }
            }
        }

        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self) -> UserResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Snapshot of the table taken when the session began
pub struct MemoryQuerySession {
    snapshot: Vec<UserView>,
}

#[async_trait]
impl UserQueryRepository for InMemoryQueryRepository {
    type Session = MemoryQuerySession;

    async fn begin_read_only(&self) -> UserResult<Self::Session> {
        let snapshot = self
            .store
            .rows
            .read()
            .await
            .values()
            .cloned()
            .map(UserView::from)
            .collect();
        Ok(MemoryQuerySession { snapshot })
    }
}

#[async_trait]
impl UserQuerySession for MemoryQuerySession {
    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<UserView>> {
        Ok(self.snapshot.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&mut self, email: &str) -> UserResult<Option<UserView>> {
        Ok(self.snapshot.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_name_containing(&mut self, fragment: &str) -> UserResult<Vec<UserView>> {
        // Snapshot is already ordered by id
        Ok(self
            .snapshot
            .iter()
            .filter(|u| u.name.contains(fragment))
            .cloned()
            .collect())
    }

    async fn find_all(&mut self, page: u64, size: u64) -> UserResult<Page<UserView>> {
        let content = self
            .snapshot
            .iter()
            .skip(page.saturating_mul(size) as usize)
            .take(size as usize)
            .cloned()
            .collect();
        Ok(Page::new(content, page, size, self.snapshot.len() as u64))
    }

    async fn find_recent(&mut self, limit: u64) -> UserResult<Vec<UserView>> {
        let mut users = self.snapshot.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn count_all(&mut self) -> UserResult<u64> {
        Ok(self.snapshot.len() as u64)
    }

    async fn finish(self) -> UserResult<()> {
        Ok(())
    }
}
