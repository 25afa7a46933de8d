//! Data access for users, split into a write path and a read path.
//!
//! Every operation runs inside an explicit unit of work obtained from the
//! repository: [`UserCommandRepository::begin`] opens a read-write
//! transaction, [`UserQueryRepository::begin_read_only`] a read-only one.
//! A transaction that is dropped without `commit` is rolled back.

use async_trait::async_trait;

use crate::error::UserResult;
use crate::models::{NewUser, Page, User, UserView};

pub mod memory;

pub use memory::{
    InMemoryCommandRepository, InMemoryQueryRepository, InMemoryUserStore, MemoryCommandTx,
    MemoryQuerySession,
};

/// Write path: hands out read-write transactions
#[cfg_attr(test, mockall::automock(type Tx = MemoryCommandTx;))]
#[async_trait]
pub trait UserCommandRepository: Send + Sync {
    type Tx: UserCommandTx;

    async fn begin(&self) -> UserResult<Self::Tx>;
}

/// Operations available inside a write transaction
#[async_trait]
pub trait UserCommandTx: Send + Sized {
    async fn exists_by_email(&mut self, email: &str) -> UserResult<bool>;

    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<User>>;

    /// Store a new user; the returned user has its id and version 0
    async fn insert(&mut self, user: NewUser) -> UserResult<User>;

    /// Persist `user` if the stored version still equals `user.version`.
    ///
    /// Returns the user with the incremented version, or
    /// [`UserError::Conflict`](crate::error::UserError::Conflict) without
    /// changing anything.
    async fn update(&mut self, user: User) -> UserResult<User>;

    async fn exists_by_id(&mut self, id: i64) -> UserResult<bool>;

    /// Deleting a missing id is a no-op
    async fn delete_by_id(&mut self, id: i64) -> UserResult<()>;

    async fn commit(self) -> UserResult<()>;

    async fn rollback(self) -> UserResult<()>;
}

/// Read path: hands out read-only sessions
#[cfg_attr(test, mockall::automock(type Session = MemoryQuerySession;))]
#[async_trait]
pub trait UserQueryRepository: Send + Sync {
    type Session: UserQuerySession;

    async fn begin_read_only(&self) -> UserResult<Self::Session>;
}

/// Side-effect-free lookups inside a read-only transaction
#[async_trait]
pub trait UserQuerySession: Send + Sized {
    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<UserView>>;

    async fn find_by_email(&mut self, email: &str) -> UserResult<Option<UserView>>;

    /// Case-sensitive substring match, ordered by id
    async fn find_by_name_containing(&mut self, fragment: &str) -> UserResult<Vec<UserView>>;

    async fn find_all(&mut self, page: u64, size: u64) -> UserResult<Page<UserView>>;

    /// Newest first by `created_at`, at most `limit`
    async fn find_recent(&mut self, limit: u64) -> UserResult<Vec<UserView>>;

    async fn count_all(&mut self) -> UserResult<u64>;

    /// End the read-only transaction
    async fn finish(self) -> UserResult<()>;
}
