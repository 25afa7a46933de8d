use std::sync::Arc;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, NewUser, Page, PageParams, UpdateUserName, User, UserView};
use crate::repository::{
    UserCommandRepository, UserCommandTx, UserQueryRepository, UserQuerySession,
};

/// Business rules and transaction scoping for users.
///
/// Writes go through the command repository, one read-write transaction per
/// call. Reads go through the query repository, one read-only transaction per
/// call. The service holds no state of its own.
pub struct UserService<C, Q> {
    commands: Arc<C>,
    queries: Arc<Q>,
}

impl<C, Q> Clone for UserService<C, Q> {
    fn clone(&self) -> Self {
        Self {
            commands: Arc::clone(&self.commands),
            queries: Arc::clone(&self.queries),
        }
    }
}

impl<C, Q> UserService<C, Q>
where
    C: UserCommandRepository,
    Q: UserQueryRepository,
{
    pub fn new(commands: C, queries: Q) -> Self {
        Self {
            commands: Arc::new(commands),
            queries: Arc::new(queries),
        }
    }

    /// Create a user with a unique email
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input.validate()?;

        let mut tx = self.commands.begin().await?;

        if tx.exists_by_email(&input.email).await? {
            tx.rollback().await?;
            return Err(UserError::duplicate_email(&input.email));
        }

        let user = tx.insert(NewUser::new(input.name, input.email)).await?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, "Created user");
        Ok(user)
    }

    /// Rename a user.
    ///
    /// A concurrent modification surfaces as [`UserError::Conflict`]; the
    /// caller decides whether to re-read and retry.
    pub async fn update_user_name(&self, id: i64, name: impl Into<String>) -> UserResult<User> {
        let input = UpdateUserName { name: name.into() };
        input.validate()?;

        let mut tx = self.commands.begin().await?;

        let Some(mut user) = tx.find_by_id(id).await? else {
            tx.rollback().await?;
            return Err(UserError::NotFound(id));
        };

        user.rename(input.name);
        let user = tx.update(user).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, version = user.version, "Renamed user");
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> UserResult<()> {
        let mut tx = self.commands.begin().await?;

        if !tx.exists_by_id(id).await? {
            tx.rollback().await?;
            return Err(UserError::NotFound(id));
        }

        tx.delete_by_id(id).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, "Deleted user");
        Ok(())
    }

    pub async fn find_user_by_id(&self, id: i64) -> UserResult<UserView> {
        let mut session = self.queries.begin_read_only().await?;
        let user = session.find_by_id(id).await?;
        session.finish().await?;

        user.ok_or(UserError::NotFound(id))
    }

    pub async fn find_user_by_email(&self, email: &str) -> UserResult<UserView> {
        let mut session = self.queries.begin_read_only().await?;
        let user = session.find_by_email(email).await?;
        session.finish().await?;

        user.ok_or_else(|| UserError::EmailNotFound(email.to_string()))
    }

    pub async fn search_users_by_name(&self, fragment: &str) -> UserResult<Vec<UserView>> {
        let mut session = self.queries.begin_read_only().await?;
        let users = session.find_by_name_containing(fragment).await?;
        session.finish().await?;

        Ok(users)
    }

    pub async fn list_users(&self, params: PageParams) -> UserResult<Page<UserView>> {
        params.validate()?;

        let mut session = self.queries.begin_read_only().await?;
        let page = session.find_all(params.page, params.size).await?;
        session.finish().await?;

        Ok(page)
    }

    /// Newest users first, at most `limit`
    pub async fn get_recent_users(&self, limit: i64) -> UserResult<Vec<UserView>> {
        if limit <= 0 {
            return Err(UserError::Validation("limit must be positive".to_string()));
        }

        let mut session = self.queries.begin_read_only().await?;
        let users = session.find_recent(limit as u64).await?;
        session.finish().await?;

        Ok(users)
    }

    pub async fn count_users(&self) -> UserResult<u64> {
        let mut session = self.queries.begin_read_only().await?;
        let count = session.count_all().await?;
        session.finish().await?;

        Ok(count)
    }
}
