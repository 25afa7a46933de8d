use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};

use crate::entity::{command, query};
use crate::error::{UserError, UserResult};
use crate::models::{NewUser, Page, User, UserView};
use crate::repository::{UserCommandRepository, UserCommandTx, UserQueryRepository, UserQuerySession};

/// Write-side repository on the command pool
#[derive(Clone)]
pub struct PgUserCommandRepository {
    db: DatabaseConnection,
}

impl PgUserCommandRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub struct PgUserCommandTx {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UserCommandRepository for PgUserCommandRepository {
    type Tx = PgUserCommandTx;

    async fn begin(&self) -> UserResult<Self::Tx> {
        let txn = self.db.begin().await?;
        Ok(PgUserCommandTx { txn })
    }
}

#[async_trait]
impl UserCommandTx for PgUserCommandTx {
    async fn exists_by_email(&mut self, email: &str) -> UserResult<bool> {
        let count = command::Entity::find()
            .filter(command::Column::Email.eq(email))
            .count(&self.txn)
            .await?;
        Ok(count > 0)
    }

    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<User>> {
        let model = command::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(model.map(User::from))
    }

    async fn insert(&mut self, user: NewUser) -> UserResult<User> {
        let email = user.email.clone();
        let active: command::ActiveModel = user.into();

        let model = active.insert(&self.txn).await.map_err(|e| match e.sql_err() {
            // Lost a race with a concurrent insert of the same email
            Some(SqlErr::UniqueConstraintViolation(_)) => UserError::duplicate_email(&email),
            _ => UserError::Store(e),
        })?;

        tracing::info!(user_id = model.id, "Inserted user");
        Ok(model.into())
    }

    async fn update(&mut self, user: User) -> UserResult<User> {
        let next_version = user.version + 1;

        let result = command::Entity::update_many()
            .col_expr(command::Column::Name, Expr::value(user.name.clone()))
            .col_expr(
                command::Column::UpdatedAt,
                Expr::value(user.updated_at.fixed_offset()),
            )
            .col_expr(command::Column::Version, Expr::value(next_version))
            .filter(command::Column::Id.eq(user.id))
            .filter(command::Column::Version.eq(user.version))
            .exec(&self.txn)
            .await?;

        if result.rows_affected == 0 {
            tracing::warn!(user_id = user.id, version = user.version, "Optimistic lock conflict");
            return Err(UserError::Conflict(user.id));
        }

        Ok(User {
            version: next_version,
            ..user
        })
    }

    async fn exists_by_id(&mut self, id: i64) -> UserResult<bool> {
        let count = command::Entity::find()
            .filter(command::Column::Id.eq(id))
            .count(&self.txn)
            .await?;
        Ok(count > 0)
    }

    async fn delete_by_id(&mut self, id: i64) -> UserResult<()> {
        let result = command::Entity::delete_by_id(id).exec(&self.txn).await?;
        tracing::debug!(user_id = id, rows = result.rows_affected, "Deleted user");
        Ok(())
    }

    async fn commit(self) -> UserResult<()> {
        self.txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> UserResult<()> {
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Read-side repository on the query pool
#[derive(Clone)]
pub struct PgUserQueryRepository {
    db: DatabaseConnection,
}

impl PgUserQueryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub struct PgUserQuerySession {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UserQueryRepository for PgUserQueryRepository {
    type Session = PgUserQuerySession;

    async fn begin_read_only(&self) -> UserResult<Self::Session> {
        let txn = self
            .db
            .begin_with_config(None, Some(AccessMode::ReadOnly))
            .await?;
        Ok(PgUserQuerySession { txn })
    }
}

/// Quote LIKE metacharacters so the fragment matches literally
fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn views(models: Vec<query::Model>) -> Vec<UserView> {
    models.into_iter().map(UserView::from).collect()
}

#[async_trait]
impl UserQuerySession for PgUserQuerySession {
    async fn find_by_id(&mut self, id: i64) -> UserResult<Option<UserView>> {
        let model = query::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(model.map(UserView::from))
    }

    async fn find_by_email(&mut self, email: &str) -> UserResult<Option<UserView>> {
        let model = query::Entity::find()
            .filter(query::Column::Email.eq(email))
            .one(&self.txn)
            .await?;
        Ok(model.map(UserView::from))
    }

    async fn find_by_name_containing(&mut self, fragment: &str) -> UserResult<Vec<UserView>> {
        let models = query::Entity::find()
            .filter(
                query::Column::Name
                    .like(LikeExpr::new(format!("%{}%", escape_like(fragment))).escape('\\')),
            )
            .order_by_asc(query::Column::Id)
            .all(&self.txn)
            .await?;
        Ok(views(models))
    }

    async fn find_all(&mut self, page: u64, size: u64) -> UserResult<Page<UserView>> {
        let paginator = query::Entity::find()
            .order_by_asc(query::Column::Id)
            .paginate(&self.txn, size);

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        Ok(Page::new(views(models), page, size, total))
    }

    async fn find_recent(&mut self, limit: u64) -> UserResult<Vec<UserView>> {
        let models = query::Entity::find()
            .order_by_desc(query::Column::CreatedAt)
            .order_by_desc(query::Column::Id)
            .limit(limit)
            .all(&self.txn)
            .await?;
        Ok(views(models))
    }

    async fn count_all(&mut self) -> UserResult<u64> {
        Ok(query::Entity::find().count(&self.txn).await?)
    }

    async fn finish(self) -> UserResult<()> {
        // Nothing to persist; commit just releases the snapshot
        self.txn.commit().await?;
        Ok(())
    }
}
