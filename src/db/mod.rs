use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, warn};

mod error;
mod fields;
mod user;

pub use error::DbError;
pub use fields::{FilterValue, UserField, UserFilter, UserUpdate};
pub use user::User;

const USER_COLUMNS: &str = "id, email, hashed_password, session_id, reset_token";

/// Data-access layer for the `users` table. Owns the injected pool handle;
/// the only component that talks to the store.
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert a new user and return the persisted row, including the
    /// store-assigned id. The write runs in its own transaction; any store
    /// failure rolls it back and surfaces as `DbError::Storage`.
    pub async fn add_user(&self, email: &str, hashed_password: &str) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::storage)?;

        let user = match sqlx::query_as::<_, User>(
            "INSERT INTO users (email, hashed_password) \
             VALUES ($1, $2) \
             RETURNING id, email, hashed_password, session_id, reset_token",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(user) => user,
            Err(e) => return Err(abort(tx, e).await),
        };

        tx.commit().await.map_err(DbError::aborted)?;
        debug!(user_id = user.id, email = %user.email, "user inserted");
        Ok(user)
    }

    /// Find the first user matching every term of `filter`, ordered by id
    /// so repeated calls against duplicate matches stay deterministic.
    /// Zero matches is `DbError::NotFound`; an empty filter matches the
    /// first row of the table.
    pub async fn find_user_by(&self, filter: &UserFilter) -> Result<User, DbError> {
        let mut qb = find_query(filter);
        let user = qb
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::storage)?;
        user.ok_or(DbError::NotFound)
    }

    /// Apply all assignments in `update` to the user with the given id as a
    /// single transaction: load (propagating `NotFound`), update, commit.
    /// Nothing is committed on any failure. An empty update degenerates to
    /// the existence check.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::storage)?;

        let mut load = find_query(&UserFilter::new().id(id));
        let found = match load
            .build_query_as::<User>()
            .fetch_optional(&mut *tx)
            .await
        {
            Ok(found) => found,
            Err(e) => return Err(abort(tx, e).await),
        };
        if found.is_none() {
            if let Err(e) = tx.rollback().await {
                warn!(error = %e, "rollback after missing user failed");
            }
            return Err(DbError::NotFound);
        }

        if !update.is_empty() {
            let mut qb = update_query(id, update);
            if let Err(e) = qb.build().execute(&mut *tx).await {
                return Err(abort(tx, e).await);
            }
        }

        tx.commit().await.map_err(DbError::aborted)?;
        debug!(user_id = id, "user updated");
        Ok(())
    }
}

/// Roll back an open transaction and wrap the original failure.
async fn abort(tx: Transaction<'_, Postgres>, source: sqlx::Error) -> DbError {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
    DbError::aborted(source)
}

fn find_query(filter: &UserFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
    for (i, (field, value)) in filter.terms.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(field.column());
        match value {
            FilterValue::Null => {
                qb.push(" IS NULL");
            }
            FilterValue::Int(v) => {
                qb.push(" = ").push_bind(*v);
            }
            FilterValue::Text(v) => {
                qb.push(" = ").push_bind(v.clone());
            }
        }
    }
    qb.push(" ORDER BY id LIMIT 1");
    qb
}

fn update_query(id: i64, update: &UserUpdate) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut first = true;
    let mut assign = |qb: &mut QueryBuilder<'static, Postgres>, column: &str| {
        if !first {
            qb.push(", ");
        }
        first = false;
        qb.push(column);
        qb.push(" = ");
    };

    if let Some(email) = &update.email {
        assign(&mut qb, "email");
        qb.push_bind(email.clone());
    }
    if let Some(hash) = &update.hashed_password {
        assign(&mut qb, "hashed_password");
        qb.push_bind(hash.clone());
    }
    if let Some(session_id) = &update.session_id {
        assign(&mut qb, "session_id");
        qb.push_bind(session_id.clone());
    }
    if let Some(reset_token) = &update.reset_token {
        assign(&mut qb, "reset_token");
        qb.push_bind(reset_token.clone());
    }

    qb.push(" WHERE id = ").push_bind(id);
    qb
}
