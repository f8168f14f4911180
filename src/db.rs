use futures::future::BoxFuture;

use crate::errors::BackendError;
use crate::registrant::{Insertion, NewRegistrant, Registrant};

#[cfg(test)]
pub(crate) mod mock;

pub trait Db {
    fn count_all(&self) -> BoxFuture<Result<i64, BackendError>>;

    /// Stores the registrant unless one with the same phone number
    /// exists, in which case the existing row is returned instead.
    /// The check and the write happen in one statement.
    fn insert_if_absent(
        &self,
        registrant: NewRegistrant,
    ) -> BoxFuture<Result<Insertion, BackendError>>;

    fn retrieve_by_phone_number(
        &self,
        phone_number: &str,
    ) -> BoxFuture<Result<Option<Registrant>, BackendError>>;
}

pub use self::sqlite::*;

mod sqlite {
    use std::str::FromStr;

    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
    use time::OffsetDateTime;

    use crate::errors::BackendError;
    use crate::registrant::{Insertion, NewRegistrant, Registrant};

    pub struct SqliteDb {
        pool: SqlitePool,
    }

    impl SqliteDb {
        pub fn new(pool: SqlitePool) -> Self {
            SqliteDb { pool }
        }

        /// Opens a pool on the given database, creating the file if
        /// it does not exist yet.
        pub async fn connect(connection_string: &str) -> Result<Self, BackendError> {
            let options = SqliteConnectOptions::from_str(connection_string)
                .map_err(map_sqlx_error)?
                .create_if_missing(true);

            let pool = SqlitePoolOptions::new()
                .connect_with(options)
                .await
                .map_err(map_sqlx_error)?;

            Ok(Self::new(pool))
        }

        /// Applies any migrations that have not been run yet.
        pub async fn migrate(&self) -> Result<(), BackendError> {
            sqlx::migrate!()
                .run(&self.pool)
                .await
                .map_err(|source| BackendError::Migration { source })
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for SqliteDb {
        fn count_all(&self) -> BoxFuture<Result<i64, BackendError>> {
            async move {
                let query = sqlx::query_as::<_, (i64,)>(include_str!("queries/count.sql"));

                let (count,) = query.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;

                Ok(count)
            }
            .boxed()
        }

        fn insert_if_absent(
            &self,
            registrant: NewRegistrant,
        ) -> BoxFuture<Result<Insertion, BackendError>> {
            async move {
                let date_added = OffsetDateTime::now_utc();
                let query =
                    sqlx::query_as::<_, (i64,)>(include_str!("queries/insert_if_absent.sql"));

                let inserted = query
                    .bind(&registrant.first_name)
                    .bind(&registrant.last_name)
                    .bind(&registrant.email)
                    .bind(&registrant.address)
                    .bind(&registrant.state)
                    .bind(&registrant.city)
                    .bind(registrant.zip)
                    .bind(&registrant.phone_number)
                    .bind(registrant.num_tickets)
                    .bind(date_added)
                    // reads every row so the statement, and its commit, completes
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                match inserted.into_iter().next() {
                    Some((id,)) => Ok(Insertion::Inserted(Registrant::new(
                        id, date_added, registrant,
                    ))),
                    None => {
                        // rows are never deleted, so the conflicting row is still there
                        let existing = retrieve_by_phone_number(&self.pool, &registrant.phone_number)
                            .await?
                            .ok_or_else(|| BackendError::MissingRegistrant {
                                phone_number: registrant.phone_number.clone(),
                            })?;

                        Ok(Insertion::AlreadyExists(existing))
                    }
                }
            }
            .boxed()
        }

        fn retrieve_by_phone_number(
            &self,
            phone_number: &str,
        ) -> BoxFuture<Result<Option<Registrant>, BackendError>> {
            let phone_number = phone_number.to_owned();

            async move { retrieve_by_phone_number(&self.pool, &phone_number).await }.boxed()
        }
    }

    async fn retrieve_by_phone_number(
        pool: &SqlitePool,
        phone_number: &str,
    ) -> Result<Option<Registrant>, BackendError> {
        let query = sqlx::query_as::<_, Registrant>(include_str!(
            "queries/retrieve_by_phone_number.sql"
        ));

        let registrant = query
            .bind(phone_number)
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(registrant)
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        BackendError::Sqlx { source: error }
    }
}
