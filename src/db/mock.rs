use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;

use crate::db::Db;
use crate::errors::BackendError;
use crate::registrant::{Insertion, NewRegistrant, Registrant};

#[derive(Default)]
pub(crate) struct MockDb {
    pub(crate) registrants: RwLock<Vec<Registrant>>,
    unavailable: bool,
}

impl MockDb {
    /// A database on which every call fails.
    pub fn unavailable() -> Self {
        MockDb {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.registrants.read().unwrap().len()
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable {
            Err(BackendError::Sqlx {
                source: sqlx::Error::PoolClosed,
            })
        } else {
            Ok(())
        }
    }
}

impl Db for MockDb {
    fn count_all(&self) -> BoxFuture<Result<i64, BackendError>> {
        async move {
            self.check_available()?;

            Ok(self.len() as i64)
        }
        .boxed()
    }

    fn insert_if_absent(
        &self,
        registrant: NewRegistrant,
    ) -> BoxFuture<Result<Insertion, BackendError>> {
        async move {
            self.check_available()?;

            let mut registrants = self.registrants.write().unwrap();

            if let Some(existing) = registrants
                .iter()
                .find(|r| r.phone_number == registrant.phone_number)
            {
                return Ok(Insertion::AlreadyExists(existing.clone()));
            }

            let id = registrants.len() as i64 + 1;
            let registrant = Registrant::new(id, OffsetDateTime::now_utc(), registrant);
            registrants.push(registrant.clone());

            Ok(Insertion::Inserted(registrant))
        }
        .boxed()
    }

    fn retrieve_by_phone_number(
        &self,
        phone_number: &str,
    ) -> BoxFuture<Result<Option<Registrant>, BackendError>> {
        let phone_number = phone_number.to_owned();

        async move {
            self.check_available()?;

            Ok(self
                .registrants
                .read()
                .unwrap()
                .iter()
                .find(|r| r.phone_number == phone_number)
                .cloned())
        }
        .boxed()
    }
}
