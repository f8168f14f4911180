//! The registration workflow: validate a submission, then store it
//! unless its phone number is already registered.
//!
//! A submission starts out `Received`. Any failing rule sends it to
//! `Rejected` without touching storage. Otherwise it is `Validated` and
//! handed to [`Db::insert_if_absent`], which either finds the phone
//! number taken (`AlreadyRegistered`) or checks and persists it in one
//! step (`Checked`, then `Persisted`).

use slog::{debug, info, o, Logger};

use crate::db::Db;
use crate::deliverability::DomainChecker;
use crate::errors::BackendError;
use crate::form::{Field, FieldErrors, RegistrationForm, INVALID_EMAIL};
use crate::registrant::{Insertion, Registrant};

/// Where a submission ended up.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// At least one rule failed. The submitted form is returned so it
    /// can be shown again.
    Rejected {
        form: RegistrationForm,
        errors: FieldErrors,
    },

    /// The phone number was already registered. Nothing was written.
    AlreadyRegistered {
        form: RegistrationForm,
        existing: Registrant,
    },

    /// A new registrant was stored.
    Registered(Registrant),
}

pub struct Workflow<'a> {
    logger: &'a Logger,
    db: &'a (dyn Db + Send + Sync),
    checker: &'a DomainChecker,
}

impl<'a> Workflow<'a> {
    pub fn new(
        logger: &'a Logger,
        db: &'a (dyn Db + Send + Sync),
        checker: &'a DomainChecker,
    ) -> Self {
        Self {
            logger,
            db,
            checker,
        }
    }

    /// Runs one submission through the workflow.
    ///
    /// `errors` holds problems the caller already found with the
    /// request, such as a bad request-forgery token; they are reported
    /// together with the field errors. Storage failures are returned
    /// as `Err` and never retried.
    pub async fn submit(
        &self,
        form: RegistrationForm,
        mut errors: FieldErrors,
    ) -> Result<Outcome, BackendError> {
        let validated = form.validate();

        let deliverable = match form.email_domain() {
            Some(domain) => {
                let domain = domain.to_owned();
                debug!(self.logger, "Checking email domain..."; "domain" => &domain);
                (self.checker)(domain).await
            }
            None => true,
        };

        if !deliverable {
            errors.insert(Field::Email, INVALID_EMAIL);
        }

        let registrant = match validated {
            Ok(registrant) if errors.is_empty() => registrant,
            Ok(_) => return Ok(self.reject(form, errors)),
            Err(field_errors) => {
                errors.merge(field_errors);
                return Ok(self.reject(form, errors));
            }
        };

        let logger = self
            .logger
            .new(o!("phone_number" => registrant.phone_number().to_owned()));

        debug!(logger, "Storing registrant...");
        let outcome = match self.db.insert_if_absent(registrant).await? {
            Insertion::Inserted(registrant) => {
                info!(logger, "Registered"; "id" => registrant.id, "num_tickets" => registrant.num_tickets);
                Outcome::Registered(registrant)
            }
            Insertion::AlreadyExists(existing) => {
                info!(logger, "Already registered"; "id" => existing.id);
                Outcome::AlreadyRegistered { form, existing }
            }
        };

        Ok(outcome)
    }

    fn reject(&self, form: RegistrationForm, errors: FieldErrors) -> Outcome {
        debug!(self.logger, "Rejected submission"; "errors" => errors.len());

        Outcome::Rejected { form, errors }
    }
}
