use serde::Serialize;

use crate::form::{FieldErrors, NameForm, RegistrationForm};
use crate::workflow::Outcome;

pub const REGISTRATION_SUBMITTED: &str = "Registration Submitted!";
pub const ALREADY_REGISTERED: &str = "You are already registered!";

const INDEX_TITLE: &str = "Event Registration";
const TESTING_TITLE: &str = "Testing";
const THANKS_TITLE: &str = "Thanks";

/// What the registration page is rendered from.
#[derive(Debug, Serialize)]
pub struct IndexPage {
    title: &'static str,
    message: Option<&'static str>,
    first_name: Option<String>,
    already_registered: Option<ExistingRegistration>,
    errors: FieldErrors,
    csrf_token: String,
    form: RegistrationForm,
}

#[derive(Debug, Serialize)]
pub struct ExistingRegistration {
    first_name: String,
    id: i64,
}

impl IndexPage {
    pub fn blank(csrf_token: String) -> Self {
        Self {
            title: INDEX_TITLE,
            message: None,
            first_name: None,
            already_registered: None,
            errors: FieldErrors::default(),
            csrf_token,
            form: RegistrationForm::default(),
        }
    }

    /// A successful registration gets a new, empty form; the other
    /// outcomes show the submitted values again.
    pub fn from_outcome(outcome: Outcome, csrf_token: String) -> Self {
        let page = Self::blank(csrf_token);

        match outcome {
            Outcome::Rejected { form, errors } => Self {
                errors,
                form,
                ..page
            },
            Outcome::AlreadyRegistered { form, existing } => Self {
                message: Some(ALREADY_REGISTERED),
                already_registered: Some(ExistingRegistration {
                    first_name: existing.first_name,
                    id: existing.id,
                }),
                form,
                ..page
            },
            Outcome::Registered(registrant) => Self {
                message: Some(REGISTRATION_SUBMITTED),
                first_name: Some(registrant.first_name),
                ..page
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TestingPage {
    title: &'static str,
    name: Option<String>,
    errors: FieldErrors,
    csrf_token: String,
    form: NameForm,
}

impl TestingPage {
    pub fn blank(csrf_token: String) -> Self {
        Self {
            title: TESTING_TITLE,
            name: None,
            errors: FieldErrors::default(),
            csrf_token,
            form: NameForm::default(),
        }
    }

    pub fn greeting(name: String, csrf_token: String) -> Self {
        Self {
            name: Some(name),
            ..Self::blank(csrf_token)
        }
    }

    pub fn rejected(form: NameForm, errors: FieldErrors, csrf_token: String) -> Self {
        Self {
            errors,
            form,
            ..Self::blank(csrf_token)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThanksPage {
    title: &'static str,
    name: String,
}

impl ThanksPage {
    pub fn new(name: String) -> Self {
        Self {
            title: THANKS_TITLE,
            name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorPage {
    title: &'static str,
    status: u16,
    message: String,
}

impl ErrorPage {
    pub fn new(status: u16, message: String) -> Self {
        Self {
            title: "Error",
            status,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SuccessResponse<'a> {
    Healthz {
        revision: Option<&'a str>,
        timestamp: Option<&'a str>,
        version: &'a str,
    },
}

#[cfg(test)]
mod tests {
    use serde_json::{json, to_value};
    use time::OffsetDateTime;

    use super::*;
    use crate::form::{Field, INVALID_TICKET_AMOUNT};
    use crate::registrant::Registrant;

    fn ada() -> Registrant {
        Registrant {
            id: 7,
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            address: None,
            state: None,
            city: None,
            zip: None,
            phone_number: "5551234567".to_owned(),
            num_tickets: 3,
            date_added: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn submitted() -> RegistrationForm {
        RegistrationForm {
            first_name: "Augusta".to_owned(),
            phone_number: "5551234567".to_owned(),
            csrf_token: "secret".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn registration_clears_the_form() {
        let page = IndexPage::from_outcome(Outcome::Registered(ada()), "token".to_owned());
        let value = to_value(&page).expect("serialize page");

        assert_eq!(value["message"], json!(REGISTRATION_SUBMITTED));
        assert_eq!(value["first_name"], json!("Ada"));
        assert_eq!(value["form"]["first_name"], json!(""));
        assert_eq!(value["csrf_token"], json!("token"));
    }

    #[test]
    fn already_registered_names_the_existing_registrant() {
        let outcome = Outcome::AlreadyRegistered {
            form: submitted(),
            existing: ada(),
        };
        let value = to_value(&IndexPage::from_outcome(outcome, "token".to_owned()))
            .expect("serialize page");

        assert_eq!(value["message"], json!(ALREADY_REGISTERED));
        assert_eq!(
            value["already_registered"],
            json!({"first_name": "Ada", "id": 7})
        );
        assert_eq!(value["form"]["first_name"], json!("Augusta"));
        assert_eq!(value["first_name"], json!(null));
    }

    #[test]
    fn rejection_keeps_values_and_hides_the_submitted_token() {
        let mut errors = FieldErrors::default();
        errors.insert(Field::NumTickets, INVALID_TICKET_AMOUNT);

        let outcome = Outcome::Rejected {
            form: submitted(),
            errors,
        };
        let value = to_value(&IndexPage::from_outcome(outcome, "fresh".to_owned()))
            .expect("serialize page");

        assert_eq!(value["errors"]["num_tickets"], json!(INVALID_TICKET_AMOUNT));
        assert_eq!(value["form"]["phone_number"], json!("5551234567"));
        assert!(value["form"].get("csrf_token").is_none());
        assert_eq!(value["csrf_token"], json!("fresh"));
    }
}
