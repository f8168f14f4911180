//! Submitted forms and the rules they are checked against.
//!
//! Forms hold the raw text of every field so that a rejected
//! submission can be shown again exactly as it was typed. Checking a
//! form never stops at the first problem; every failing field gets its
//! own message.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::registrant::NewRegistrant;

pub const FIRST_NAME_REQUIRED: &str = "Enter Your First Name";
pub const LAST_NAME_REQUIRED: &str = "Enter Your Last Name";
pub const INVALID_EMAIL: &str = "Invalid Email!";
pub const INVALID_PHONE_NUMBER: &str = "Invalid Phone Number!";
pub const INVALID_TICKET_AMOUNT: &str = "Invalid Ticket Amount!";
pub const INVALID_INTEGER: &str = "Not a valid integer value.";
pub const FIELD_REQUIRED: &str = "This field is required.";

pub const PHONE_NUMBER_LENGTH: RangeInclusive<usize> = 7..=16;
pub const TICKET_AMOUNT: RangeInclusive<i64> = 1..=20;

/// Domains reserved for special use, which can never receive mail.
const SPECIAL_USE_DOMAINS: &[&str] = &["arpa", "invalid", "local", "localhost", "onion", "test"];

/// A form field that can carry an error message.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Zip,
    PhoneNumber,
    NumTickets,
    Name,
    CsrfToken,
}

/// One message per failing field.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    /// Records `message` for `field` unless the field already has one.
    pub fn insert(&mut self, field: Field, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }
}

/// The registration form as submitted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub zip: String,
    pub phone_number: String,
    pub num_tickets: String,

    /// The request-forgery token echoed back by the browser.
    #[serde(skip_serializing)]
    pub csrf_token: String,
}

impl RegistrationForm {
    /// Checks every field, producing the registrant to store or the
    /// full set of violations.
    ///
    /// Whether the email domain can receive mail is not checked here;
    /// see [`crate::deliverability`].
    pub fn validate(&self) -> Result<NewRegistrant, FieldErrors> {
        let mut errors = FieldErrors::default();

        let first_name = required(&self.first_name);
        if first_name.is_none() {
            errors.insert(Field::FirstName, FIRST_NAME_REQUIRED);
        }

        let last_name = required(&self.last_name);
        if last_name.is_none() {
            errors.insert(Field::LastName, LAST_NAME_REQUIRED);
        }

        let email = self.email_domain().map(|_| self.email.clone());
        if email.is_none() {
            errors.insert(Field::Email, INVALID_EMAIL);
        }

        let phone_number = required(&self.phone_number)
            .filter(|p| PHONE_NUMBER_LENGTH.contains(&p.chars().count()));
        if phone_number.is_none() {
            errors.insert(Field::PhoneNumber, INVALID_PHONE_NUMBER);
        }

        let num_tickets = parse_integer(&self.num_tickets).filter(|n| TICKET_AMOUNT.contains(n));
        if num_tickets.is_none() {
            errors.insert(Field::NumTickets, INVALID_TICKET_AMOUNT);
        }

        let zip = match optional(&self.zip) {
            Some(zip) => match parse_integer(&zip) {
                Some(zip) => Some(zip),
                None => {
                    errors.insert(Field::Zip, INVALID_INTEGER);
                    None
                }
            },
            None => None,
        };

        match (first_name, last_name, email, phone_number, num_tickets) {
            (Some(first_name), Some(last_name), Some(email), Some(phone_number), Some(num_tickets))
                if errors.is_empty() =>
            {
                Ok(NewRegistrant {
                    first_name: first_name.to_owned(),
                    last_name: last_name.to_owned(),
                    email,
                    address: optional(&self.address),
                    state: optional(&self.state),
                    city: optional(&self.city),
                    zip,
                    phone_number: phone_number.to_owned(),
                    num_tickets,
                })
            }
            _ => Err(errors),
        }
    }

    /// Returns the domain of the email address if the address is
    /// syntactically acceptable.
    pub fn email_domain(&self) -> Option<&str> {
        let email = required(&self.email)?;

        if !validator::validate_email(email) {
            return None;
        }

        let (_, domain) = email.rsplit_once('@')?;
        let domain = domain.trim_end_matches('.');

        if !domain.contains('.') {
            return None;
        }

        let top_level = domain.rsplit('.').next()?.to_ascii_lowercase();

        if SPECIAL_USE_DOMAINS.contains(&top_level.as_str()) {
            return None;
        }

        Some(domain)
    }
}

/// The single-field demonstration form.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct NameForm {
    pub name: String,

    #[serde(skip_serializing)]
    pub csrf_token: String,
}

impl NameForm {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        match required(&self.name) {
            Some(name) => Ok(name.to_owned()),
            None => {
                let mut errors = FieldErrors::default();
                errors.insert(Field::Name, FIELD_REQUIRED);
                Err(errors)
            }
        }
    }
}

/// Returns the value if it has anything besides whitespace.
fn required(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn optional(value: &str) -> Option<String> {
    required(value).map(str::to_owned)
}

fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ada() -> RegistrationForm {
        RegistrationForm {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            phone_number: "5551234567".to_owned(),
            num_tickets: "3".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_produces_registrant() {
        let registrant = ada().validate().expect("validate form");

        assert_eq!(registrant.first_name, "Ada");
        assert_eq!(registrant.last_name, "Lovelace");
        assert_eq!(registrant.email, "ada@example.com");
        assert_eq!(registrant.phone_number, "5551234567");
        assert_eq!(registrant.num_tickets, 3);
        assert_eq!(registrant.address, None);
        assert_eq!(registrant.zip, None);
    }

    #[test]
    fn empty_form_reports_every_required_field() {
        let errors = RegistrationForm::default()
            .validate()
            .expect_err("reject empty form");

        assert_eq!(errors.get(Field::FirstName), Some(FIRST_NAME_REQUIRED));
        assert_eq!(errors.get(Field::LastName), Some(LAST_NAME_REQUIRED));
        assert_eq!(errors.get(Field::Email), Some(INVALID_EMAIL));
        assert_eq!(errors.get(Field::PhoneNumber), Some(INVALID_PHONE_NUMBER));
        assert_eq!(errors.get(Field::NumTickets), Some(INVALID_TICKET_AMOUNT));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn whitespace_does_not_satisfy_required_fields() {
        let form = RegistrationForm {
            first_name: "   ".to_owned(),
            last_name: "\t".to_owned(),
            ..ada()
        };

        let errors = form.validate().expect_err("reject blank names");

        assert!(errors.contains(Field::FirstName));
        assert!(errors.contains(Field::LastName));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn ticket_amount_must_be_in_range() {
        for amount in &["0", "21", "25", "-3", "three", "2.5", ""] {
            let form = RegistrationForm {
                num_tickets: (*amount).to_owned(),
                ..ada()
            };

            let errors = form.validate().expect_err("reject ticket amount");
            assert_eq!(errors.get(Field::NumTickets), Some(INVALID_TICKET_AMOUNT), "{:?}", amount);
        }

        let form = RegistrationForm {
            num_tickets: " 20 ".to_owned(),
            ..ada()
        };
        assert_eq!(form.validate().expect("accept 20").num_tickets, 20);
    }

    #[test]
    fn phone_number_length_is_bounded() {
        let short = RegistrationForm {
            phone_number: "555123".to_owned(),
            ..ada()
        };
        let long = RegistrationForm {
            phone_number: "55512345678901234".to_owned(),
            ..ada()
        };
        let shortest = RegistrationForm {
            phone_number: "5551234".to_owned(),
            ..ada()
        };

        assert!(short.validate().expect_err("reject short").contains(Field::PhoneNumber));
        assert!(long.validate().expect_err("reject long").contains(Field::PhoneNumber));
        assert_eq!(shortest.validate().expect("accept 7").phone_number, "5551234");
    }

    #[test]
    fn phone_number_is_stored_verbatim() {
        let form = RegistrationForm {
            phone_number: "(555) 123-4567".to_owned(),
            ..ada()
        };

        assert_eq!(form.validate().expect("accept").phone_number, "(555) 123-4567");
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in &[
            "",
            "ada",
            "ada@",
            "@example.com",
            "ada@localhost",
            "ada@example.test",
            "ada@host.invalid",
            "ada lovelace@example.com",
        ] {
            let form = RegistrationForm {
                email: (*email).to_owned(),
                ..ada()
            };

            let errors = form.validate().expect_err("reject email");
            assert_eq!(errors.get(Field::Email), Some(INVALID_EMAIL), "{:?}", email);
        }
    }

    #[test]
    fn email_domain_is_extracted() {
        assert_eq!(ada().email_domain(), Some("example.com"));
    }

    #[test]
    fn optional_fields_are_kept_when_present() {
        let form = RegistrationForm {
            address: "12 St James's Square".to_owned(),
            state: "".to_owned(),
            city: "London".to_owned(),
            zip: " 02134 ".to_owned(),
            ..ada()
        };

        let registrant = form.validate().expect("validate form");

        assert_eq!(registrant.address.as_deref(), Some("12 St James's Square"));
        assert_eq!(registrant.state, None);
        assert_eq!(registrant.city.as_deref(), Some("London"));
        assert_eq!(registrant.zip, Some(2134));
    }

    #[test]
    fn non_numeric_zip_is_rejected() {
        let form = RegistrationForm {
            zip: "SW1Y".to_owned(),
            ..ada()
        };

        let errors = form.validate().expect_err("reject zip");

        assert_eq!(errors.get(Field::Zip), Some(INVALID_INTEGER));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn first_message_for_a_field_wins() {
        let mut errors = FieldErrors::default();
        errors.insert(Field::Email, INVALID_EMAIL);
        errors.insert(Field::Email, FIELD_REQUIRED);

        assert_eq!(errors.get(Field::Email), Some(INVALID_EMAIL));
    }

    #[test]
    fn errors_serialize_by_field_name() {
        let mut errors = FieldErrors::default();
        errors.insert(Field::NumTickets, INVALID_TICKET_AMOUNT);

        let json = serde_json::to_value(&errors).expect("serialize errors");

        assert_eq!(json["num_tickets"], INVALID_TICKET_AMOUNT);
    }

    #[test]
    fn name_form_requires_a_name() {
        let errors = NameForm::default().validate().expect_err("reject empty name");
        assert_eq!(errors.get(Field::Name), Some(FIELD_REQUIRED));

        let form = NameForm {
            name: "Ada".to_owned(),
            ..Default::default()
        };
        assert_eq!(form.validate().expect("accept name"), "Ada");
    }

    proptest! {
        #[test]
        fn any_ticket_amount_in_range_is_accepted(amount in 1i64..=20) {
            let form = RegistrationForm { num_tickets: amount.to_string(), ..ada() };

            prop_assert_eq!(form.validate().map(|r| r.num_tickets), Ok(amount));
        }

        #[test]
        fn any_ticket_amount_out_of_range_is_rejected(amount in prop_oneof![i64::MIN..1i64, 21i64..i64::MAX]) {
            let form = RegistrationForm { num_tickets: amount.to_string(), ..ada() };
            let errors = form.validate().expect_err("reject ticket amount");

            prop_assert_eq!(errors.get(Field::NumTickets), Some(INVALID_TICKET_AMOUNT));
            prop_assert_eq!(errors.len(), 1);
        }

        #[test]
        fn phone_numbers_are_accepted_by_length(phone_number in "[0-9+() -]{1,24}") {
            let form = RegistrationForm { phone_number: phone_number.clone(), ..ada() };
            let acceptable = !phone_number.trim().is_empty()
                && PHONE_NUMBER_LENGTH.contains(&phone_number.chars().count());

            prop_assert_eq!(form.validate().is_ok(), acceptable);
        }
    }
}
