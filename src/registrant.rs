use serde::Serialize;
use time::OffsetDateTime;

/// A single registration in the database.
#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Registrant {
    /// The ID assigned by the database.
    pub id: i64,

    /// The first name provided.
    pub first_name: String,

    /// The last name provided.
    pub last_name: String,

    /// The email address provided.
    pub email: String,

    /// The street address provided, if any.
    pub address: Option<String>,

    /// The state provided, if any.
    pub state: Option<String>,

    /// The city provided, if any.
    pub city: Option<String>,

    /// The zip code provided, if any.
    pub zip: Option<i64>,

    /// The phone number provided. Unique across all registrants.
    pub phone_number: String,

    /// The number of tickets reserved.
    pub num_tickets: i64,

    /// The date and time the registration was stored.
    #[serde(with = "time::serde::timestamp")]
    pub date_added: OffsetDateTime,
}

impl Registrant {
    pub fn new(id: i64, date_added: OffsetDateTime, registrant: NewRegistrant) -> Self {
        let NewRegistrant {
            first_name,
            last_name,
            email,
            address,
            state,
            city,
            zip,
            phone_number,
            num_tickets,
        } = registrant;

        Registrant {
            id,
            first_name,
            last_name,
            email,
            address,
            state,
            city,
            zip,
            phone_number,
            num_tickets,
            date_added,
        }
    }
}

/// A validated registration that has not been stored yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRegistrant {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) address: Option<String>,
    pub(crate) state: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) zip: Option<i64>,
    pub(crate) phone_number: String,
    pub(crate) num_tickets: i64,
}

impl NewRegistrant {
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }
}

/// The result of inserting a registrant whose phone number may
/// already be taken.
#[derive(Clone, Debug, PartialEq)]
pub enum Insertion {
    /// A new row was written.
    Inserted(Registrant),

    /// A row with the same phone number already existed and was left
    /// untouched.
    AlreadyExists(Registrant),
}
