pub mod config;
pub mod csrf;
pub mod db;
pub mod deliverability;
pub mod environment;
pub mod errors;
pub mod form;
pub mod registrant;
pub mod routes;
pub mod templates;
pub mod workflow;
