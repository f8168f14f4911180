use warp::reject;

use crate::errors::BackendError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }
}

impl reject::Reject for Rejection {}

/// Which route failed, and on what input.
#[derive(Clone, Debug)]
pub enum Context {
    Index,
    Register { phone_number: String },
    Testing,
    Thanks { name: String },
}

impl Context {
    pub fn index() -> Context {
        Context::Index
    }

    pub fn register(phone_number: String) -> Context {
        Context::Register { phone_number }
    }

    pub fn testing() -> Context {
        Context::Testing
    }

    pub fn thanks(name: String) -> Context {
        Context::Thanks { name }
    }
}
