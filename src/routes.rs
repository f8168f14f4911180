use slog::{debug, error};
use warp::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{self, PayloadTooLarge};
use warp::reply::{with_status, Reply};
use warp::Filter;

use crate::csrf::Session;
use crate::environment::Environment;
use crate::errors::BackendError;

pub mod admin;
mod handlers;
mod rejection;
mod response;

pub use internal::*;
pub use response::{ALREADY_REGISTERED, REGISTRATION_SUBMITTED};

/// The maximum form body to accept. The forms are a handful of short
/// text fields, so anything near this size is not a real submission.
pub const MAX_CONTENT_LENGTH: u64 = 64 * 1024;

const FAVICON_CONTENT_TYPE: &str = "image/vnd.microsoft.icon";

/// Every route on the main port, with failures turned into pages.
pub fn make_routes(environment: Environment) -> Route {
    let recovery_environment = environment.clone();

    make_index_route(environment.clone())
        .or(make_register_route(environment.clone()))
        .unify()
        .or(make_thanks_route(environment.clone()))
        .unify()
        .or(make_testing_route(environment.clone()))
        .unify()
        .or(make_testing_submission_route(environment.clone()))
        .unify()
        .or(make_favicon_route(environment.clone()))
        .unify()
        .or(make_static_route(environment))
        .unify()
        .recover(move |r| format_rejection(recovery_environment.clone(), r))
        .unify()
        .boxed()
}

pub async fn format_rejection(
    environment: Environment,
    rej: reject::Rejection,
) -> Result<Box<dyn Reply>, reject::Rejection> {
    let logger = &environment.logger;

    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        error!(logger, "Backend error"; "context" => ?r.context, "error" => ?r.error, "status" => %status_code_for(e), "message" => %r.error);

        return Ok(error_page(&environment, e));
    }

    if let Some(e) = rej.find::<BodyDeserializeError>() {
        debug!(logger, "Malformed form body"; "error" => %e);

        return Ok(error_page(&environment, &BackendError::MalformedFormSubmission));
    }

    if rej.find::<PayloadTooLarge>().is_some() {
        debug!(logger, "Form body over the size limit");

        return Ok(error_page(&environment, &BackendError::PayloadTooLarge));
    }

    if rej.is_not_found() {
        let session = Session::start();
        let page = response::IndexPage::blank(environment.csrf.issue(&session));

        return match handlers::render(&environment.templates, "index", &page, StatusCode::NOT_FOUND)
        {
            Ok(page) => Ok(handlers::with_session(page, &session)),
            Err(e) => {
                error!(logger, "Failed to render not-found page"; "error" => ?e);
                Ok(Box::new(StatusCode::NOT_FOUND))
            }
        };
    }

    Err(rej)
}

fn error_page(environment: &Environment, e: &BackendError) -> Box<dyn Reply> {
    let status = status_code_for(e);

    // internal details stay in the log
    let message = if status.is_server_error() {
        status.canonical_reason().unwrap_or("Error").to_owned()
    } else {
        e.to_string()
    };

    let page = response::ErrorPage::new(status.as_u16(), message);

    match handlers::render(&environment.templates, "error", &page, status) {
        Ok(page) => Box::new(page),
        Err(e) => {
            error!(environment.logger, "Failed to render error page"; "error" => ?e);
            Box::new(with_status(status.to_string(), status))
        }
    }
}

fn status_code_for(e: &BackendError) -> StatusCode {
    match e {
        BackendError::MalformedFormSubmission => StatusCode::BAD_REQUEST,
        BackendError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

mod internal {
    use warp::body::{content_length_limit, form};
    use warp::cookie::optional as cookie;
    use warp::filters::BoxedFilter;
    use warp::http::header::CONTENT_TYPE;
    use warp::path::end;
    use warp::reply::with_header;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, path::param as par, post};

    use super::{handlers, FAVICON_CONTENT_TYPE, MAX_CONTENT_LENGTH};
    use crate::csrf::SESSION_COOKIE;
    use crate::environment::Environment;
    use crate::form::{NameForm, RegistrationForm};

    pub type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                let $route_variable = warp::any().map(move || environment.clone());

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    route!(make_index_route => index, rt; end(), g(), cookie::<String>(SESSION_COOKIE));
    route!(make_register_route => register, rt; end(), post(), cookie::<String>(SESSION_COOKIE), content_length_limit(MAX_CONTENT_LENGTH), form::<RegistrationForm>());
    route!(make_thanks_route => thanks, rt; p("user"), par::<String>(), end(), g());
    route!(make_testing_route => testing, rt; p("testing"), end(), g(), cookie::<String>(SESSION_COOKIE));
    route!(make_testing_submission_route => testing_submission, rt; p("testing"), end(), post(), cookie::<String>(SESSION_COOKIE), content_length_limit(MAX_CONTENT_LENGTH), form::<NameForm>());

    pub fn make_favicon_route(environment: Environment) -> Route {
        p("favicon.ico")
            .and(end())
            .and(g())
            .and(warp::fs::file(environment.config.favicon_path()))
            .map(|file: warp::fs::File| {
                Box::new(with_header(file, CONTENT_TYPE, FAVICON_CONTENT_TYPE)) as Box<dyn Reply>
            })
            .boxed()
    }

    pub fn make_static_route(environment: Environment) -> Route {
        p("static")
            .and(g())
            .and(warp::fs::dir(environment.config.static_dir.clone()))
            .map(|file: warp::fs::File| Box::new(file) as Box<dyn Reply>)
            .boxed()
    }
}
