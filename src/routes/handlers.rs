use std::time::{Duration, Instant};

use serde::Serialize;
use slog::{debug, Logger};
use warp::{
    http::{header::SET_COOKIE, StatusCode},
    reject,
    reply::{html, with_header, with_status, Html, Reply, WithStatus},
};

use crate::csrf::{CsrfKey, Session};
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::form::{Field, FieldErrors, NameForm, RegistrationForm};
use crate::routes::{
    rejection::{Context, Rejection},
    response::{IndexPage, TestingPage, ThanksPage},
};
use crate::templates::Templates;
use crate::workflow::Workflow;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;
pub(crate) type Page = WithStatus<Html<String>>;

macro_rules! timed {
    ($($body:tt)+) => {{
        let start = Instant::now();

        let result = { $($body)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    }};
}

pub async fn index(environment: Environment, cookie: Option<String>) -> RouteResult {
    timed! {
        let session = Session::resume_or_start(cookie.as_deref());
        let page = IndexPage::blank(environment.csrf.issue(&session));

        let page = render(&environment.templates, "index", &page, StatusCode::OK)
            .map_err(|e| Rejection::new(Context::index(), e))?;

        with_session(page, &session)
    }
}

pub async fn register(
    environment: Environment,
    cookie: Option<String>,
    form: RegistrationForm,
) -> RouteResult {
    timed! {
        let error_handler = {
            let phone_number = form.phone_number.clone();
            move |e: BackendError| Rejection::new(Context::register(phone_number.clone()), e)
        };

        let errors = check_token(
            &environment.logger,
            &environment.csrf,
            &form.csrf_token,
            cookie.as_deref(),
        );
        let session = Session::resume_or_start(cookie.as_deref());

        let workflow = Workflow::new(
            &environment.logger,
            environment.db.as_ref(),
            environment.checker.as_ref(),
        );
        let outcome = workflow.submit(form, errors).await.map_err(&error_handler)?;

        let page = IndexPage::from_outcome(outcome, environment.csrf.issue(&session));

        let page =
            render(&environment.templates, "index", &page, StatusCode::OK).map_err(&error_handler)?;

        with_session(page, &session)
    }
}

pub async fn thanks(environment: Environment, name: String) -> RouteResult {
    timed! {
        let page = ThanksPage::new(name.clone());

        render(&environment.templates, "thanks", &page, StatusCode::OK)
            .map_err(|e| Rejection::new(Context::thanks(name), e))?
    }
}

pub async fn testing(environment: Environment, cookie: Option<String>) -> RouteResult {
    timed! {
        let session = Session::resume_or_start(cookie.as_deref());
        let page = TestingPage::blank(environment.csrf.issue(&session));

        let page = render(&environment.templates, "testing", &page, StatusCode::OK)
            .map_err(|e| Rejection::new(Context::testing(), e))?;

        with_session(page, &session)
    }
}

pub async fn testing_submission(
    environment: Environment,
    cookie: Option<String>,
    form: NameForm,
) -> RouteResult {
    timed! {
        let mut errors = check_token(
            &environment.logger,
            &environment.csrf,
            &form.csrf_token,
            cookie.as_deref(),
        );
        let session = Session::resume_or_start(cookie.as_deref());
        let csrf_token = environment.csrf.issue(&session);

        let page = match form.validate() {
            Ok(name) if errors.is_empty() => TestingPage::greeting(name, csrf_token),
            Ok(_) => TestingPage::rejected(form, errors, csrf_token),
            Err(field_errors) => {
                errors.merge(field_errors);
                TestingPage::rejected(form, errors, csrf_token)
            }
        };

        let page = render(&environment.templates, "testing", &page, StatusCode::OK)
            .map_err(|e| Rejection::new(Context::testing(), e))?;

        with_session(page, &session)
    }
}

pub(crate) fn render<T: Serialize>(
    templates: &Templates,
    name: &str,
    data: &T,
    status: StatusCode,
) -> Result<Page, BackendError> {
    let body = templates.render(name, data)?;

    Ok(with_status(html(body), status))
}

/// Hands a new session's cookie to the browser along with `reply`.
pub(crate) fn with_session<T: Reply + 'static>(reply: T, session: &Session) -> Box<dyn Reply> {
    match session.set_cookie() {
        Some(cookie) => Box::new(with_header(reply, SET_COOKIE, cookie)),
        None => Box::new(reply),
    }
}

/// Verifies the submitted request-forgery token against the session
/// cookie, reporting a failure as an error on the token field.
fn check_token(logger: &Logger, csrf: &CsrfKey, token: &str, session: Option<&str>) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if let Err(e) = csrf.verify(token, session) {
        debug!(logger, "Refusing request-forgery token"; "reason" => %e);
        errors.insert(Field::CsrfToken, e.message());
    }

    errors
}

fn format_server_timing(duration: Duration) -> String {
    format!("handler;dur={}", duration.as_secs_f64() * 1000.0)
}
