//! Checks whether an email domain can plausibly receive mail.
//!
//! A domain is undeliverable only when DNS says so outright: no MX
//! records and no A or AAAA records to fall back on. Timeouts and
//! resolver failures are not held against the domain.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use tokio::time::timeout;

/// Resolves a domain name, answering whether mail could be delivered
/// to it.
pub type DomainChecker = dyn Fn(String) -> BoxFuture<'static, bool> + Send + Sync;

/// How long to wait for the resolver before giving the domain the
/// benefit of the doubt.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// What a single lookup said about a domain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Answer {
    /// At least one record came back.
    Found,

    /// The name does not exist or has no records of this type.
    Missing,

    /// The lookup failed for some other reason.
    Unknown,
}

/// The DNS queries the checker needs.
pub trait Resolver: Send + Sync {
    fn mail_exchangers(&self, domain: &str) -> BoxFuture<'static, Answer>;

    fn addresses(&self, domain: &str) -> BoxFuture<'static, Answer>;
}

/// Queries the resolvers named in the system configuration.
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    pub fn from_system_conf() -> Result<Self, ResolveError> {
        Ok(Self {
            resolver: TokioAsyncResolver::tokio_from_system_conf()?,
        })
    }
}

impl Resolver for HickoryResolver {
    fn mail_exchangers(&self, domain: &str) -> BoxFuture<'static, Answer> {
        let resolver = self.resolver.clone();
        let domain = domain.to_owned();

        async move {
            let found = resolver.mx_lookup(domain.as_str()).await;
            answer(found.map(|records| records.iter().next().is_some()))
        }
        .boxed()
    }

    fn addresses(&self, domain: &str) -> BoxFuture<'static, Answer> {
        let resolver = self.resolver.clone();
        let domain = domain.to_owned();

        async move {
            let found = resolver.lookup_ip(domain.as_str()).await;
            answer(found.map(|addresses| addresses.iter().next().is_some()))
        }
        .boxed()
    }
}

fn answer(found: Result<bool, ResolveError>) -> Answer {
    match found {
        Ok(true) => Answer::Found,
        Ok(false) => Answer::Missing,
        Err(e) => match e.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Answer::Missing,
            _ => Answer::Unknown,
        },
    }
}

/// Returns a checker that asks `resolver` for MX records and then for
/// addresses, giving up after `limit`.
pub fn make_dns_checker(
    resolver: Arc<dyn Resolver>,
    limit: Duration,
) -> impl Fn(String) -> BoxFuture<'static, bool> + Send + Sync {
    move |domain: String| {
        let resolver = resolver.clone();

        async move {
            timeout(limit, accepts_mail(resolver.as_ref(), &domain))
                .await
                .unwrap_or(true)
        }
        .boxed()
    }
}

async fn accepts_mail(resolver: &dyn Resolver, domain: &str) -> bool {
    match resolver.mail_exchangers(domain).await {
        Answer::Found | Answer::Unknown => true,
        Answer::Missing => resolver.addresses(domain).await != Answer::Missing,
    }
}

/// Returns a checker that accepts every domain, for when lookups are
/// disabled.
pub fn make_permissive_checker() -> impl Fn(String) -> BoxFuture<'static, bool> + Send + Sync {
    |_domain: String| async { true }.boxed()
}
