use std::path::PathBuf;
use std::sync::Arc;

use slog::Logger;

use crate::csrf::CsrfKey;
use crate::db::Db;
use crate::deliverability::DomainChecker;
use crate::templates::Templates;

/// Everything a request handler needs, constructed once at startup
/// and cloned into every route.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub templates: Arc<Templates>,
    pub csrf: Arc<CsrfKey>,
    pub checker: Arc<DomainChecker>,
    pub config: Config,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        templates: Arc<Templates>,
        csrf: Arc<CsrfKey>,
        checker: Arc<DomainChecker>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            templates,
            csrf,
            checker,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) static_dir: PathBuf,
}

impl Config {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }

    pub fn favicon_path(&self) -> PathBuf {
        self.static_dir.join("favicon.ico")
    }
}
