//! Shared request state.

use crate::config::{ErrorStatusPolicy, ServerConfig};
use crate::extract::Extractor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// State handed to every handler. Cloning shares the extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    extractor: Extractor,
    error_policy: ErrorStatusPolicy,
    temp_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(extractor: Extractor, config: &ServerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                extractor,
                error_policy: config.error_status,
                temp_dir: config.temp_dir.clone(),
            }),
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.inner.extractor
    }

    pub fn error_policy(&self) -> ErrorStatusPolicy {
        self.inner.error_policy
    }

    /// Directory for upload temp files; `None` means the system temp dir.
    pub fn temp_dir(&self) -> Option<&Path> {
        self.inner.temp_dir.as_deref()
    }
}
