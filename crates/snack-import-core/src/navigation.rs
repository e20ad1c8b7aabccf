use std::sync::Mutex;

use url::Url;

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Holds the redirect produced by a successful import until the caller is
/// in a position to show it (after the terminal has been restored).
#[derive(Debug, Default)]
pub struct RedirectSlot {
    website_url: Option<Url>,
    target: Mutex<Option<String>>,
}

impl RedirectSlot {
    pub fn new(website_url: Option<Url>) -> Self {
        let website_url = website_url.map(|mut url| {
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            url
        });

        Self {
            website_url,
            target: Mutex::new(None),
        }
    }

    pub fn take(&self) -> Option<String> {
        self.target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }

    fn resolve(&self, path: &str) -> String {
        let Some(base) = &self.website_url else {
            return path.to_string();
        };

        match base.join(path.trim_start_matches('/')) {
            Ok(url) => url.to_string(),
            Err(error) => {
                tracing::warn!(%base, path, "could not resolve redirect: {error}");
                path.to_string()
            }
        }
    }
}

impl Navigator for RedirectSlot {
    fn navigate(&self, path: &str) {
        let resolved = self.resolve(path);
        tracing::info!(redirect = %resolved, "redirecting to imported project");
        *self
            .target
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(resolved);
    }
}
