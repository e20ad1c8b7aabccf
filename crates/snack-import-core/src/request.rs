use thiserror::Error;
use url::Url;

use crate::repo_ref::RepoReference;

/// Fields edited directly by the user in advanced mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualFields {
    pub repo: String,
    pub subpath: String,
    pub branch: String,
}

/// Canonical query for the import service. Absent `subpath`/`branch` tell
/// the service to use its defaults; they are never sent as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub repo: String,
    pub subpath: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("a repository URL is required")]
    MissingRepository,
}

impl ImportRequest {
    pub fn from_reference(reference: &RepoReference) -> Result<Self, RequestError> {
        let repo = reference
            .repository_url()
            .ok_or(RequestError::MissingRepository)?;

        Ok(Self {
            repo,
            subpath: non_empty(&reference.subpath),
            branch: non_empty(&reference.git_ref),
        })
    }

    pub fn from_fields(fields: &ManualFields) -> Result<Self, RequestError> {
        let repo = non_empty(&fields.repo).ok_or(RequestError::MissingRepository)?;

        Ok(Self {
            repo,
            subpath: non_empty(&fields.subpath),
            branch: non_empty(&fields.branch),
        })
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("repo", self.repo.as_str())];
        if let Some(subpath) = &self.subpath {
            pairs.push(("subpath", subpath.as_str()));
        }
        if let Some(branch) = &self.branch {
            pairs.push(("branch", branch.as_str()));
        }
        pairs
    }

    /// `<base>/git?repo=..[&subpath=..][&branch=..]`. Any path already on
    /// `base` is kept; existing query parameters are replaced.
    pub fn endpoint(&self, base: &Url) -> Url {
        let mut endpoint = base.clone();
        let path = format!("{}/git", base.path().trim_end_matches('/'));
        endpoint.set_path(&path);
        endpoint.set_fragment(None);
        endpoint
            .query_pairs_mut()
            .clear()
            .extend_pairs(self.query_pairs());
        endpoint
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
