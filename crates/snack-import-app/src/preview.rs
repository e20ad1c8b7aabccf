use snack_import_core::repo_ref::{self, RepoReference};
use snack_import_core::request::{ImportRequest, RequestError};
use url::Url;

/// What an import of `raw_url` would send, without sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPreview {
    pub reference: RepoReference,
    pub request: Result<ImportRequest, RequestError>,
    pub endpoint: Option<Url>,
}

impl ImportPreview {
    pub fn build(raw_url: &str, service_url: Option<&Url>) -> Self {
        let reference = repo_ref::parse(raw_url);
        let request = ImportRequest::from_reference(&reference);
        let endpoint = match (&request, service_url) {
            (Ok(request), Some(base)) => Some(request.endpoint(base)),
            _ => None,
        };

        Self {
            reference,
            request,
            endpoint,
        }
    }
}
