use std::sync::Arc;

use anyhow::Result;
use snack_import_core::config::EffectiveConfig;
use snack_import_core::navigation::RedirectSlot;
use snack_import_core::request::ManualFields;
use snack_import_core::workflow::WorkflowEvent;
use thiserror::Error;

use crate::App;
use crate::session::Resolution;

/// What the user typed, in either form mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportInput {
    Url(String),
    Manual(ManualFields),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub path: String,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("import failed; make sure the repository is public and the URL is correct")]
    Failed,
    #[error("import was abandoned before it finished")]
    Abandoned,
}

impl App {
    /// Runs a single attempt to completion without a UI. Validation problems
    /// surface as `SubmitError`; anything after submission is deliberately
    /// reported without detail.
    pub fn import(&self, config: &EffectiveConfig, input: &ImportInput) -> Result<ImportResult> {
        let redirects = Arc::new(RedirectSlot::new(config.website_url.clone()));
        let mut session = self.open_session(config, redirects.clone());

        for event in form_events(input) {
            session.dispatch(event)?;
        }
        session.dispatch(WorkflowEvent::Submit)?;

        match session.wait_for_resolution() {
            Some(Resolution::Succeeded { path }) => {
                let link = redirects.take().unwrap_or_else(|| path.clone());
                Ok(ImportResult { path, link })
            }
            Some(Resolution::Failed) => Err(ImportError::Failed.into()),
            Some(Resolution::Abandoned) | None => Err(ImportError::Abandoned.into()),
        }
    }
}

fn form_events(input: &ImportInput) -> Vec<WorkflowEvent> {
    let mut events = vec![WorkflowEvent::Show];
    match input {
        ImportInput::Url(url) => events.push(WorkflowEvent::EditUrl(url.clone())),
        ImportInput::Manual(fields) => {
            events.push(WorkflowEvent::ToggleAdvanced);
            events.push(WorkflowEvent::EditRepo(fields.repo.clone()));
            events.push(WorkflowEvent::EditSubpath(fields.subpath.clone()));
            events.push(WorkflowEvent::EditBranch(fields.branch.clone()));
        }
    }
    events
}
