pub mod config;
pub mod doctor;
pub mod import_client;
pub mod navigation;
pub mod repo_ref;
pub mod request;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod test_support;
pub mod time;
pub mod workflow;
