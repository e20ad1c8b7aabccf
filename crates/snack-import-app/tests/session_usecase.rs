mod support;

use std::sync::Arc;
use std::time::Duration;

use snack_import_app::{ImportSession, Resolution, SystemAttemptRunner};
use snack_import_core::import_client::{FailureKind, ImportFailure};
use snack_import_core::telemetry::CompletionReason;
use snack_import_core::workflow::{
    SubmitError, WorkflowEvent, WorkflowSettings, WorkflowStatus,
};

use support::{QueueImportClient, RecordingNavigator, RecordingTelemetry, ScriptedRunner, service_url};

const LOVE_LANGUAGES: &str = "https://github.com/ide/love-languages/tree/master/example/app";

struct Harness {
    runner: Arc<ScriptedRunner>,
    telemetry: Arc<RecordingTelemetry>,
    navigator: Arc<RecordingNavigator>,
    session: ImportSession,
}

fn scripted_session(settings: WorkflowSettings) -> Harness {
    let runner = Arc::new(ScriptedRunner::default());
    let telemetry = Arc::new(RecordingTelemetry::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let session = ImportSession::new(
        settings,
        runner.clone(),
        telemetry.clone(),
        navigator.clone(),
    );

    Harness {
        runner,
        telemetry,
        navigator,
        session,
    }
}

fn configured() -> WorkflowSettings {
    WorkflowSettings {
        service_url: Some(service_url()),
        ..WorkflowSettings::default()
    }
}

fn submit(session: &mut ImportSession, url: &str) {
    session.dispatch(WorkflowEvent::Show).expect("show");
    session
        .dispatch(WorkflowEvent::EditUrl(url.to_string()))
        .expect("edit url");
    session.dispatch(WorkflowEvent::Submit).expect("submit");
}

#[test]
fn submit_sends_canonical_request_and_arms_timer() {
    let mut harness = scripted_session(configured());

    submit(&mut harness.session, LOVE_LANGUAGES);

    let endpoints = harness.runner.endpoints();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(
        endpoints[0].as_str(),
        "https://import.example.com/git?repo=https%3A%2F%2Fgithub.com%2Fide%2Flove-languages&subpath=example%2Fapp&branch=master"
    );
    assert_eq!(
        harness.runner.timer_durations(),
        vec![Duration::from_secs(45)]
    );
    assert_eq!(harness.session.status(), WorkflowStatus::Importing);
    assert!(harness.session.elapsed().is_some());
}

#[test]
fn response_before_timer_navigates_once() {
    let mut harness = scripted_session(configured());
    submit(&mut harness.session, LOVE_LANGUAGES);

    harness.runner.respond(0, Ok("@ide/love-languages".to_string()));
    harness.session.poll();
    harness.runner.elapse(0);
    harness.session.poll();

    assert_eq!(harness.navigator.paths(), vec!["/@ide/love-languages"]);
    assert_eq!(harness.telemetry.reasons(), vec![CompletionReason::Success]);
    assert_eq!(harness.session.status(), WorkflowStatus::Idle);
    assert_eq!(harness.session.workflow().fields().url, "");
}

#[test]
fn timer_before_response_fails_without_navigation() {
    let mut harness = scripted_session(configured());
    submit(&mut harness.session, LOVE_LANGUAGES);

    harness.runner.elapse(0);
    harness.runner.respond(0, Ok("@ide/love-languages".to_string()));
    harness.session.poll();

    assert!(harness.navigator.paths().is_empty());
    let events = harness.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, CompletionReason::Error);
    assert_eq!(events[0].failure, Some(FailureKind::Timeout));
    assert_eq!(harness.session.status(), WorkflowStatus::Error);
}

#[test]
fn retry_after_error_ignores_first_attempt_signals() {
    let mut harness = scripted_session(configured());
    submit(&mut harness.session, LOVE_LANGUAGES);
    harness
        .runner
        .respond(0, Err(ImportFailure::Status { status: 500 }));
    harness.session.poll();
    assert_eq!(harness.session.status(), WorkflowStatus::Error);

    harness
        .session
        .dispatch(WorkflowEvent::Submit)
        .expect("retry");
    harness.runner.elapse(0);
    harness.session.poll();
    assert_eq!(harness.session.status(), WorkflowStatus::Importing);

    harness.runner.respond(1, Ok("second".to_string()));
    harness.session.poll();

    let attempts = harness.runner.attempts();
    assert_ne!(attempts[0], attempts[1]);
    assert_eq!(harness.navigator.paths(), vec!["/second"]);
    assert_eq!(
        harness.telemetry.reasons(),
        vec![CompletionReason::Error, CompletionReason::Success]
    );
}

#[test]
fn missing_service_url_fails_submit_without_spawning() {
    let mut harness = scripted_session(WorkflowSettings::default());
    harness.session.dispatch(WorkflowEvent::Show).expect("show");
    harness
        .session
        .dispatch(WorkflowEvent::EditUrl(LOVE_LANGUAGES.to_string()))
        .expect("edit");

    let error = harness
        .session
        .dispatch(WorkflowEvent::Submit)
        .expect_err("submit should fail");

    assert_eq!(error, SubmitError::MissingConfiguration);
    assert!(harness.runner.endpoints().is_empty());
    assert!(harness.telemetry.events().is_empty());
}

#[test]
fn dropping_session_mid_import_reports_dismiss() {
    let harness = scripted_session(configured());
    let Harness {
        runner,
        telemetry,
        navigator,
        mut session,
    } = harness;
    submit(&mut session, LOVE_LANGUAGES);

    drop(session);
    runner.respond(0, Ok("late".to_string()));

    assert_eq!(telemetry.reasons(), vec![CompletionReason::Dismiss]);
    assert!(navigator.paths().is_empty());
}

#[test]
fn threaded_runner_resolves_with_service_response() {
    let client = Arc::new(QueueImportClient::new(vec![Ok("abc123\n".to_string())]));
    let telemetry = Arc::new(RecordingTelemetry::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let mut session = ImportSession::new(
        WorkflowSettings {
            timeout: Duration::from_secs(10),
            ..configured()
        },
        Arc::new(SystemAttemptRunner::new(client.clone())),
        telemetry.clone(),
        navigator.clone(),
    );

    submit(&mut session, "git@github.com:ide/love-languages.git");
    let resolution = session.wait_for_resolution();

    assert_eq!(
        resolution,
        Some(Resolution::Succeeded {
            path: "/abc123".to_string()
        })
    );
    assert_eq!(navigator.paths(), vec!["/abc123"]);
    assert_eq!(client.calls().len(), 1);
    assert_eq!(telemetry.reasons(), vec![CompletionReason::Success]);
}

#[test]
fn threaded_runner_times_out_slow_service() {
    let client = Arc::new(QueueImportClient::delayed(
        vec![Ok("too-late".to_string())],
        Duration::from_millis(500),
    ));
    let telemetry = Arc::new(RecordingTelemetry::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let mut session = ImportSession::new(
        WorkflowSettings {
            timeout: Duration::from_millis(20),
            ..configured()
        },
        Arc::new(SystemAttemptRunner::new(client)),
        telemetry.clone(),
        navigator.clone(),
    );

    submit(&mut session, LOVE_LANGUAGES);

    assert_eq!(session.wait_for_resolution(), Some(Resolution::Failed));
    std::thread::sleep(Duration::from_millis(600));
    assert!(session.poll().is_empty());
    assert!(navigator.paths().is_empty());
    assert_eq!(
        telemetry.events()[0].failure,
        Some(FailureKind::Timeout)
    );
}

#[test]
fn wait_without_attempt_returns_none() {
    let mut harness = scripted_session(configured());
    assert_eq!(harness.session.wait_for_resolution(), None);
}
