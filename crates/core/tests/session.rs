use aura_edit_core::error::Result;
use aura_edit_core::pipeline::{
    EditPayload, ImageBackend, InlineImage, ReplyPart, TRANSPORT_MESSAGE, VALIDATION_MESSAGE,
};
use aura_edit_core::prompt::suggest;
use aura_edit_core::ui::{Completion, TriggerRejected};
use aura_edit_core::{Config, EditPipeline, EditResult, FailureKind, GenerationStatus, Session, SourceFile};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

/// Backend that holds every call until the test releases it.
struct GatedBackend {
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

impl ImageBackend for GatedBackend {
    fn generate<'a>(
        &'a self,
        _api_key: &'a str,
        _payload: &'a EditPayload,
    ) -> BoxFuture<'a, Result<Vec<ReplyPart>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.gate.notified().await;
            Ok(vec![ReplyPart::InlineData(InlineImage {
                mime_type: "image/png".into(),
                data: "QUJD".into(),
            })])
        })
    }
}

/// Backend whose call panics inside the spawned task.
struct PanickingBackend {
    calls: Arc<AtomicUsize>,
}

impl ImageBackend for PanickingBackend {
    fn generate<'a>(
        &'a self,
        _api_key: &'a str,
        _payload: &'a EditPayload,
    ) -> BoxFuture<'a, Result<Vec<ReplyPart>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let reply: Option<Vec<ReplyPart>> = None;
            Ok(reply.expect("backend exploded"))
        })
    }
}

struct Harness {
    session: Session<GatedBackend>,
    gate: Arc<Notify>,
    calls: Arc<AtomicUsize>,
}

fn harness() -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = GatedBackend {
        gate: Arc::clone(&gate),
        calls: Arc::clone(&calls),
    };
    let config = Config::builder().with_api_key("test-key").build().unwrap();
    Harness {
        session: Session::new(EditPipeline::new(config, backend)),
        gate,
        calls,
    }
}

fn photos(n: usize) -> Vec<SourceFile> {
    (0..n)
        .map(|i| SourceFile::new(format!("p{i}.jpg"), "image/jpeg", vec![i as u8; 8]).unwrap())
        .collect()
}

#[tokio::test]
async fn selection_changes_reset_prompt_to_suggestion() {
    let Harness { mut session, .. } = harness();
    assert_eq!(session.select_files(photos(3)), 3);
    assert!(session.prompt().contains('3'));

    session.set_prompt("make it noir");
    assert_eq!(session.remove_file(0), 2);
    assert_eq!(session.prompt(), session.suggested_prompt());

    session.remove_file(0);
    session.remove_file(0);
    assert_eq!(session.prompt(), "");
    assert!(!session.can_generate());
}

#[tokio::test]
async fn second_trigger_while_in_flight_is_rejected() {
    let Harness { mut session, gate, calls } = harness();
    session.select_files(photos(2));

    session.generate().unwrap();
    assert_eq!(session.status(), GenerationStatus::InFlight);
    assert!(!session.can_generate());
    assert_eq!(session.generate(), Err(TriggerRejected::InFlight));

    gate.notify_one();
    let result = session.wait().await.cloned();
    assert_eq!(
        result,
        Some(EditResult::Success {
            image_data_uri: "data:image/png;base64,QUJD".into()
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.status(), GenerationStatus::Succeeded);
    assert_eq!(session.result_image(), Some("data:image/png;base64,QUJD"));

    // A new attempt clears the previous outcome before starting
    session.generate().unwrap();
    assert!(session.outcome().is_none());
    gate.notify_one();
    session.wait().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_trigger_records_failure_without_a_call() {
    let Harness { mut session, calls, .. } = harness();
    assert_eq!(session.generate(), Err(TriggerRejected::Invalid));
    assert_eq!(session.status(), GenerationStatus::Failed);
    assert_eq!(session.error_message(), Some(VALIDATION_MESSAGE));

    session.select_files(photos(1));
    session.set_prompt("");
    assert_eq!(session.generate(), Err(TriggerRejected::Invalid));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn result_after_teardown_is_discarded() {
    let Harness { mut session, gate, .. } = harness();
    session.select_files(photos(2));
    let request_id = session.generate().unwrap();

    session.teardown();
    assert_eq!(session.uploads().registry().live_count(), 0);

    gate.notify_one();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!session.poll());
    assert!(session.outcome().is_none());

    let late = Completion {
        request_id,
        result: EditResult::Success {
            image_data_uri: "data:image/png;base64,QUJD".into(),
        },
    };
    assert!(!session.apply(late));
    assert!(session.outcome().is_none());
    assert_eq!(session.generate(), Err(TriggerRejected::TornDown));
}

#[tokio::test]
async fn dismissing_result_returns_to_idle() {
    let Harness { mut session, gate, .. } = harness();
    session.select_files(photos(1));
    session.generate().unwrap();
    gate.notify_one();
    session.wait().await;

    session.dismiss_result();
    assert_eq!(session.status(), GenerationStatus::Idle);
    assert!(session.result_image().is_none());
}

#[tokio::test]
async fn missing_credential_surfaces_as_configuration_failure() {
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = GatedBackend {
        gate,
        calls: Arc::clone(&calls),
    };
    let config = Config::builder().build().unwrap();
    let mut session = Session::new(EditPipeline::new(config, backend));
    session.select_files(photos(1));

    session.generate().unwrap();
    match session.wait().await {
        Some(EditResult::Failure { failure, .. }) => {
            assert_eq!(*failure, FailureKind::Configuration)
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.status(), GenerationStatus::Failed);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn panicked_request_ends_as_transport_failure() {
    let calls = Arc::new(AtomicUsize::new(0));
    let backend = PanickingBackend {
        calls: Arc::clone(&calls),
    };
    let config = Config::builder().with_api_key("test-key").build().unwrap();
    let mut session = Session::new(EditPipeline::new(config, backend));
    session.select_files(photos(2));

    session.generate().unwrap();
    let outcome = timeout(Duration::from_secs(2), session.wait())
        .await
        .expect("wait must finish when the task dies")
        .cloned();
    assert_eq!(
        outcome,
        Some(EditResult::Failure {
            failure: FailureKind::Transport,
            message: TRANSPORT_MESSAGE.into(),
        })
    );
    assert_eq!(session.status(), GenerationStatus::Failed);
    assert!(session.can_generate());

    session.generate().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn panicked_request_is_reported_by_poll() {
    let backend = PanickingBackend {
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let config = Config::builder().with_api_key("test-key").build().unwrap();
    let mut session = Session::new(EditPipeline::new(config, backend));
    session.select_files(photos(1));
    session.generate().unwrap();

    let mut applied = false;
    for _ in 0..50 {
        tokio::task::yield_now().await;
        if session.poll() {
            applied = true;
            break;
        }
    }
    assert!(applied);
    assert_eq!(session.error_message(), Some(TRANSPORT_MESSAGE));
}

#[tokio::test]
async fn torn_down_session_ignores_edits() {
    let Harness { mut session, .. } = harness();
    session.select_files(photos(2));
    session.teardown();

    assert_eq!(session.select_files(photos(3)), 0);
    assert_eq!(session.remove_file(0), 0);
    session.set_prompt("late edit");

    assert!(session.uploads().is_empty());
    assert_eq!(session.uploads().registry().allocated(), 2);
    assert_eq!(session.prompt(), suggest(2));
    assert!(!session.can_generate());
}
