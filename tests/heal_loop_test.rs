//! End-to-end healing loop tests: scripted runner, completion, and approval
//! ports around a real file-system store and real target files.

mod common;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use common::{
    auth_failure_run, detect_reply, fixture_failure_run, passing_run, strategy_reply,
    FailingStore, FixedApproval, ScriptedCompletion, ScriptedRunner,
};
use suture::application::SessionController;
use suture::domain::errors::HealResult;
use suture::domain::models::{DecisionMode, SafetyLevel, SessionOutcome};
use suture::domain::ports::{
    ApprovalDecision, CompletionClient, SessionStore, TestRunOutput, TestRunner,
};
use suture::infrastructure::store::FsSessionStore;

const BACKUP_SUFFIX: &str = ".heal-backup";
const ORIGINAL: &str = "{ \"rows\": 2 }\n";
const HEALED: &str = "{ \"rows\": 3 }\n";

/// Path the scripted failure frames point at. Kept relative and fixed so
/// safety-rule matching sees a stable string, independent of the temp dir.
const FRAME_PATH: &str = "web/tests/users.fixture.json";

/// A temp workspace holding one stale fixture file and a store root.
struct Scene {
    dir: tempfile::TempDir,
    fixture: PathBuf,
}

impl Scene {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("users.fixture.json");
        std::fs::write(&fixture, ORIGINAL).unwrap();
        Self { dir, fixture }
    }

    fn fixture_str(&self) -> String {
        self.fixture.display().to_string()
    }

    fn backup(&self) -> PathBuf {
        self.dir
            .path()
            .join(format!("users.fixture.json{BACKUP_SUFFIX}"))
    }

    fn store(&self) -> Arc<FsSessionStore> {
        Arc::new(FsSessionStore::new(self.dir.path().join(".suture")))
    }
}

fn controller(
    runner: Arc<ScriptedRunner>,
    approval: Arc<FixedApproval>,
    store: Arc<FsSessionStore>,
    replies: Vec<String>,
) -> SessionController {
    let completion: Option<Arc<dyn CompletionClient>> = if replies.is_empty() {
        None
    } else {
        Some(Arc::new(ScriptedCompletion::new(
            replies.iter().map(String::as_str).collect(),
        )))
    };
    SessionController::new(runner, approval, store, completion, BACKUP_SUFFIX)
}

#[tokio::test]
async fn test_auto_mode_heals_and_backs_up() {
    let scene = Scene::new();
    let runner = Arc::new(ScriptedRunner::new(vec![
        fixture_failure_run(FRAME_PATH),
        passing_run(),
    ]));
    // Rejecting approval proves the auto path never consults it.
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Reject));
    let store = scene.store();
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        Arc::clone(&store),
        vec![
            detect_reply(0.95),
            strategy_reply(&scene.fixture_str(), "{ \"rows\": 2 }", "{ \"rows\": 3 }"),
        ],
    );

    let session = ctrl.run(DecisionMode::Auto, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::Healed));
    assert_eq!(session.iteration, 1);
    assert_eq!(session.changes_applied(), 1);
    assert_eq!(runner.calls(), 2);
    assert_eq!(approval.calls(), 0);

    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), HEALED);
    assert_eq!(std::fs::read_to_string(scene.backup()).unwrap(), ORIGINAL);

    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].session_id, session.session_id);
    assert_eq!(listed[0].outcome, Some(SessionOutcome::Healed));
}

#[tokio::test]
async fn test_auto_mode_denies_dangerous_wording() {
    let scene = Scene::new();
    let runner = Arc::new(ScriptedRunner::new(vec![auth_failure_run()]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        scene.store(),
        vec![],
    );

    let session = ctrl.run(DecisionMode::Auto, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::ManualReviewRequired));
    assert!(session.applied_changes.is_empty());
    assert!(session.selected_strategy.is_none());
    assert_eq!(runner.calls(), 1, "a denied session never re-runs");
    assert_eq!(approval.calls(), 0);

    let assessment = &session.assessments[0];
    assert_eq!(assessment.level, SafetyLevel::Low);
    assert!(!assessment.auto_heal_allowed);
    assert_eq!(assessment.triggered_rules, vec!["auth-handling"]);
}

#[tokio::test]
async fn test_interactive_approval_applies_change() {
    let scene = Scene::new();
    let runner = Arc::new(ScriptedRunner::new(vec![
        fixture_failure_run(FRAME_PATH),
        passing_run(),
    ]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        scene.store(),
        vec![
            // Below the auto-heal gate; a human approval carries it anyway.
            detect_reply(0.6),
            strategy_reply(&scene.fixture_str(), "{ \"rows\": 2 }", "{ \"rows\": 3 }"),
        ],
    );

    let session = ctrl.run(DecisionMode::Interactive, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::Healed));
    assert_eq!(approval.calls(), 1);
    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), HEALED);
}

#[tokio::test]
async fn test_rejected_changes_exhaust_the_budget() {
    let scene = Scene::new();
    let fixture = scene.fixture_str();
    let runner = Arc::new(ScriptedRunner::new(vec![
        fixture_failure_run(FRAME_PATH),
        fixture_failure_run(FRAME_PATH),
        fixture_failure_run(FRAME_PATH),
    ]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Reject));
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        scene.store(),
        vec![
            detect_reply(0.95),
            strategy_reply(&fixture, "{ \"rows\": 2 }", "{ \"rows\": 3 }"),
            detect_reply(0.95),
            strategy_reply(&fixture, "{ \"rows\": 2 }", "{ \"rows\": 3 }"),
        ],
    );

    let session = ctrl.run(DecisionMode::Interactive, None, 2).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::MaxIterationsReached));
    assert_eq!(session.iteration, 2);
    assert_eq!(runner.calls(), 3);
    assert_eq!(approval.calls(), 2);

    assert_eq!(session.applied_changes.len(), 2);
    assert!(session.applied_changes.iter().all(|c| !c.success));
    assert!(session
        .applied_changes
        .iter()
        .all(|c| c.error.as_deref() == Some("rejected by reviewer")));

    // Nothing was ever written.
    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), ORIGINAL);
    assert!(!scene.backup().exists());
}

#[tokio::test]
async fn test_dry_run_reports_without_writing() {
    let scene = Scene::new();
    let runner = Arc::new(ScriptedRunner::new(vec![fixture_failure_run(FRAME_PATH)]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    let store = scene.store();
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        Arc::clone(&store),
        vec![
            detect_reply(0.95),
            strategy_reply(&scene.fixture_str(), "{ \"rows\": 2 }", "{ \"rows\": 3 }"),
        ],
    );

    let session = ctrl.run(DecisionMode::DryRun, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::DryRunComplete));
    assert!(session.selected_strategy.is_some());
    assert!(session.applied_changes.is_empty());
    assert_eq!(runner.calls(), 1);
    assert_eq!(approval.calls(), 0);
    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), ORIGINAL);
    assert!(!scene.backup().exists());

    // The report is still persisted for later inspection.
    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].outcome, Some(SessionOutcome::DryRunComplete));
}

/// Runner that fires the quit signal while the run is in flight, mimicking a
/// ctrl-c landing during the initial test execution.
struct CancellingRunner {
    inner: ScriptedRunner,
    quit: OnceLock<broadcast::Sender<()>>,
}

#[async_trait]
impl TestRunner for CancellingRunner {
    async fn run(&self, target: Option<&str>) -> HealResult<TestRunOutput> {
        if let Some(quit) = self.quit.get() {
            let _ = quit.send(());
        }
        self.inner.run(target).await
    }
}

#[tokio::test]
async fn test_quit_during_initial_run_cancels() {
    let scene = Scene::new();
    let runner = Arc::new(CancellingRunner {
        inner: ScriptedRunner::new(vec![fixture_failure_run(FRAME_PATH)]),
        quit: OnceLock::new(),
    });
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    let store = scene.store();
    let ctrl = SessionController::new(
        runner.clone(),
        approval.clone(),
        store.clone(),
        None,
        BACKUP_SUFFIX,
    );
    let _ = runner.quit.set(ctrl.quit_handle());

    let session = ctrl.run(DecisionMode::Auto, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::Cancelled));
    assert_eq!(runner.inner.calls(), 1);
    assert_eq!(approval.calls(), 0);
    // The failures were recorded but never classified.
    assert_eq!(session.failures.len(), 1);
    assert!(session.patterns.is_empty());

    let listed = store.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].outcome, Some(SessionOutcome::Cancelled));
}

#[tokio::test]
async fn test_store_failure_is_fatal() {
    let runner = Arc::new(ScriptedRunner::new(vec![passing_run()]));
    let ctrl = SessionController::new(
        runner.clone(),
        Arc::new(FixedApproval::new(ApprovalDecision::Approve)),
        Arc::new(FailingStore),
        None,
        BACKUP_SUFFIX,
    );

    let err = ctrl.run(DecisionMode::Auto, None, 3).await.unwrap_err();

    assert!(format!("{err:#}").contains("failed to persist session"));
    assert_eq!(runner.calls(), 1);
}

#[tokio::test]
async fn test_unmatched_snippet_is_recorded_not_fatal() {
    let scene = Scene::new();
    let runner = Arc::new(ScriptedRunner::new(vec![
        fixture_failure_run(FRAME_PATH),
        fixture_failure_run(FRAME_PATH),
    ]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        scene.store(),
        vec![
            detect_reply(0.95),
            // The old snippet does not exist in the fixture file.
            strategy_reply(&scene.fixture_str(), "{ \"rows\": 99 }", "{ \"rows\": 3 }"),
        ],
    );

    let session = ctrl.run(DecisionMode::Auto, None, 1).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::MaxIterationsReached));
    assert_eq!(runner.calls(), 2);

    assert_eq!(session.applied_changes.len(), 1);
    let applied = &session.applied_changes[0];
    assert!(!applied.success);
    assert!(applied
        .error
        .as_deref()
        .unwrap()
        .contains("old content not found"));

    // The file is untouched and the pre-substitution backup remains.
    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), ORIGINAL);
    assert_eq!(std::fs::read_to_string(scene.backup()).unwrap(), ORIGINAL);
}

#[tokio::test]
async fn test_failed_change_does_not_block_later_changes() {
    let scene = Scene::new();
    let orders = scene.dir.path().join("orders.fixture.json");
    std::fs::write(&orders, "{ \"total\": 7 }\n").unwrap();

    let runner = Arc::new(ScriptedRunner::new(vec![
        fixture_failure_run(FRAME_PATH),
        passing_run(),
    ]));
    let approval = Arc::new(FixedApproval::new(ApprovalDecision::Approve));
    // One strategy carrying two changes: the first snippet is stale and will
    // not match, the second targets a different file and applies cleanly.
    let reply = format!(
        "{}\n```\nfile: {}\nreason: refresh stale fixture\n{{ \"total\": 7 }}\n---\n{{ \"total\": 8 }}\n```\n",
        strategy_reply(&scene.fixture_str(), "{ \"rows\": 99 }", "{ \"rows\": 3 }"),
        orders.display(),
    );
    let ctrl = controller(
        Arc::clone(&runner),
        Arc::clone(&approval),
        scene.store(),
        vec![detect_reply(0.95), reply],
    );

    let session = ctrl.run(DecisionMode::Auto, None, 3).await.unwrap();

    assert_eq!(session.outcome, Some(SessionOutcome::Healed));
    assert_eq!(session.iteration, 1);
    assert_eq!(runner.calls(), 2);

    assert_eq!(session.applied_changes.len(), 2);
    let first = &session.applied_changes[0];
    assert!(!first.success);
    assert_eq!(first.file, scene.fixture);
    assert!(first.error.as_deref().unwrap().contains("old content not found"));
    let second = &session.applied_changes[1];
    assert!(second.success);
    assert_eq!(second.file, orders);
    assert_eq!(session.changes_applied(), 1);

    // First target untouched, its backup retained; second target rewritten
    // with its own backup alongside.
    assert_eq!(std::fs::read_to_string(&scene.fixture).unwrap(), ORIGINAL);
    assert_eq!(std::fs::read_to_string(scene.backup()).unwrap(), ORIGINAL);
    assert_eq!(
        std::fs::read_to_string(&orders).unwrap(),
        "{ \"total\": 8 }\n"
    );
    let orders_backup = scene
        .dir
        .path()
        .join(format!("orders.fixture.json{BACKUP_SUFFIX}"));
    assert_eq!(
        std::fs::read_to_string(orders_backup).unwrap(),
        "{ \"total\": 7 }\n"
    );
}
