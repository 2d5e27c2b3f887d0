//! Shared fixtures and scripted port implementations for integration tests.

// Each test binary compiles its own copy and uses a different subset.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use suture::domain::errors::{HealError, HealResult};
use suture::domain::models::{CodeChange, HealingSession};
use suture::domain::ports::{
    ApprovalDecision, ApprovalPort, CompletionClient, CompletionRequest, SessionStore,
    TestRunOutput, TestRunner,
};

/// Runner that replays a fixed sequence of outputs.
///
/// Panics when the script runs dry so a looping controller shows up as a
/// test failure instead of hanging.
pub struct ScriptedRunner {
    outputs: Mutex<VecDeque<TestRunOutput>>,
    calls: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<TestRunOutput>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestRunner for ScriptedRunner {
    async fn run(&self, _target: Option<&str>) -> HealResult<TestRunOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outputs = self.outputs.lock().unwrap();
        Ok(outputs.pop_front().expect("runner script exhausted"))
    }
}

/// Runner with an independent output script per target.
pub struct TargetScriptedRunner {
    scripts: Mutex<HashMap<String, VecDeque<HealResult<TestRunOutput>>>>,
}

impl TargetScriptedRunner {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(self, target: &str, outputs: Vec<HealResult<TestRunOutput>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(target.to_string(), outputs.into());
        self
    }
}

#[async_trait]
impl TestRunner for TargetScriptedRunner {
    async fn run(&self, target: Option<&str>) -> HealResult<TestRunOutput> {
        let target = target.expect("target-scripted runner needs a target");
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(target)
            .unwrap_or_else(|| panic!("no script for target {target}"));
        queue
            .pop_front()
            .unwrap_or_else(|| panic!("script for target {target} exhausted"))
    }
}

/// Approval port that answers with one fixed decision forever.
pub struct FixedApproval {
    decision: ApprovalDecision,
    calls: AtomicUsize,
}

impl FixedApproval {
    pub fn new(decision: ApprovalDecision) -> Self {
        Self {
            decision,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApprovalPort for FixedApproval {
    async fn request(&self, _change: &CodeChange) -> HealResult<ApprovalDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decision)
    }
}

/// Completion client that replays canned replies, then errors.
///
/// The error tail exercises the degrade-to-heuristics path rather than
/// aborting anything.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> suture::domain::ports::completion::Result<String> {
        let mut replies = self.replies.lock().unwrap();
        replies
            .pop_front()
            .ok_or_else(|| "completion script exhausted".into())
    }
}

/// Store whose session writes always fail, for abort-path tests.
pub struct FailingStore;

#[async_trait]
impl SessionStore for FailingStore {
    async fn save_session(&self, _session: &HealingSession) -> HealResult<()> {
        Err(HealError::Io(std::io::Error::other("disk full")))
    }

    async fn load_session(&self, session_id: uuid::Uuid) -> HealResult<HealingSession> {
        Err(HealError::SessionNotFound(session_id))
    }

    async fn list_sessions(&self) -> HealResult<Vec<HealingSession>> {
        Ok(vec![])
    }

    async fn save_learning(
        &self,
        _learning: &suture::domain::models::SessionLearning,
    ) -> HealResult<()> {
        Err(HealError::Io(std::io::Error::other("disk full")))
    }

    async fn list_learnings(&self) -> HealResult<Vec<suture::domain::models::SessionLearning>> {
        Ok(vec![])
    }

    async fn append_task_record(
        &self,
        _record: &suture::domain::ports::TaskRecord,
    ) -> HealResult<()> {
        Err(HealError::Io(std::io::Error::other("disk full")))
    }
}

/// A passing run.
pub fn passing_run() -> TestRunOutput {
    TestRunOutput {
        passed: true,
        output: "PASS tests/data.test.ts\nTests: 3 passed, 3 total\n".to_string(),
        exit_code: Some(0),
        duration_ms: 40,
    }
}

/// A failing run whose error block points at `source_file` and classifies
/// as a safe fixture update.
pub fn fixture_failure_run(source_file: &str) -> TestRunOutput {
    let output = format!(
        "FAIL tests/data.test.ts\n  ✕ renders seeded rows (23 ms)\n\n  \
         ● renders seeded rows\n\n    Error: snapshot mismatch for fixture users-list\n        \
         at Object.<anonymous> ({source_file}:12:5)\n"
    );
    TestRunOutput {
        passed: false,
        output,
        exit_code: Some(1),
        duration_ms: 55,
    }
}

/// A failing run whose wording trips the dangerous auth rule.
pub fn auth_failure_run() -> TestRunOutput {
    TestRunOutput {
        passed: false,
        output: "  ● rejects expired credentials\n\n    Error: login token validation failed\n        at Object.<anonymous> (src/auth/guard.ts:8:3)\n".to_string(),
        exit_code: Some(1),
        duration_ms: 31,
    }
}

/// Classification reply at the given confidence.
pub fn detect_reply(confidence: f64) -> String {
    format!("type: data-update\nconfidence: {confidence}\nfix: refresh the stored fixture")
}

/// Strategy reply carrying one substitution change against `file`.
pub fn strategy_reply(file: &str, old: &str, new: &str) -> String {
    format!(
        "strategy: conservative\nrisk: low\neffort: low\n\
         Refresh the stale fixture.\n\n```\nfile: {file}\nreason: refresh stale fixture\n{old}\n---\n{new}\n```\n"
    )
}
