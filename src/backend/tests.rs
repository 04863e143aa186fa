//! Backend Module Tests
//!
//! ## Test Scopes
//! - **Registry**: program registration, lookup, and execution.
//! - **Outcome**: how compute results and soft failures are interpreted.
//! - **Function backend**: futures on the worker pool and their handles.
//! - **Workflow backend**: workflows on the in-process launchpad.

#[cfg(test)]
mod tests {
    use crate::backend::registry::ComputeRegistry;
    use crate::backend::types::*;
    use crate::backend::{FunctionBackend, WorkflowBackend};
    use crate::launchpad::{LaunchPad, LocalLaunchPad, WorkflowId, WorkflowState};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn spec(identity: &str, method: &str, program: &str) -> TaskSpec {
        TaskSpec {
            identity: identity.to_string(),
            method: method.to_string(),
            program: program.to_string(),
            molecule: serde_json::json!({"symbols": ["O", "H", "H"]}),
            options: serde_json::json!({}),
        }
    }

    async fn wait_until_finished(handle: &dyn TaskHandle) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished().await {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("handle did not finish in time");
    }

    fn registry_with_programs() -> Arc<ComputeRegistry> {
        let registry = ComputeRegistry::new();
        registry.register("energy", |spec| async move {
            Ok(serde_json::json!({"return_value": -76.02, "method": spec.method}))
        });
        registry.register("diverging", |_spec| async {
            Err(anyhow::anyhow!("solver diverged"))
        });
        registry
    }

    // ============================================================
    // TEST 1: ComputeRegistry
    // ============================================================

    #[tokio::test]
    async fn test_registry_register_and_execute() {
        // ARRANGE
        let registry = ComputeRegistry::new();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        // ACT
        registry.register("counting", move |_spec| {
            let count = call_count_clone.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::json!({"return_value": 1.0}))
            }
        });

        // ASSERT
        assert!(registry.has_program("counting"));
        assert_eq!(registry.list_programs(), vec!["counting".to_string()]);

        let result = registry.execute(spec("h2o", "scf", "counting")).await;
        assert_eq!(result.unwrap()["return_value"], 1.0);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_unknown_program_returns_error() {
        let registry = ComputeRegistry::new();

        let result = registry.execute(spec("h2o", "scf", "psi5")).await;

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown compute program"));
    }

    #[tokio::test]
    async fn test_registry_program_receives_spec() {
        let registry = ComputeRegistry::new();
        let received = Arc::new(tokio::sync::Mutex::new(None));
        let received_clone = received.clone();

        registry.register("recording", move |spec| {
            let received = received_clone.clone();
            async move {
                *received.lock().await = Some(spec);
                Ok(serde_json::json!({}))
            }
        });

        registry
            .execute(spec("ch4", "mp2", "recording"))
            .await
            .unwrap();

        let seen = received.lock().await;
        let seen = seen.as_ref().expect("program was not called");
        assert_eq!(seen.identity, "ch4");
        assert_eq!(seen.method, "mp2");
        assert_eq!(seen.molecule["symbols"][0], "O");
    }

    // ============================================================
    // TEST 2: Outcome / BackendKind
    // ============================================================

    #[test]
    fn test_outcome_from_compute_success_keys_record() {
        let spec = spec("h2o", "b3lyp", "energy");

        let outcome = Outcome::from_compute(&spec, Ok(serde_json::json!({"return_value": 1.5})));

        match outcome {
            Outcome::Success(record) => {
                assert_eq!(record.identity, "h2o");
                assert_eq!(record.method, "b3lyp");
                assert_eq!(record.program, "energy");
                assert_eq!(record.fields["return_value"], 1.5);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_from_compute_soft_failure() {
        let spec = spec("h2o", "b3lyp", "energy");

        let outcome = Outcome::from_compute(
            &spec,
            Ok(serde_json::json!({"success": false, "error": "SCF did not converge"})),
        );
        assert_eq!(outcome, Outcome::failure("SCF did not converge"));

        let outcome = Outcome::from_compute(&spec, Ok(serde_json::json!({"success": false})));
        assert_eq!(
            outcome,
            Outcome::failure("computation (h2o, b3lyp) did not complete successfully")
        );
    }

    #[test]
    fn test_outcome_from_compute_error_keeps_message() {
        let spec = spec("h2o", "b3lyp", "energy");

        let outcome = Outcome::from_compute(&spec, Err(anyhow::anyhow!("solver diverged")));

        assert_eq!(outcome, Outcome::failure("solver diverged"));
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("function".parse::<BackendKind>(), Ok(BackendKind::Function));
        assert_eq!("dask".parse::<BackendKind>(), Ok(BackendKind::Function));
        assert_eq!(
            "Workflow-Engine".parse::<BackendKind>(),
            Ok(BackendKind::Workflow)
        );
        assert_eq!("fireworks".parse::<BackendKind>(), Ok(BackendKind::Workflow));
        assert!("slurm".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Workflow.to_string(), "workflow");
    }

    // ============================================================
    // TEST 3: FunctionBackend
    // ============================================================

    #[tokio::test]
    async fn test_function_backend_success() {
        let backend = FunctionBackend::new(registry_with_programs(), 2);
        assert_eq!(backend.kind(), BackendKind::Function);

        let mut handle = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();
        wait_until_finished(handle.as_ref()).await;

        match handle.outcome().await {
            Outcome::Success(record) => {
                assert_eq!(record.identity, "h2o");
                assert_eq!(record.fields["return_value"], -76.02);
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_function_backend_failure_is_reported_through_handle() {
        let backend = FunctionBackend::new(registry_with_programs(), 2);

        // Submission itself succeeds; the failure shows up in the outcome.
        let mut handle = backend
            .submit(spec("h2o", "scf", "diverging"))
            .await
            .expect("submit should not fail for a well-formed spec");
        wait_until_finished(handle.as_ref()).await;

        assert_eq!(handle.outcome().await, Outcome::failure("solver diverged"));
    }

    #[tokio::test]
    async fn test_function_backend_outcome_consumed_once() {
        let backend = FunctionBackend::new(registry_with_programs(), 1);

        let mut handle = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();
        wait_until_finished(handle.as_ref()).await;

        assert!(matches!(handle.outcome().await, Outcome::Success(_)));
        assert_eq!(
            handle.outcome().await,
            Outcome::failure("outcome already consumed")
        );
    }

    #[tokio::test]
    async fn test_function_backend_reports_panicking_program() {
        let registry = ComputeRegistry::new();
        registry.register("panicking", |_spec| async {
            if true {
                panic!("segfault in integral code");
            }
            Ok(serde_json::json!({}))
        });
        let backend = FunctionBackend::new(registry, 1);

        let mut handle = backend.submit(spec("h2o", "scf", "panicking")).await.unwrap();
        wait_until_finished(handle.as_ref()).await;

        match handle.outcome().await {
            Outcome::Failure { message } => assert!(message.contains("panicked")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_function_backend_not_finished_while_running() {
        let registry = ComputeRegistry::new();
        let gate = Arc::new(tokio::sync::Notify::new());
        let gate_clone = gate.clone();
        registry.register("gated", move |_spec| {
            let gate = gate_clone.clone();
            async move {
                gate.notified().await;
                Ok(serde_json::json!({}))
            }
        });
        let backend = FunctionBackend::new(registry, 1);

        let handle = backend.submit(spec("h2o", "scf", "gated")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished().await);

        gate.notify_one();
        wait_until_finished(handle.as_ref()).await;
    }

    // ============================================================
    // TEST 4: WorkflowBackend
    // ============================================================

    #[tokio::test]
    async fn test_workflow_backend_completes_through_launchpad() {
        let launchpad = LocalLaunchPad::new(registry_with_programs(), 2);
        launchpad.clone().start();
        let backend = WorkflowBackend::new(launchpad.clone());
        assert_eq!(backend.kind(), BackendKind::Workflow);

        let mut ok = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();
        let mut bad = backend.submit(spec("ch4", "scf", "diverging")).await.unwrap();

        wait_until_finished(ok.as_ref()).await;
        wait_until_finished(bad.as_ref()).await;

        assert!(matches!(ok.outcome().await, Outcome::Success(r) if r.identity == "h2o"));
        assert_eq!(bad.outcome().await, Outcome::failure("solver diverged"));
        assert_eq!(launchpad.state_counts(), (0, 0, 1, 1));
    }

    #[tokio::test]
    async fn test_workflow_handle_waits_for_rocket_worker() {
        // Launchpad never started: workflows stay Waiting.
        let launchpad = LocalLaunchPad::new(registry_with_programs(), 1);
        let backend = WorkflowBackend::new(launchpad.clone());

        let handle = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();

        assert!(!handle.is_finished().await);
        assert_eq!(launchpad.workflow_count(), 1);
    }

    /// Engine that answers each state query from a script, in order.
    struct ScriptedLaunchPad {
        answers: Mutex<Vec<anyhow::Result<Option<WorkflowState>>>>,
    }

    impl ScriptedLaunchPad {
        fn new(mut answers: Vec<anyhow::Result<Option<WorkflowState>>>) -> Arc<Self> {
            answers.reverse();
            Arc::new(Self {
                answers: Mutex::new(answers),
            })
        }
    }

    #[async_trait]
    impl LaunchPad for ScriptedLaunchPad {
        async fn add_workflow(&self, _spec: TaskSpec) -> anyhow::Result<WorkflowId> {
            Ok(WorkflowId(1))
        }

        async fn workflow_state(&self, _id: WorkflowId) -> anyhow::Result<Option<WorkflowState>> {
            self.answers
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(anyhow::anyhow!("connection reset")))
        }
    }

    #[tokio::test]
    async fn test_workflow_outcome_survives_engine_blip_after_completion() {
        // ARRANGE: completed on the first query, unreachable afterwards
        let record = ResultRecord::from_spec(
            &spec("h2o", "scf", "energy"),
            serde_json::json!({"return_value": -76.0}),
        );
        let launchpad = ScriptedLaunchPad::new(vec![
            Err(anyhow::anyhow!("connection reset")),
            Ok(Some(WorkflowState::Completed {
                record: record.clone(),
            })),
        ]);
        let backend = WorkflowBackend::new(launchpad);
        let mut handle = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();

        // ACT
        let before = handle.is_finished().await;
        let after = handle.is_finished().await;
        let outcome = handle.outcome().await;

        // ASSERT
        assert!(!before);
        assert!(after);
        assert_eq!(outcome, Outcome::Success(record));
        assert_eq!(
            handle.outcome().await,
            Outcome::failure("outcome already consumed")
        );
    }

    #[tokio::test]
    async fn test_workflow_unknown_to_engine_is_a_terminal_failure() {
        let launchpad = ScriptedLaunchPad::new(vec![Ok(None)]);
        let backend = WorkflowBackend::new(launchpad);
        let mut handle = backend.submit(spec("h2o", "scf", "energy")).await.unwrap();

        assert!(handle.is_finished().await);
        assert_eq!(
            handle.outcome().await,
            Outcome::failure("workflow fw-1 is unknown to the engine")
        );
    }
}
