//! Workflow execution
//!
//! Runs a composed step list strictly in order. The model is validated
//! before the first step so a broken configuration aborts with no partial
//! side effects; after that, the first step to fail ends the run and later
//! steps never execute.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use gantry_core::error::WorkflowError;
use gantry_core::model::validate_model;
use gantry_core::types::Command;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::composer::{plan, WorkflowStep};
use crate::listeners::{ExecutionEvent, ListenerDispatcher, WorkflowListener};
use crate::steps::DriverInvoker;

/// Seam between the executor and the step drivers.
///
/// Production uses [`DriverInvoker`]; tests substitute a recording
/// implementation to observe ordering without touching the filesystem.
pub trait StepInvoker: Send + Sync {
    /// Run one step against the context
    fn invoke(
        &self,
        step: WorkflowStep,
        ctx: &mut Context,
        listeners: &ListenerDispatcher,
        registry: &PluginRegistry,
    ) -> Result<StepOutcome>;
}

/// Executor lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// No step has run yet
    NotStarted,
    /// Steps are executing
    Running,
    /// Every step completed
    Succeeded,
    /// A step or listener failed; later steps never ran
    Failed,
}

/// Runs a composed list of workflow steps sequentially
pub struct WorkflowExecutor {
    steps: Vec<WorkflowStep>,
    state: ExecutorState,
    invoker: Arc<dyn StepInvoker>,
    listeners: ListenerDispatcher,
    registry: PluginRegistry,
}

impl WorkflowExecutor {
    /// Create an executor for a command's composed plan
    pub fn for_command(command: Command) -> Self {
        Self::with_steps(plan(command))
    }

    /// Create an executor for an explicit step list
    pub fn with_steps(steps: Vec<WorkflowStep>) -> Self {
        Self {
            steps,
            state: ExecutorState::NotStarted,
            invoker: Arc::new(DriverInvoker),
            listeners: ListenerDispatcher::new(),
            registry: PluginRegistry::new(),
        }
    }

    /// Substitute the step invoker
    pub fn with_invoker(mut self, invoker: Arc<dyn StepInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    /// Substitute the plugin registry
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Substitute the listener dispatcher
    pub fn with_listeners(mut self, listeners: ListenerDispatcher) -> Self {
        self.listeners = listeners;
        self
    }

    /// Register an additional listener
    pub fn add_listener<L: WorkflowListener + 'static>(&mut self, listener: L) {
        self.listeners.register(listener);
    }

    /// Current state
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// The composed step list
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    /// Execute all steps in order.
    ///
    /// The first unrecovered failure transitions the executor to Failed and
    /// is re-raised to the caller after logging; remaining steps never run.
    pub fn execute(&mut self, ctx: &mut Context) -> Result<()> {
        let start = Instant::now();
        self.state = ExecutorState::Running;

        if let Err(e) = validate_model(&ctx.model, &ctx.base_dir, ctx.strict) {
            return self.fail(e, start);
        }

        info!(command = %ctx.command, steps = self.steps.len(), "starting workflow");

        if let Err(e) = self.listeners.session_start(ctx) {
            return self.fail(e, start);
        }

        for step in self.steps.clone() {
            let step_start = Instant::now();

            let before = ExecutionEvent::before(step.as_str());
            if let Err(e) = self.listeners.workflow_step(&before, ctx) {
                return self.fail(e, start);
            }

            match self.invoker.invoke(step, ctx, &self.listeners, &self.registry) {
                Ok(outcome) => {
                    let success = ExecutionEvent::success(step.as_str());
                    if let Err(e) = self.listeners.workflow_step(&success, ctx) {
                        return self.fail(e, start);
                    }
                    info!(
                        step = step.as_str(),
                        outcome = outcome.as_str(),
                        elapsed_ms = step_start.elapsed().as_millis() as u64,
                        "step finished"
                    );
                }
                Err(e) => {
                    // Failure dispatch never vetoes; the step error stays
                    // the ambient one
                    let failure = ExecutionEvent::failure(step.as_str(), e.to_string());
                    let _ = self.listeners.workflow_step(&failure, ctx);

                    let wrapped = match e {
                        workflow @ GantryError::Workflow(_) => workflow,
                        other => WorkflowError::StepFailed {
                            step: step.as_str().to_string(),
                            source: Box::new(other),
                        }
                        .into(),
                    };
                    return self.fail(wrapped, start);
                }
            }
        }

        self.state = ExecutorState::Succeeded;
        if let Err(e) = self.listeners.session_end(ctx) {
            return self.fail(e, start);
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "workflow succeeded"
        );
        Ok(())
    }

    fn fail(&mut self, error: GantryError, start: Instant) -> Result<()> {
        self.state = ExecutorState::Failed;

        // Full detail goes to the debug sink; the main log stays readable
        debug!(error = ?error, "workflow failure detail");
        error!(
            error = %error,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "workflow failed"
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    use gantry_core::model::{Model, Project};

    fn model() -> Model {
        Model {
            project: Project {
                name: "demo".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn context(command: Command) -> (TempDir, Context) {
        let temp = TempDir::new().unwrap();
        let ctx = Context::new(model(), temp.path(), command);
        (temp, ctx)
    }

    /// Invoker that records step order and optionally fails on one step
    #[derive(Default)]
    struct RecordingInvoker {
        invoked: Mutex<Vec<WorkflowStep>>,
        fail_on: Option<WorkflowStep>,
    }

    impl RecordingInvoker {
        fn failing_on(step: WorkflowStep) -> Self {
            Self {
                invoked: Mutex::new(Vec::new()),
                fail_on: Some(step),
            }
        }

        fn invoked(&self) -> Vec<WorkflowStep> {
            self.invoked.lock().unwrap().clone()
        }
    }

    impl StepInvoker for RecordingInvoker {
        fn invoke(
            &self,
            step: WorkflowStep,
            _ctx: &mut Context,
            _listeners: &ListenerDispatcher,
            _registry: &PluginRegistry,
        ) -> Result<StepOutcome> {
            self.invoked.lock().unwrap().push(step);
            if self.fail_on == Some(step) {
                return Err(GantryError::other(format!("{} exploded", step)));
            }
            Ok(StepOutcome::Succeeded)
        }
    }

    #[test]
    fn test_steps_run_in_composed_order() {
        let (_temp, mut ctx) = context(Command::Release);
        let invoker = Arc::new(RecordingInvoker::default());

        let mut executor =
            WorkflowExecutor::for_command(Command::Release).with_invoker(invoker.clone());
        executor.execute(&mut ctx).unwrap();

        use WorkflowStep::*;
        assert_eq!(
            invoker.invoked(),
            vec![Changelog, Checksum, Sign, Upload, Release]
        );
        assert_eq!(executor.state(), ExecutorState::Succeeded);
    }

    #[test]
    fn test_failure_stops_remaining_steps() {
        let (_temp, mut ctx) = context(Command::Release);
        let invoker = Arc::new(RecordingInvoker::failing_on(WorkflowStep::Sign));

        let mut executor =
            WorkflowExecutor::for_command(Command::Release).with_invoker(invoker.clone());
        let result = executor.execute(&mut ctx);

        assert!(result.is_err());
        assert_eq!(executor.state(), ExecutorState::Failed);

        use WorkflowStep::*;
        // Upload and Release must never have been invoked
        assert_eq!(invoker.invoked(), vec![Changelog, Checksum, Sign]);
    }

    #[test]
    fn test_step_error_is_wrapped_with_step_name() {
        let (_temp, mut ctx) = context(Command::Checksum);
        let invoker = Arc::new(RecordingInvoker::failing_on(WorkflowStep::Checksum));

        let mut executor =
            WorkflowExecutor::for_command(Command::Checksum).with_invoker(invoker);
        let err = executor.execute(&mut ctx).unwrap_err();

        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_validation_failure_runs_no_steps() {
        let (_temp, mut ctx) = context(Command::Release);
        ctx.model.project.name.clear();

        let invoker = Arc::new(RecordingInvoker::default());
        let mut executor =
            WorkflowExecutor::for_command(Command::Release).with_invoker(invoker.clone());

        let result = executor.execute(&mut ctx);
        assert!(result.is_err());
        assert_eq!(executor.state(), ExecutorState::Failed);
        assert!(invoker.invoked().is_empty());
    }

    #[test]
    fn test_initial_state() {
        let executor = WorkflowExecutor::for_command(Command::Checksum);
        assert_eq!(executor.state(), ExecutorState::NotStarted);
        assert_eq!(executor.steps(), &[WorkflowStep::Checksum]);
    }

    #[test]
    fn test_listener_veto_fails_workflow() {
        struct VetoListener;

        impl WorkflowListener for VetoListener {
            fn continue_on_error(&self) -> bool {
                false
            }

            fn on_workflow_step(
                &self,
                event: &ExecutionEvent,
                _ctx: &Context,
            ) -> Result<()> {
                if event.kind == crate::listeners::EventKind::Before {
                    return Err(GantryError::other("vetoed"));
                }
                Ok(())
            }
        }

        let (_temp, mut ctx) = context(Command::Checksum);
        let invoker = Arc::new(RecordingInvoker::default());

        let mut listeners = ListenerDispatcher::empty();
        listeners.register(VetoListener);

        let mut executor = WorkflowExecutor::for_command(Command::Checksum)
            .with_invoker(invoker.clone())
            .with_listeners(listeners);

        let result = executor.execute(&mut ctx);
        assert!(result.is_err());
        assert_eq!(executor.state(), ExecutorState::Failed);
        assert!(invoker.invoked().is_empty());
    }
}
