//! Lifecycle events and listener dispatching
//!
//! Listeners observe the pipeline through per-hook callbacks. Dispatch runs
//! in registration order; a listener failing during a BEFORE or SUCCESS
//! event can veto the workflow unless it opts into continue-on-error, while
//! FAILURE events are reported, never second-guessed.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use gantry_core::{Context, Result};

/// Lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Fired immediately before an invocation
    Before,
    /// Fired after a successful invocation
    Success,
    /// Fired after a failed invocation
    Failure,
}

impl EventKind {
    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// A lifecycle event handed to listeners; created right around each
/// invocation and discarded after dispatch
#[derive(Debug, Clone)]
pub struct ExecutionEvent {
    /// Event kind
    pub kind: EventKind,
    /// Step the event belongs to
    pub step: String,
    /// Failure message, present on FAILURE events
    pub error: Option<String>,
}

impl ExecutionEvent {
    /// Create a BEFORE event
    pub fn before(step: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Before,
            step: step.into(),
            error: None,
        }
    }

    /// Create a SUCCESS event
    pub fn success(step: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Success,
            step: step.into(),
            error: None,
        }
    }

    /// Create a FAILURE event
    pub fn failure(step: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Failure,
            step: step.into(),
            error: Some(error.into()),
        }
    }
}

/// External observer of pipeline lifecycle events.
///
/// Every hook has a no-op default, so listeners implement only what they
/// care about. Hooks receive immutable snapshots; a listener cannot alter
/// the run, only veto it by returning an error.
#[allow(unused_variables)]
pub trait WorkflowListener: Send + Sync {
    /// Whether the workflow proceeds when this listener fails
    fn continue_on_error(&self) -> bool {
        true
    }

    /// The run is starting
    fn on_session_start(&self, ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// The run has ended
    fn on_session_end(&self, ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// A workflow step boundary
    fn on_workflow_step(&self, event: &ExecutionEvent, ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// An announcer invocation
    fn on_announce_step(&self, event: &ExecutionEvent, ctx: &Context, announcer: &str) -> Result<()> {
        Ok(())
    }

    /// An uploader invocation
    fn on_upload_step(&self, event: &ExecutionEvent, ctx: &Context, uploader: &str) -> Result<()> {
        Ok(())
    }

    /// A downloader invocation
    fn on_download_step(&self, event: &ExecutionEvent, ctx: &Context, downloader: &str) -> Result<()> {
        Ok(())
    }

    /// A deployer invocation
    fn on_deploy_step(&self, event: &ExecutionEvent, ctx: &Context, deployer: &str) -> Result<()> {
        Ok(())
    }

    /// A releaser invocation
    fn on_release_step(&self, event: &ExecutionEvent, ctx: &Context) -> Result<()> {
        Ok(())
    }

    /// A cataloger invocation
    fn on_catalog_step(&self, event: &ExecutionEvent, ctx: &Context, cataloger: &str) -> Result<()> {
        Ok(())
    }

    /// A packager prepare invocation
    fn on_packager_prepare_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        Ok(())
    }

    /// A packager package invocation
    fn on_packager_package_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        Ok(())
    }

    /// A packager publish invocation
    fn on_packager_publish_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        Ok(())
    }

    /// Processing of a distribution begins
    fn on_distribution_start(&self, ctx: &Context, distribution: &str) -> Result<()> {
        Ok(())
    }

    /// Processing of a distribution ends
    fn on_distribution_end(&self, ctx: &Context, distribution: &str) -> Result<()> {
        Ok(())
    }
}

/// Dispatches lifecycle events to registered listeners in order
pub struct ListenerDispatcher {
    listeners: Vec<Arc<dyn WorkflowListener>>,
}

impl ListenerDispatcher {
    /// Create a dispatcher with the default tracing listener
    pub fn new() -> Self {
        Self {
            listeners: vec![Arc::new(TracingListener)],
        }
    }

    /// Create a dispatcher with no listeners
    pub fn empty() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener
    pub fn register<L: WorkflowListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    /// Register a shared listener
    pub fn register_arc(&mut self, listener: Arc<dyn WorkflowListener>) {
        self.listeners.push(listener);
    }

    /// All registered listeners
    pub fn all(&self) -> &[Arc<dyn WorkflowListener>] {
        &self.listeners
    }

    /// Invoke a hook on every listener in registration order.
    ///
    /// On FAILURE events listener errors are logged and dispatch continues;
    /// on other events a listener without continue-on-error aborts dispatch
    /// with its own error as the cause.
    fn fire<F>(&self, kind: EventKind, mut invoke: F) -> Result<()>
    where
        F: FnMut(&Arc<dyn WorkflowListener>) -> Result<()>,
    {
        for listener in &self.listeners {
            if let Err(e) = invoke(listener) {
                if kind == EventKind::Failure || listener.continue_on_error() {
                    warn!(error = %e, "listener failed; continuing");
                } else {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Fire session start
    pub fn session_start(&self, ctx: &Context) -> Result<()> {
        self.fire(EventKind::Before, |l| l.on_session_start(ctx))
    }

    /// Fire session end
    pub fn session_end(&self, ctx: &Context) -> Result<()> {
        self.fire(EventKind::Success, |l| l.on_session_end(ctx))
    }

    /// Fire a workflow step event
    pub fn workflow_step(&self, event: &ExecutionEvent, ctx: &Context) -> Result<()> {
        self.fire(event.kind, |l| l.on_workflow_step(event, ctx))
    }

    /// Fire an announce unit event; disabled units dispatch nothing
    pub fn announce_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        announcer: &str,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_announce_step(event, ctx, announcer))
    }

    /// Fire an upload unit event; disabled units dispatch nothing
    pub fn upload_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        uploader: &str,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_upload_step(event, ctx, uploader))
    }

    /// Fire a download unit event; disabled units dispatch nothing
    pub fn download_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        downloader: &str,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_download_step(event, ctx, downloader))
    }

    /// Fire a deploy unit event; disabled units dispatch nothing
    pub fn deploy_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        deployer: &str,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_deploy_step(event, ctx, deployer))
    }

    /// Fire a release event; a disabled releaser dispatches nothing
    pub fn release_step(&self, event: &ExecutionEvent, ctx: &Context, enabled: bool) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_release_step(event, ctx))
    }

    /// Fire a catalog unit event; disabled units dispatch nothing
    pub fn catalog_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        cataloger: &str,
        enabled: bool,
    ) -> Result<()> {
        if !enabled {
            return Ok(());
        }
        self.fire(event.kind, |l| l.on_catalog_step(event, ctx, cataloger))
    }

    /// Fire a packager prepare event
    pub fn packager_prepare_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        self.fire(event.kind, |l| {
            l.on_packager_prepare_step(event, ctx, distribution, packager)
        })
    }

    /// Fire a packager package event
    pub fn packager_package_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        self.fire(event.kind, |l| {
            l.on_packager_package_step(event, ctx, distribution, packager)
        })
    }

    /// Fire a packager publish event
    pub fn packager_publish_step(
        &self,
        event: &ExecutionEvent,
        ctx: &Context,
        distribution: &str,
        packager: &str,
    ) -> Result<()> {
        self.fire(event.kind, |l| {
            l.on_packager_publish_step(event, ctx, distribution, packager)
        })
    }

    /// Fire distribution start
    pub fn distribution_start(&self, ctx: &Context, distribution: &str) -> Result<()> {
        self.fire(EventKind::Before, |l| l.on_distribution_start(ctx, distribution))
    }

    /// Fire distribution end
    pub fn distribution_end(&self, ctx: &Context, distribution: &str) -> Result<()> {
        self.fire(EventKind::Success, |l| l.on_distribution_end(ctx, distribution))
    }
}

impl Default for ListenerDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener that logs events through tracing
#[derive(Debug, Default)]
pub struct TracingListener;

impl WorkflowListener for TracingListener {
    fn on_session_start(&self, ctx: &Context) -> Result<()> {
        info!(command = %ctx.command, "session started");
        Ok(())
    }

    fn on_session_end(&self, ctx: &Context) -> Result<()> {
        info!(command = %ctx.command, "session ended");
        Ok(())
    }

    fn on_workflow_step(&self, event: &ExecutionEvent, _ctx: &Context) -> Result<()> {
        match event.kind {
            EventKind::Before => debug!(step = %event.step, "step starting"),
            EventKind::Success => debug!(step = %event.step, "step succeeded"),
            EventKind::Failure => warn!(
                step = %event.step,
                error = event.error.as_deref().unwrap_or(""),
                "step failed"
            ),
        }
        Ok(())
    }

    fn on_distribution_start(&self, _ctx: &Context, distribution: &str) -> Result<()> {
        debug!(distribution, "processing distribution");
        Ok(())
    }
}

/// Listener that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingListener {
    events: Mutex<Vec<(EventKind, String)>>,
}

impl CollectingListener {
    fn record(&self, kind: EventKind, label: impl Into<String>) {
        self.events.lock().unwrap().push((kind, label.into()));
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<(EventKind, String)> {
        self.events.lock().unwrap().clone()
    }
}

impl WorkflowListener for CollectingListener {
    fn on_session_start(&self, _ctx: &Context) -> Result<()> {
        self.record(EventKind::Before, "session");
        Ok(())
    }

    fn on_session_end(&self, _ctx: &Context) -> Result<()> {
        self.record(EventKind::Success, "session");
        Ok(())
    }

    fn on_workflow_step(&self, event: &ExecutionEvent, _ctx: &Context) -> Result<()> {
        self.record(event.kind, event.step.clone());
        Ok(())
    }

    fn on_upload_step(&self, event: &ExecutionEvent, _ctx: &Context, uploader: &str) -> Result<()> {
        self.record(event.kind, format!("upload:{}", uploader));
        Ok(())
    }

    fn on_announce_step(
        &self,
        event: &ExecutionEvent,
        _ctx: &Context,
        announcer: &str,
    ) -> Result<()> {
        self.record(event.kind, format!("announce:{}", announcer));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::model::{Model, Project};
    use gantry_core::types::Command;
    use gantry_core::GantryError;

    fn context() -> Context {
        let model = Model {
            project: Project {
                name: "demo".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(model, "/tmp", Command::Release)
    }

    /// Listener that always fails its hooks
    struct FailingListener {
        continue_on_error: bool,
    }

    impl WorkflowListener for FailingListener {
        fn continue_on_error(&self) -> bool {
            self.continue_on_error
        }

        fn on_workflow_step(&self, _event: &ExecutionEvent, _ctx: &Context) -> Result<()> {
            Err(GantryError::other("listener exploded"))
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let ctx = context();
        let first = Arc::new(CollectingListener::default());
        let second = Arc::new(CollectingListener::default());

        let mut dispatcher = ListenerDispatcher::empty();
        dispatcher.register_arc(first.clone());
        dispatcher.register_arc(second.clone());

        dispatcher
            .workflow_step(&ExecutionEvent::before("checksum"), &ctx)
            .unwrap();

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }

    #[test]
    fn test_continue_on_error_listener_does_not_block_others() {
        // A failing continue-on-error listener must not prevent later
        // listeners from being invoked nor fail the dispatch
        let ctx = context();
        let collector = Arc::new(CollectingListener::default());

        let mut dispatcher = ListenerDispatcher::empty();
        dispatcher.register(FailingListener {
            continue_on_error: true,
        });
        dispatcher.register_arc(collector.clone());

        let result = dispatcher.workflow_step(&ExecutionEvent::success("upload"), &ctx);
        assert!(result.is_ok());
        assert_eq!(collector.events().len(), 1);
    }

    #[test]
    fn test_listener_vetoes_before_event() {
        let ctx = context();
        let mut dispatcher = ListenerDispatcher::empty();
        dispatcher.register(FailingListener {
            continue_on_error: false,
        });

        let result = dispatcher.workflow_step(&ExecutionEvent::before("upload"), &ctx);
        assert!(result.is_err());
    }

    #[test]
    fn test_listener_cannot_veto_failure_event() {
        let ctx = context();
        let collector = Arc::new(CollectingListener::default());

        let mut dispatcher = ListenerDispatcher::empty();
        dispatcher.register(FailingListener {
            continue_on_error: false,
        });
        dispatcher.register_arc(collector.clone());

        let event = ExecutionEvent::failure("upload", "boom");
        let result = dispatcher.workflow_step(&event, &ctx);

        assert!(result.is_ok());
        assert_eq!(collector.events().len(), 1);
        assert_eq!(collector.events()[0].0, EventKind::Failure);
    }

    #[test]
    fn test_disabled_unit_dispatches_nothing() {
        let ctx = context();
        let collector = Arc::new(CollectingListener::default());

        let mut dispatcher = ListenerDispatcher::empty();
        dispatcher.register_arc(collector.clone());

        dispatcher
            .upload_step(&ExecutionEvent::before("upload"), &ctx, "s3", false)
            .unwrap();

        assert!(collector.events().is_empty());
    }

    #[test]
    fn test_event_constructors() {
        let event = ExecutionEvent::failure("sign", "gpg not found");
        assert_eq!(event.kind, EventKind::Failure);
        assert_eq!(event.step, "sign");
        assert_eq!(event.error.as_deref(), Some("gpg not found"));

        let event = ExecutionEvent::before("sign");
        assert!(event.error.is_none());
    }
}
