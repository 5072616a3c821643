//! Gantry Engine - Workflow orchestration
//!
//! The composer maps a pipeline command to an ordered list of steps; the
//! executor runs them strictly in order, stopping at the first unrecovered
//! failure; each step driver locates its concrete units through the plugin
//! registry and reports lifecycle events to registered listeners.

pub mod composer;
pub mod executor;
pub mod listeners;
pub mod steps;

pub use composer::{plan, WorkflowStep};
pub use executor::{ExecutorState, StepInvoker, WorkflowExecutor};
pub use listeners::{
    CollectingListener, EventKind, ExecutionEvent, ListenerDispatcher, TracingListener,
    WorkflowListener,
};
pub use steps::DriverInvoker;
