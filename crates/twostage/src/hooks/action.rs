//! Deferred hook actions and teardown failure reports.

use std::fmt;

use thiserror::Error;
use twostage_core::{LifecycleError, LifecycleResult};

/// A deferred operation registered by one layer of a hierarchy.
///
/// The action receives the layer that registered it once the whole object
/// exists, and is consumed when it fires.
pub struct HookAction<L: ?Sized + 'static> {
    /// Name of the registering layer, used in logs and failure reports.
    layer: &'static str,
    /// The deferred operation.
    run: Box<dyn FnOnce(&L) -> LifecycleResult<()>>,
}

impl<L: ?Sized + 'static> HookAction<L> {
    /// Creates a new action on behalf of `layer`.
    pub fn new<F>(layer: &'static str, action: F) -> Self
    where
        F: FnOnce(&L) -> LifecycleResult<()> + 'static,
    {
        Self {
            layer,
            run: Box::new(action),
        }
    }

    /// Returns the name of the layer that registered this action.
    pub fn layer(&self) -> &'static str {
        self.layer
    }

    /// Fires the action against its target.
    pub(crate) fn call(self, target: &L) -> LifecycleResult<()> {
        (self.run)(target)
    }

    /// Lifts the action so it can be stored by an enclosing object `P`.
    pub(crate) fn project<P: ?Sized + 'static>(self, project: fn(&P) -> &L) -> HookAction<P> {
        let Self { layer, run } = self;
        HookAction {
            layer,
            run: Box::new(move |parent: &P| run(project(parent))),
        }
    }
}

impl<L: ?Sized + 'static> fmt::Debug for HookAction<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookAction")
            .field("layer", &self.layer)
            .field("run", &"<closure>")
            .finish()
    }
}

/// A single pre-destruct hook that failed.
#[derive(Debug, Error)]
#[error("pre-destruct hook #{index} of layer '{layer}' failed: {error}")]
pub struct HookFailure {
    /// Registration index of the hook within the pre-destruct sequence.
    pub index: usize,
    /// Layer that registered the hook.
    pub layer: &'static str,
    /// The reported error.
    #[source]
    pub error: LifecycleError,
}

/// Every failure of one pre-destruct phase, in firing order.
#[derive(Debug, Error)]
#[error("{} pre-destruct hook(s) failed", .0.len())]
pub struct TeardownFailures(pub Vec<HookFailure>);

/// Outcome of one pre-destruct phase.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Number of hooks fired, failed ones included.
    pub fired: usize,
    /// Hooks that reported an error or panicked.
    pub failures: Vec<HookFailure>,
}

impl TeardownReport {
    /// Returns `true` if every hook succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts the report into a result, aggregating every failure.
    pub fn into_result(self) -> LifecycleResult<()> {
        if self.failures.is_empty() {
            return Ok(());
        }

        let summary = self
            .failures
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Err(LifecycleError::with_source(
            twostage_core::ErrorKind::Teardown,
            format!(
                "{} of {} pre-destruct hooks failed: {}",
                self.failures.len(),
                self.fired,
                summary
            ),
            TeardownFailures(self.failures),
        ))
    }
}
