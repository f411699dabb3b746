//! Hook registry: layers append deferred actions while the object is being built.
//!
//! A [`HookRegistry`] only exists inside a wrapper: it is handed to the
//! constructor as `&mut`, and consumed by the construction driver right after
//! the constructor returns. Registration after that point is impossible by
//! construction.

use std::any::type_name;
use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use tracing::{trace, warn};
use twostage_core::config::teardown::TeardownConfig;
use twostage_core::{ErrorKind, LifecycleError, LifecycleResult};

use super::action::{HookAction, HookFailure, TeardownReport};
use super::gate::ConstructionGate;

mod sealed {
    use twostage_core::LifecycleResult;

    pub trait Sealed {
        /// Dotted path of the layer this registrar builds, rooted at the
        /// wrapped type.
        fn path(&self) -> String;

        /// Records that the layer at `path` minted its gate.
        fn claim(&mut self, path: &str) -> LifecycleResult<()>;
    }
}

/// Registration capability handed to constructors.
///
/// Sealed: the only implementors are [`HookRegistry`], created exclusively
/// by the wrappers, and [`LayerHooks`], derived from another registrar. A
/// constructor taking `&mut impl Hooks<Self>` therefore can only run inside a
/// wrapper, which is what keeps hook-bearing types from being instantiated
/// on their own.
pub trait Hooks<L: ?Sized + 'static>: sealed::Sealed {
    /// Name of the layer registering through this handle.
    fn layer_name(&self) -> &'static str;

    /// Appends a prepared action to the post-construct sequence.
    fn push_post_construct(&mut self, action: HookAction<L>);

    /// Appends a prepared action to the pre-destruct sequence.
    fn push_pre_destruct(&mut self, action: HookAction<L>);

    /// Registers an action to run once the whole object is constructed.
    ///
    /// Post-construct actions fire in registration order.
    fn register_post_construct<F>(&mut self, action: F)
    where
        F: FnOnce(&L) -> LifecycleResult<()> + 'static,
        Self: Sized,
    {
        let layer = self.layer_name();
        self.push_post_construct(HookAction::new(layer, action));
    }

    /// Registers an action to run right before the object starts tearing down.
    ///
    /// Pre-destruct actions fire in reverse registration order.
    fn register_pre_destruct<F>(&mut self, action: F)
    where
        F: FnOnce(&L) -> LifecycleResult<()> + 'static,
        Self: Sized,
    {
        let layer = self.layer_name();
        self.push_pre_destruct(HookAction::new(layer, action));
    }

    /// Mints the gate the value under construction must store.
    ///
    /// A layer path mints at most once per object; building the same layer
    /// twice fails with [`ErrorKind::Construction`].
    fn gate(&mut self) -> LifecycleResult<ConstructionGate<L>>
    where
        Self: Sized,
    {
        let path = self.path();
        self.claim(&path)?;
        Ok(ConstructionGate::new(path))
    }

    /// Derives a registrar for a layer embedded in `L`.
    ///
    /// Actions registered through the returned handle receive the embedded
    /// layer, reached through `project`, and are stored in this registrar's
    /// sequences in registration order.
    fn layer<S>(&mut self, name: &'static str, project: fn(&L) -> &S) -> LayerHooks<'_, L, S>
    where
        S: ?Sized + 'static,
        Self: Sized,
    {
        LayerHooks {
            parent: self,
            name,
            project,
        }
    }
}

/// Per-object storage of the two hook sequences.
pub struct HookRegistry<T: ?Sized + 'static> {
    /// Actions fired after construction, in insertion order.
    post_construct: Vec<HookAction<T>>,
    /// Actions fired before destruction, in reverse insertion order.
    pre_destruct: Vec<HookAction<T>>,
    /// Layer paths that already minted their gate.
    claimed: BTreeSet<String>,
}

impl<T: ?Sized + 'static> HookRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            post_construct: Vec::new(),
            pre_destruct: Vec::new(),
            claimed: BTreeSet::new(),
        }
    }

    /// Checks that `gate` was minted by this registry for the wrapped value
    /// itself, not for one of its layers.
    pub(crate) fn verify_gate(&self, gate: &ConstructionGate<T>) -> LifecycleResult<()> {
        if gate.path() != type_name::<T>() {
            return Err(LifecycleError::construction(format!(
                "{} carries the gate of layer '{}'",
                type_name::<T>(),
                gate.path()
            )));
        }
        Ok(())
    }

    /// Number of queued post-construct actions.
    pub fn post_construct_len(&self) -> usize {
        self.post_construct.len()
    }

    /// Number of queued pre-destruct actions.
    pub fn pre_destruct_len(&self) -> usize {
        self.pre_destruct.len()
    }

    /// Fires every post-construct action once, in insertion order.
    ///
    /// Stops at the first failure. Actions that already fired stay fired and
    /// the remaining ones are dropped unfired.
    pub(crate) fn run_post_construct_hooks(
        &mut self,
        target: &T,
        config: &TeardownConfig,
    ) -> LifecycleResult<usize> {
        let hooks = std::mem::take(&mut self.post_construct);
        let total = hooks.len();

        for (index, hook) in hooks.into_iter().enumerate() {
            let layer = hook.layer();
            if config.trace_hooks {
                trace!(object = type_name::<T>(), layer, index, "Firing post-construct hook");
            }

            if let Err(e) = hook.call(target) {
                warn!(
                    object = type_name::<T>(),
                    layer,
                    index,
                    skipped = total - index - 1,
                    error = %e,
                    "Post-construct hook failed"
                );
                return Err(LifecycleError::with_source(
                    ErrorKind::PostConstruct,
                    format!("post-construct hook #{index} of layer '{layer}' failed: {e}"),
                    e,
                ));
            }
        }

        Ok(total)
    }

    /// Fires every pre-destruct action once, in reverse insertion order.
    ///
    /// A failing or panicking action does not stop the phase; every failure
    /// is collected into the returned report. Without `catch_panics`, the
    /// first panic resumes after the last action has fired.
    pub(crate) fn run_pre_destruct_hooks(
        &mut self,
        target: &T,
        config: &TeardownConfig,
    ) -> TeardownReport {
        let hooks = std::mem::take(&mut self.pre_destruct);
        let mut report = TeardownReport::default();
        let mut unwinding = None;

        for (index, hook) in hooks.into_iter().enumerate().rev() {
            let layer = hook.layer();
            if config.trace_hooks {
                trace!(object = type_name::<T>(), layer, index, "Firing pre-destruct hook");
            }

            let outcome = match catch_unwind(AssertUnwindSafe(|| hook.call(target))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(
                        object = type_name::<T>(),
                        layer,
                        index,
                        reason = %reason,
                        "Pre-destruct hook panicked"
                    );
                    if !config.catch_panics && unwinding.is_none() {
                        unwinding = Some(payload);
                    }
                    Err(LifecycleError::internal(format!("hook panicked: {reason}")))
                }
            };

            report.fired += 1;
            if let Err(error) = outcome {
                report.failures.push(HookFailure {
                    index,
                    layer,
                    error,
                });
            }
        }

        if let Some(payload) = unwinding {
            resume_unwind(payload);
        }

        report
    }
}

impl<T: ?Sized + 'static> sealed::Sealed for HookRegistry<T> {
    fn path(&self) -> String {
        type_name::<T>().to_string()
    }

    fn claim(&mut self, path: &str) -> LifecycleResult<()> {
        if !self.claimed.insert(path.to_string()) {
            return Err(LifecycleError::construction(format!(
                "layer '{path}' already constructed for this object"
            )));
        }
        Ok(())
    }
}

impl<T: ?Sized + 'static> Hooks<T> for HookRegistry<T> {
    fn layer_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn push_post_construct(&mut self, action: HookAction<T>) {
        self.post_construct.push(action);
    }

    fn push_pre_destruct(&mut self, action: HookAction<T>) {
        self.pre_destruct.push(action);
    }
}

impl<T: ?Sized + 'static> std::fmt::Debug for HookRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("object", &type_name::<T>())
            .field("post_construct", &self.post_construct.len())
            .field("pre_destruct", &self.pre_destruct.len())
            .finish()
    }
}

/// Registrar for a layer `L` embedded in a parent object `P`.
///
/// Obtained from [`Hooks::layer`]. Registrations land in the parent's
/// sequences, so ordering across layers follows construction order.
pub struct LayerHooks<'a, P: ?Sized + 'static, L: ?Sized + 'static> {
    /// Registrar of the enclosing object.
    parent: &'a mut dyn Hooks<P>,
    /// Layer name reported in logs and failures.
    name: &'static str,
    /// Reaches this layer from the enclosing object.
    project: fn(&P) -> &L,
}

impl<P: ?Sized + 'static, L: ?Sized + 'static> sealed::Sealed for LayerHooks<'_, P, L> {
    fn path(&self) -> String {
        format!("{}.{}", self.parent.path(), self.name)
    }

    fn claim(&mut self, path: &str) -> LifecycleResult<()> {
        self.parent.claim(path)
    }
}

impl<P: ?Sized + 'static, L: ?Sized + 'static> Hooks<L> for LayerHooks<'_, P, L> {
    fn layer_name(&self) -> &'static str {
        self.name
    }

    fn push_post_construct(&mut self, action: HookAction<L>) {
        self.parent.push_post_construct(action.project(self.project));
    }

    fn push_pre_destruct(&mut self, action: HookAction<L>) {
        self.parent.push_pre_destruct(action.project(self.project));
    }
}

impl<P: ?Sized + 'static, L: ?Sized + 'static> std::fmt::Debug for LayerHooks<'_, P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerHooks")
            .field("parent", &type_name::<P>())
            .field("layer", &self.name)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Pair {
        left: u8,
        right: u8,
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn push(log: &Log, entry: String) -> LifecycleResult<()> {
        log.borrow_mut().push(entry);
        Ok(())
    }

    #[test]
    fn test_registration_appends_in_order() {
        let log: Log = Rc::default();
        let mut registry = HookRegistry::<Pair>::new();

        {
            let mut left = registry.layer("left", |p: &Pair| &p.left);
            let l = log.clone();
            left.register_post_construct(move |v| push(&l, format!("left={v}")));
        }
        {
            let mut right = registry.layer("right", |p: &Pair| &p.right);
            let l = log.clone();
            right.register_post_construct(move |v| push(&l, format!("right={v}")));
        }
        let l = log.clone();
        registry.register_post_construct(move |p| push(&l, format!("pair={}", p.left + p.right)));

        assert_eq!(registry.post_construct_len(), 3);
        assert_eq!(registry.pre_destruct_len(), 0);

        let fired = registry
            .run_post_construct_hooks(&Pair { left: 1, right: 2 }, &TeardownConfig::default())
            .expect("hooks succeed");

        assert_eq!(fired, 3);
        assert_eq!(*log.borrow(), vec!["left=1", "right=2", "pair=3"]);
        assert_eq!(registry.post_construct_len(), 0);
    }

    #[test]
    fn test_pre_destruct_runs_reversed_and_continues_after_failure() {
        let log: Log = Rc::default();
        let mut registry = HookRegistry::<Pair>::new();

        for name in ["a", "b", "c"] {
            let l = log.clone();
            registry.push_pre_destruct(HookAction::new(name, move |_| {
                l.borrow_mut().push(name.to_string());
                if name == "b" {
                    Err(LifecycleError::internal("b refused"))
                } else {
                    Ok(())
                }
            }));
        }

        let report = registry
            .run_pre_destruct_hooks(&Pair { left: 0, right: 0 }, &TeardownConfig::default());

        assert_eq!(*log.borrow(), vec!["c", "b", "a"]);
        assert_eq!(report.fired, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].layer, "b");
    }

    #[test]
    fn test_post_construct_stops_at_first_failure() {
        let log: Log = Rc::default();
        let mut registry = HookRegistry::<Pair>::new();

        for name in ["first", "broken", "never"] {
            let l = log.clone();
            registry.push_post_construct(HookAction::new(name, move |_| {
                l.borrow_mut().push(name.to_string());
                if name == "broken" {
                    Err(LifecycleError::internal("nope"))
                } else {
                    Ok(())
                }
            }));
        }

        let err = registry
            .run_post_construct_hooks(&Pair { left: 0, right: 0 }, &TeardownConfig::default())
            .unwrap_err();

        assert!(err.is(ErrorKind::PostConstruct));
        assert!(err.message.contains("layer 'broken'"));
        assert_eq!(*log.borrow(), vec!["first", "broken"]);
    }

    #[test]
    fn test_gate_is_minted_once_per_layer_path() {
        let mut registry = HookRegistry::<Pair>::new();

        let left = registry
            .layer("left", |p: &Pair| &p.left)
            .gate()
            .expect("first left");
        assert!(left.path().ends_with("Pair.left"));

        let err = registry
            .layer("left", |p: &Pair| &p.left)
            .gate()
            .unwrap_err();
        assert!(err.is(ErrorKind::Construction));
        assert!(err.message.contains("already constructed"));

        assert!(registry.layer("right", |p: &Pair| &p.right).gate().is_ok());

        let root = registry.gate().expect("root");
        assert!(registry.verify_gate(&root).is_ok());
        assert!(registry.gate().is_err());
    }

    #[test]
    fn test_layer_gate_does_not_pass_for_the_object() {
        let mut registry = HookRegistry::<u8>::new();
        let layer = registry.layer("itself", |v: &u8| v).gate().expect("layer");
        let as_object = ConstructionGate::<u8>::new(layer.path().to_string());

        let err = registry.verify_gate(&as_object).unwrap_err();
        assert!(err.is(ErrorKind::Construction));
    }

    #[test]
    fn test_uncaught_panic_resumes_after_every_hook_fired() {
        let log: Log = Rc::default();
        let mut registry = HookRegistry::<Pair>::new();

        for name in ["PD0", "PD1", "PD2"] {
            let l = log.clone();
            registry.push_pre_destruct(HookAction::new(name, move |_| {
                l.borrow_mut().push(name.to_string());
                if name == "PD1" {
                    panic!("middle hook exploded");
                }
                Ok(())
            }));
        }

        let config = TeardownConfig {
            catch_panics: false,
            trace_hooks: false,
        };
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            registry.run_pre_destruct_hooks(&Pair { left: 0, right: 0 }, &config)
        }));

        let payload = outcome.expect_err("panic resumes");
        assert_eq!(
            payload.downcast_ref::<&str>(),
            Some(&"middle hook exploded")
        );
        assert_eq!(*log.borrow(), vec!["PD2", "PD1", "PD0"]);
    }

    #[test]
    fn test_panicking_pre_destruct_hook_is_reported() {
        let mut registry = HookRegistry::<Pair>::new();
        registry.push_pre_destruct(HookAction::new("fine", |_| Ok(())));
        registry.push_pre_destruct(HookAction::new("explodes", |_| panic!("boom")));

        let report = registry
            .run_pre_destruct_hooks(&Pair { left: 0, right: 0 }, &TeardownConfig::default());

        assert_eq!(report.fired, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.message.contains("boom"));
    }
}
