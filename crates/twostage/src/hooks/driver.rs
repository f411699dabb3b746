//! Construction driver: pins the two firing points of one object.

use std::any::type_name;

use tracing::{debug, error};
use twostage_core::LifecycleResult;
use twostage_core::config::teardown::TeardownConfig;

use super::action::TeardownReport;
use super::registry::HookRegistry;

/// Lifecycle phase of a wrapped object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing has been built yet.
    Unconstructed,
    /// Layer constructors are running and registering hooks.
    LayersConstructing,
    /// Every layer is built; post-construct hooks have not fired.
    HooksPending,
    /// Post-construct hooks fired; the object is usable.
    Live,
    /// Pre-destruct hooks are firing.
    PreDestructFiring,
    /// Pre-destruct hooks finished; layer destructors are next.
    LayersDestructing,
    /// Every layer is dropped.
    Gone,
}

/// Fires the post-construct phase when it is started and the pre-destruct
/// phase when it is finished, each exactly once.
///
/// A driver is owned by exactly one wrapper and cannot be cloned.
pub struct ConstructionDriver<T: ?Sized + 'static> {
    /// The object's hook storage; only pre-destruct actions remain once live.
    registry: HookRegistry<T>,
    /// Current phase.
    phase: Phase,
    /// Teardown behaviour.
    config: TeardownConfig,
}

impl<T: ?Sized + 'static> ConstructionDriver<T> {
    /// Brings the driver to life against a fully constructed object.
    ///
    /// Fires the post-construct hooks in registration order. On failure the
    /// driver is never created, so no pre-destruct hook of this object will
    /// ever fire.
    pub(crate) fn start(
        mut registry: HookRegistry<T>,
        target: &T,
        config: TeardownConfig,
    ) -> LifecycleResult<Self> {
        debug!(
            object = type_name::<T>(),
            phase = ?Phase::HooksPending,
            post_construct = registry.post_construct_len(),
            pre_destruct = registry.pre_destruct_len(),
            "Object constructed, firing post-construct hooks"
        );

        let fired = registry.run_post_construct_hooks(target, &config)?;

        debug!(
            object = type_name::<T>(),
            phase = ?Phase::Live,
            fired,
            "Object live"
        );

        Ok(Self {
            registry,
            phase: Phase::Live,
            config,
        })
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Fires the pre-destruct hooks in reverse registration order.
    ///
    /// Only the first call does anything; later calls return an empty report.
    pub(crate) fn finish(&mut self, target: &T) -> TeardownReport {
        self.finish_with(target, self.config)
    }

    fn finish_with(&mut self, target: &T, config: TeardownConfig) -> TeardownReport {
        if self.phase != Phase::Live {
            return TeardownReport::default();
        }

        self.phase = Phase::PreDestructFiring;
        debug!(
            object = type_name::<T>(),
            phase = ?self.phase,
            pre_destruct = self.registry.pre_destruct_len(),
            "Firing pre-destruct hooks"
        );

        let report = self.registry.run_pre_destruct_hooks(target, &config);

        self.phase = Phase::LayersDestructing;
        debug!(
            object = type_name::<T>(),
            phase = ?self.phase,
            fired = report.fired,
            failed = report.failures.len(),
            "Pre-destruct hooks finished"
        );

        report
    }

    /// Fires the pre-destruct hooks and logs every failure.
    ///
    /// Used from `Drop`, where failures cannot be returned. Panics are
    /// always caught while the thread is already unwinding.
    pub(crate) fn finish_and_log(&mut self, target: &T) {
        let mut config = self.config;
        if std::thread::panicking() {
            config.catch_panics = true;
        }

        let report = self.finish_with(target, config);
        for failure in &report.failures {
            error!(
                object = type_name::<T>(),
                layer = failure.layer,
                index = failure.index,
                error = %failure.error,
                "Pre-destruct hook failed during drop"
            );
        }
    }
}

impl<T: ?Sized + 'static> Drop for ConstructionDriver<T> {
    fn drop(&mut self) {
        if self.phase == Phase::LayersDestructing {
            self.phase = Phase::Gone;
            debug!(object = type_name::<T>(), phase = ?self.phase, "Object gone");
        }
    }
}

impl<T: ?Sized + 'static> std::fmt::Debug for ConstructionDriver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructionDriver")
            .field("object", &type_name::<T>())
            .field("phase", &self.phase)
            .field("pending_pre_destruct", &self.registry.pre_destruct_len())
            .finish()
    }
}
