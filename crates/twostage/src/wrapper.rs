//! The sanctioned way to instantiate a hook-bearing type.

use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use tracing::debug;
use twostage_core::config::teardown::TeardownConfig;
use twostage_core::{ErrorKind, LifecycleError, LifecycleResult};

use crate::hooks::action::TeardownReport;
use crate::hooks::driver::{ConstructionDriver, Phase};
use crate::hooks::gate::ConstructionGate;
use crate::hooks::registry::{HookRegistry, Hooks};

/// A type built in two stages.
///
/// `construct` runs while the object is still being assembled and may only
/// register hooks; the hooks fire once the complete object exists. Because
/// [`Hooks`] is sealed, `construct` can only be driven by [`TwoStage`],
/// [`Restricted`](crate::restricted::Restricted), or the `construct` of an
/// enclosing layer.
///
/// The same implementation serves a type built on its own and a type
/// embedded as a layer of another: the enclosing constructor passes a
/// registrar obtained from [`Hooks::layer`].
///
/// The value must keep the [`ConstructionGate`] minted by
/// [`Hooks::gate`]. Since nothing else can produce one, a struct literal
/// outside `construct` does not compile.
pub trait Staged: Sized + 'static {
    /// Constructor arguments, forwarded untouched by the wrappers.
    type Args;

    /// Builds the value and registers its hooks.
    fn construct<H: Hooks<Self>>(hooks: &mut H, args: Self::Args) -> LifecycleResult<Self>;

    /// Returns the gate this value was built with.
    fn gate(&self) -> &ConstructionGate<Self>;
}

/// Owns a fully constructed `T` together with the driver that fires its hooks.
///
/// Post-construct hooks have fired by the time a `TwoStage` is returned.
/// Pre-destruct hooks fire when it is dropped or closed, before `T` itself
/// is dropped. Dereferences to `T` but never hands out `&mut T`: replacing
/// the value in place would bypass both phases.
pub struct TwoStage<T: 'static> {
    /// The wrapped value, dropped once `Drop::drop` has fired the
    /// pre-destruct phase.
    value: T,
    /// Dropped last, after every layer of `value`.
    driver: ConstructionDriver<T>,
}

impl<T: Staged> TwoStage<T> {
    /// Constructs `T` with default teardown settings.
    pub fn new(args: T::Args) -> LifecycleResult<Self> {
        Self::with_config(TeardownConfig::default(), args)
    }

    /// Constructs `T` with explicit teardown settings.
    ///
    /// Fails if `T::construct` returns a value whose gate was minted for one
    /// of its layers rather than for `T` itself.
    pub fn with_config(config: TeardownConfig, args: T::Args) -> LifecycleResult<Self> {
        Self::build(config, |hooks| {
            let value = T::construct(hooks, args)?;
            hooks.verify_gate(value.gate())?;
            Ok(value)
        })
    }
}

impl<T: 'static> TwoStage<T> {
    /// Constructs a value with an ad-hoc constructor.
    ///
    /// `constructor` receives the object's registry and must return the
    /// complete value. If it fails, the queued hooks are discarded unfired.
    pub fn build<F>(config: TeardownConfig, constructor: F) -> LifecycleResult<Self>
    where
        F: FnOnce(&mut HookRegistry<T>) -> LifecycleResult<T>,
    {
        debug!(
            object = type_name::<T>(),
            from = ?Phase::Unconstructed,
            phase = ?Phase::LayersConstructing,
            "Constructing object"
        );

        let mut registry = HookRegistry::new();
        let value = match constructor(&mut registry) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    object = type_name::<T>(),
                    discarded_post_construct = registry.post_construct_len(),
                    discarded_pre_destruct = registry.pre_destruct_len(),
                    error = %e,
                    "Construction failed, discarding queued hooks"
                );
                return Err(construction_error::<T>(e));
            }
        };

        let driver = ConstructionDriver::start(registry, &value, config)?;
        Ok(Self { value, driver })
    }

    /// Fires the pre-destruct phase, drops the value, and reports failures.
    ///
    /// Every pre-destruct hook fires even if earlier ones fail.
    pub fn close(self) -> LifecycleResult<()> {
        self.close_with_report().into_result()
    }

    /// Like [`close`](Self::close) but returns the full report.
    pub fn close_with_report(mut self) -> TeardownReport {
        self.driver.finish(&self.value)
    }

    /// Returns the lifecycle phase of the wrapped value.
    pub fn phase(&self) -> Phase {
        self.driver.phase()
    }

    /// Returns a reference to the wrapped value.
    pub fn get(&self) -> &T {
        &self.value
    }
}

fn construction_error<T>(e: LifecycleError) -> LifecycleError {
    if e.is(ErrorKind::Construction) {
        return e;
    }
    LifecycleError::with_source(
        ErrorKind::Construction,
        format!("failed to construct {}: {e}", type_name::<T>()),
        e,
    )
}

impl<T: 'static> Drop for TwoStage<T> {
    fn drop(&mut self) {
        self.driver.finish_and_log(&self.value);
    }
}

impl<T: 'static> Deref for TwoStage<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: 'static> AsRef<T> for TwoStage<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: 'static> Borrow<T> for TwoStage<T> {
    fn borrow(&self) -> &T {
        &self.value
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for TwoStage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoStage")
            .field("value", &self.value)
            .field("driver", &self.driver)
            .finish()
    }
}
