//! Lazily created process-wide instances with a shutdown notification.
//!
//! A [`Singleton`] is meant to live in a `static`. The instance is created
//! on first access and is never dropped; instead, [`Singleton::shutdown`]
//! delivers [`Stop::stop`] once so the instance can wind down background
//! work. It must stay callable afterwards, since late users may still reach
//! it.

use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

/// Shutdown notification for singleton instances.
pub trait Stop {
    /// Called once when the process shuts down.
    ///
    /// The instance must remain valid; calls made after `stop` must not
    /// misbehave.
    fn stop(&self);
}

/// Holder of a lazily created process-wide instance.
pub struct Singleton<T> {
    /// The instance, once created.
    cell: OnceLock<T>,
    /// Creates the instance on first access.
    init: fn() -> T,
    /// Whether `stop` has been delivered.
    stopped: AtomicBool,
}

impl<T: Default> Singleton<T> {
    /// Creates a holder that builds the instance with `T::default`.
    pub const fn new() -> Self {
        Self::with_init(T::default)
    }
}

impl<T: Default> Default for Singleton<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Singleton<T> {
    /// Creates a holder that builds the instance with `init`.
    pub const fn with_init(init: fn() -> T) -> Self {
        Self {
            cell: OnceLock::new(),
            init,
            stopped: AtomicBool::new(false),
        }
    }

    /// Returns the instance, creating it on first access.
    pub fn instance(&self) -> &T {
        self.cell.get_or_init(self.init)
    }

    /// Returns the instance if it has been created.
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Returns `true` once `stop` has been delivered.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl<T: Stop> Singleton<T> {
    /// Delivers `stop` to the instance, at most once.
    ///
    /// Returns `true` if this call delivered it. A holder whose instance was
    /// never created has nothing to stop.
    pub fn shutdown(&self) -> bool {
        let Some(instance) = self.cell.get() else {
            return false;
        };

        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }

        info!(singleton = std::any::type_name::<T>(), "Stopping singleton");
        instance.stop();
        true
    }

    /// Returns a guard that calls [`shutdown`](Self::shutdown) when dropped.
    ///
    /// Keep it alive for the duration of `main`.
    pub fn shutdown_guard(&'static self) -> ShutdownGuard<T> {
        ShutdownGuard { singleton: self }
    }
}

impl<T: fmt::Debug> fmt::Debug for Singleton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Singleton")
            .field("instance", &self.cell.get())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Stops a singleton when dropped.
#[must_use = "the singleton is stopped as soon as the guard is dropped"]
pub struct ShutdownGuard<T: Stop + 'static> {
    singleton: &'static Singleton<T>,
}

impl<T: Stop + 'static> Drop for ShutdownGuard<T> {
    fn drop(&mut self) {
        self.singleton.shutdown();
    }
}

impl<T: Stop + 'static> fmt::Debug for ShutdownGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownGuard")
            .field("singleton", &std::any::type_name::<T>())
            .finish()
    }
}
