//! Prelude for convenient imports.

pub use twostage_core::config::teardown::TeardownConfig;
pub use twostage_core::{ErrorKind, LifecycleError, LifecycleResult};

pub use crate::hooks::action::{HookAction, HookFailure, TeardownFailures, TeardownReport};
pub use crate::hooks::driver::Phase;
pub use crate::hooks::gate::ConstructionGate;
pub use crate::hooks::registry::{HookRegistry, Hooks, LayerHooks};
pub use crate::restricted::{AllowList, Restricted};
pub use crate::singleton::{ShutdownGuard, Singleton, Stop};
pub use crate::wrapper::{Staged, TwoStage};

pub use crate::access_key;
