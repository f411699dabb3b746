//! Hook system: deferred actions, gate tokens, per-object registry, and the
//! construction driver.

pub mod action;
pub mod driver;
pub mod gate;
pub mod registry;

pub use action::{HookAction, HookFailure, TeardownFailures, TeardownReport};
pub use driver::{ConstructionDriver, Phase};
pub use gate::ConstructionGate;
pub use registry::{HookRegistry, Hooks, LayerHooks};
