//! # twostage
//!
//! Two-stage construction and destruction for layered types. Provides:
//!
//! - A per-object hook registry that every layer of a type registers into
//!   while the type is being constructed
//! - A construction driver firing post-construct hooks once the complete
//!   object exists, and pre-destruct hooks before any part of it is dropped
//! - [`TwoStage`], the only way to build a hook-bearing type
//! - [`Restricted`], a `TwoStage` only an allow-list of callers may build
//! - [`Singleton`], a lazily created process-wide holder with a shutdown
//!   notification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use twostage::prelude::*;
//!
//! struct Endpoint {
//!     gate: ConstructionGate<Self>,
//!     name: String,
//! }
//!
//! impl Staged for Endpoint {
//!     type Args = String;
//!
//!     fn construct<H: Hooks<Self>>(hooks: &mut H, name: String) -> LifecycleResult<Self> {
//!         let gate = hooks.gate()?;
//!         hooks.register_post_construct(|e| directory().add(&e.name));
//!         hooks.register_pre_destruct(|e| directory().remove(&e.name));
//!         Ok(Self { gate, name })
//!     }
//!
//!     fn gate(&self) -> &ConstructionGate<Self> {
//!         &self.gate
//!     }
//! }
//!
//! let endpoint = TwoStage::<Endpoint>::new("billing".to_string())?;
//! ```
//!
//! Layers embedded in a larger type register through [`Hooks::layer`], so
//! their hooks fire in constructor order after the outermost constructor
//! returns, and in reverse order before the outermost value is dropped.
//!
//! Hook-bearing types cannot be built outside a wrapper. Each one stores a
//! [`ConstructionGate`] that only a registrar can mint, the registrar is
//! sealed, and only wrappers can create one.
//!
//! ```compile_fail
//! use twostage::prelude::*;
//!
//! struct Loose {
//!     gate: ConstructionGate<Self>,
//! }
//!
//! impl Staged for Loose {
//!     type Args = ();
//!
//!     fn construct<H: Hooks<Self>>(hooks: &mut H, _: ()) -> LifecycleResult<Self> {
//!         Ok(Loose { gate: hooks.gate()? })
//!     }
//!
//!     fn gate(&self) -> &ConstructionGate<Self> {
//!         &self.gate
//!     }
//! }
//!
//! let mut registry = HookRegistry::<Loose>::new();
//! let _loose = Loose::construct(&mut registry, ());
//! ```

pub mod hooks;
pub mod macros;
pub mod prelude;
pub mod restricted;
pub mod singleton;
pub mod wrapper;

pub use hooks::{
    ConstructionGate, HookAction, HookRegistry, Hooks, LayerHooks, Phase, TeardownReport,
};
pub use restricted::{AllowList, Restricted};
pub use singleton::{ShutdownGuard, Singleton, Stop};
pub use wrapper::{Staged, TwoStage};
