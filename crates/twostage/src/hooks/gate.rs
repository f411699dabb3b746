//! Construction gate tokens.

use std::fmt;
use std::marker::PhantomData;

/// Proof that a value of `L` was built under a registrar.
///
/// Only a [`Hooks`](super::Hooks) registrar can mint one, and each layer of
/// an object can mint it once. A [`Staged`](crate::wrapper::Staged) type
/// stores its gate as a field, so even its own module cannot write a struct
/// literal outside `construct`:
///
/// ```compile_fail
/// use twostage::prelude::*;
///
/// struct Loose {
///     gate: ConstructionGate<Loose>,
/// }
///
/// let _loose = Loose { gate: ConstructionGate::new("loose".to_string()) };
/// ```
pub struct ConstructionGate<L: ?Sized + 'static> {
    /// Layer path of the registrar that minted this gate.
    path: String,
    _layer: PhantomData<fn(&L)>,
}

impl<L: ?Sized + 'static> ConstructionGate<L> {
    pub(crate) fn new(path: String) -> Self {
        Self {
            path,
            _layer: PhantomData,
        }
    }

    /// Layer path of the registrar that minted this gate,
    /// e.g. `app::Billing.endpoint`.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<L: ?Sized + 'static> fmt::Debug for ConstructionGate<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstructionGate").field(&self.path).finish()
    }
}
