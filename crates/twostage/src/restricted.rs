//! Restricted wrapper: a [`TwoStage`] only an allow-list of callers may build.
//!
//! Caller identity is proven by an access key: a zero-sized type whose only
//! field is private, so only the module declaring it (see
//! [`access_key!`](crate::access_key)) can mint one. The allow-list is a tuple
//! of one to four key types. Presenting a key outside the list fails to
//! compile.
//!
//! ```compile_fail
//! use twostage::prelude::*;
//!
//! struct Ledger {
//!     gate: ConstructionGate<Self>,
//! }
//!
//! impl Staged for Ledger {
//!     type Args = ();
//!
//!     fn construct<H: Hooks<Self>>(hooks: &mut H, _: ()) -> LifecycleResult<Self> {
//!         Ok(Ledger { gate: hooks.gate()? })
//!     }
//!
//!     fn gate(&self) -> &ConstructionGate<Self> {
//!         &self.gate
//!     }
//! }
//!
//! mod bank {
//!     twostage::access_key!(pub struct BankKey;);
//! }
//!
//! twostage::access_key!(struct IntruderKey;);
//!
//! // `IntruderKey` is not in the allow-list.
//! let _ledger = Restricted::<Ledger, (bank::BankKey,)>::new(IntruderKey::new(), ());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use twostage_core::LifecycleResult;
use twostage_core::config::teardown::TeardownConfig;

use crate::hooks::action::TeardownReport;
use crate::hooks::driver::Phase;
use crate::wrapper::{Staged, TwoStage};

mod sealed {
    pub trait Sealed<K, I> {}
}

/// Position markers used to pick which tuple slot admits a key.
///
/// They are inferred by the compiler and never named by callers.
pub mod index {
    /// First slot.
    pub enum First {}
    /// Second slot.
    pub enum Second {}
    /// Third slot.
    pub enum Third {}
    /// Fourth slot.
    pub enum Fourth {}
}

/// Implemented by allow-list tuples for every key type they contain.
///
/// `I` records the slot the key occupies so that the impls for different
/// slots never overlap. Sealed: allow-lists cannot be extended after the fact.
pub trait AllowList<K, I>: sealed::Sealed<K, I> {}

macro_rules! allow_list {
    ($( ($($all:ident),+) => $key:ident @ $slot:ident; )+) => {
        $(
            impl<$($all),+> sealed::Sealed<$key, index::$slot> for ($($all,)+) {}
            impl<$($all),+> AllowList<$key, index::$slot> for ($($all,)+) {}
        )+
    };
}

allow_list! {
    (K0) => K0 @ First;
    (K0, K1) => K0 @ First;
    (K0, K1) => K1 @ Second;
    (K0, K1, K2) => K0 @ First;
    (K0, K1, K2) => K1 @ Second;
    (K0, K1, K2) => K2 @ Third;
    (K0, K1, K2, K3) => K0 @ First;
    (K0, K1, K2, K3) => K1 @ Second;
    (K0, K1, K2, K3) => K2 @ Third;
    (K0, K1, K2, K3) => K3 @ Fourth;
}

/// A [`TwoStage`] whose construction requires a key from the allow-list `A`.
///
/// Once built it behaves exactly like the unrestricted wrapper.
pub struct Restricted<T: 'static, A> {
    /// The underlying wrapper.
    inner: TwoStage<T>,
    /// The allow-list, carried only at the type level.
    _allowed: PhantomData<fn() -> A>,
}

impl<T: Staged, A> Restricted<T, A> {
    /// Constructs `T` on behalf of the holder of `key`.
    pub fn new<K, I>(key: K, args: T::Args) -> LifecycleResult<Self>
    where
        A: AllowList<K, I>,
    {
        Self::with_config(key, TeardownConfig::default(), args)
    }

    /// Constructs `T` with explicit teardown settings.
    pub fn with_config<K, I>(
        _key: K,
        config: TeardownConfig,
        args: T::Args,
    ) -> LifecycleResult<Self>
    where
        A: AllowList<K, I>,
    {
        Ok(Self {
            inner: TwoStage::with_config(config, args)?,
            _allowed: PhantomData,
        })
    }
}

impl<T: 'static, A> Restricted<T, A> {
    /// Fires the pre-destruct phase, drops the value, and reports failures.
    pub fn close(self) -> LifecycleResult<()> {
        self.inner.close()
    }

    /// Like [`close`](Self::close) but returns the full report.
    pub fn close_with_report(self) -> TeardownReport {
        self.inner.close_with_report()
    }

    /// Returns the lifecycle phase of the wrapped value.
    pub fn phase(&self) -> Phase {
        self.inner.phase()
    }

    /// Returns a reference to the wrapped value.
    pub fn get(&self) -> &T {
        self.inner.get()
    }
}

impl<T: 'static, A> Deref for Restricted<T, A> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner.get()
    }
}

impl<T: 'static, A> AsRef<T> for Restricted<T, A> {
    fn as_ref(&self) -> &T {
        self.inner.get()
    }
}

impl<T: fmt::Debug + 'static, A> fmt::Debug for Restricted<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restricted")
            .field("allowed", &std::any::type_name::<A>())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::gate::ConstructionGate;
    use crate::hooks::registry::Hooks;

    struct Vault {
        gate: ConstructionGate<Self>,
        sealed: bool,
    }

    impl Staged for Vault {
        type Args = bool;

        fn construct<H: Hooks<Self>>(hooks: &mut H, sealed: bool) -> LifecycleResult<Self> {
            Ok(Self {
                gate: hooks.gate()?,
                sealed,
            })
        }

        fn gate(&self) -> &ConstructionGate<Self> {
            &self.gate
        }
    }

    mod teller {
        crate::access_key!(pub struct TellerKey;);

        pub fn key() -> TellerKey {
            TellerKey::new()
        }
    }

    mod auditor {
        crate::access_key!(pub struct AuditorKey;);

        pub fn key() -> AuditorKey {
            AuditorKey::new()
        }
    }

    type SharedVault = Restricted<Vault, (teller::TellerKey, auditor::AuditorKey)>;

    #[test]
    fn test_every_listed_key_is_admitted() {
        let by_teller = SharedVault::new(teller::key(), true).expect("teller");
        let by_auditor = SharedVault::new(auditor::key(), false).expect("auditor");

        assert!(by_teller.sealed);
        assert!(!by_auditor.sealed);
        assert_eq!(by_teller.phase(), Phase::Live);
    }

    #[test]
    fn test_single_key_list() {
        let vault = Restricted::<Vault, (auditor::AuditorKey,)>::new(auditor::key(), true)
            .expect("auditor");
        assert!(vault.get().sealed);
        vault.close().expect("close");
    }
}
