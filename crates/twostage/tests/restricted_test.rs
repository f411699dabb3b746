//! Integration tests for wrappers restricted to an allow-list of owners.

mod helpers;

use helpers::{Composite, Tagged, Trace};
use twostage::prelude::*;

mod factory {
    use super::*;

    access_key!(
        /// Held only by [`Factory`].
        pub struct FactoryKey;
    );

    pub type Product = Restricted<Tagged, (FactoryKey,)>;

    /// The designated owner of `Tagged` instances.
    pub struct Factory {
        pub product: Product,
    }

    impl Factory {
        pub fn new(trace: Trace) -> LifecycleResult<Self> {
            Ok(Self {
                product: Product::new(FactoryKey::new(), ("0", trace))?,
            })
        }
    }
}

mod pool {
    use super::*;

    access_key!(pub struct PrimaryKey;);
    access_key!(pub struct ReplicaKey;);
    access_key!(pub struct BackupKey;);
    access_key!(pub struct AuditKey;);

    pub type Pooled = Restricted<Composite, (PrimaryKey, ReplicaKey, BackupKey, AuditKey)>;

    pub fn primary(trace: Trace) -> LifecycleResult<Pooled> {
        Pooled::new(PrimaryKey::new(), trace)
    }

    pub fn by_each_owner(trace: &Trace) -> LifecycleResult<Vec<Pooled>> {
        Ok(vec![
            Pooled::new(PrimaryKey::new(), trace.clone())?,
            Pooled::new(ReplicaKey::new(), trace.clone())?,
            Pooled::new(BackupKey::new(), trace.clone())?,
            Pooled::new(AuditKey::new(), trace.clone())?,
        ])
    }
}

#[test]
fn test_allowed_owner_builds_with_same_lifecycle() {
    let trace = Trace::default();

    {
        let factory = factory::Factory::new(trace.clone()).expect("factory");
        assert_eq!(factory.product.phase(), Phase::Live);
        assert_eq!(trace.joined(), "0C 0PC");
    }

    assert_eq!(trace.joined(), "0C 0PC 0PD 0D");
}

#[test]
fn test_restricted_matches_unrestricted_trace() {
    let restricted = Trace::default();
    let unrestricted = Trace::default();

    pool::primary(restricted.clone())
        .expect("restricted")
        .close()
        .expect("close");
    TwoStage::<Composite>::new(unrestricted.clone())
        .expect("unrestricted")
        .close()
        .expect("close");

    assert_eq!(restricted.events(), unrestricted.events());
    assert_eq!(
        restricted.joined(),
        "0C 1C MC 0PC 1PC MPC MPD 1PD 0PD MD 1D 0D"
    );
}

#[test]
fn test_every_listed_owner_is_admitted() {
    let trace = Trace::default();
    let pooled = pool::by_each_owner(&trace).expect("pool");
    assert_eq!(pooled.len(), 4);
    for object in &pooled {
        assert_eq!(object.phase(), Phase::Live);
    }
}
