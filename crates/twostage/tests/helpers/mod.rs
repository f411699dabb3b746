//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use twostage::prelude::*;

/// Records lifecycle events in the order they happen.
#[derive(Debug, Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn record(&self, event: impl Into<String>) {
        self.0.borrow_mut().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Events joined by single spaces, e.g. `"0C 0PC 0PD 0D"`.
    pub fn joined(&self) -> String {
        self.0.borrow().join(" ")
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Routes `tracing` output to the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("twostage=trace")
        .with_test_writer()
        .try_init();
}

/// Anything that can note lifecycle events under its own tag.
pub trait Recorder {
    fn tag(&self) -> &str;
    fn trace(&self) -> &Trace;

    fn record(&self, what: &str) {
        self.trace().record(format!("{}{}", self.tag(), what));
    }
}

/// A layer registering one post-construct and one pre-destruct hook.
#[derive(Debug)]
pub struct Tagged {
    gate: ConstructionGate<Self>,
    tag: &'static str,
    trace: Trace,
}

impl Recorder for Tagged {
    fn tag(&self) -> &str {
        self.tag
    }

    fn trace(&self) -> &Trace {
        &self.trace
    }
}

impl Staged for Tagged {
    type Args = (&'static str, Trace);

    fn construct<H: Hooks<Self>>(hooks: &mut H, (tag, trace): Self::Args) -> LifecycleResult<Self> {
        let gate = hooks.gate()?;
        hooks.register_post_construct(|this| {
            this.record("PC");
            Ok(())
        });
        hooks.register_pre_destruct(|this| {
            this.record("PD");
            Ok(())
        });

        let this = Self { gate, tag, trace };
        this.record("C");
        Ok(this)
    }

    fn gate(&self) -> &ConstructionGate<Self> {
        &self.gate
    }
}

impl Drop for Tagged {
    fn drop(&mut self) {
        self.record("D");
    }
}

/// Two `Tagged` layers, "0" and "1", composed into an outer layer "M".
#[derive(Debug)]
pub struct Composite {
    gate: ConstructionGate<Self>,
    trace: Trace,
    // Fields drop in declaration order, so layers are declared last-built first.
    one: Tagged,
    zero: Tagged,
}

impl Recorder for Composite {
    fn tag(&self) -> &str {
        "M"
    }

    fn trace(&self) -> &Trace {
        &self.trace
    }
}

impl Staged for Composite {
    type Args = Trace;

    fn construct<H: Hooks<Self>>(hooks: &mut H, trace: Trace) -> LifecycleResult<Self> {
        let gate = hooks.gate()?;
        let zero = Tagged::construct(&mut hooks.layer("zero", |m| &m.zero), ("0", trace.clone()))?;
        let one = Tagged::construct(&mut hooks.layer("one", |m| &m.one), ("1", trace.clone()))?;

        hooks.register_post_construct(|this| {
            this.record("PC");
            Ok(())
        });
        hooks.register_pre_destruct(|this| {
            this.record("PD");
            Ok(())
        });

        let this = Self {
            gate,
            trace,
            one,
            zero,
        };
        this.record("C");
        Ok(this)
    }

    fn gate(&self) -> &ConstructionGate<Self> {
        &self.gate
    }
}

impl Drop for Composite {
    fn drop(&mut self) {
        self.record("D");
    }
}
