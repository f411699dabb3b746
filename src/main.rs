//! Two-stage lifecycle demo
//!
//! Builds a small service hierarchy whose layers announce themselves in a
//! process-wide service directory once the whole service exists, and
//! withdraw before any part of it is torn down.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{EnvFilter, fmt};

use twostage::prelude::*;
use twostage_core::config::LifecycleConfig;

fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config) {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> LifecycleResult<LifecycleConfig> {
    let config_path =
        std::env::var("TWOSTAGE_CONFIG").unwrap_or_else(|_| "config/twostage.toml".to_string());

    LifecycleConfig::load(&config_path)
        .map_err(|e| LifecycleError::configuration(format!("Config load error: {}", e)))
}

/// Initialize tracing/logging
fn init_logging(config: &LifecycleConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Process-wide registry of reachable services.
#[derive(Debug, Default)]
struct ServiceDirectory {
    entries: Mutex<BTreeMap<String, String>>,
    closed: AtomicBool,
}

static DIRECTORY: Singleton<ServiceDirectory> = Singleton::new();

impl ServiceDirectory {
    fn announce(&self, name: &str, address: &str) -> LifecycleResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LifecycleError::internal(format!(
                "directory closed, cannot announce '{name}'"
            )));
        }
        self.lock()?.insert(name.to_string(), address.to_string());
        tracing::info!(service = name, address, "Service announced");
        Ok(())
    }

    fn withdraw(&self, name: &str) -> LifecycleResult<()> {
        if self.lock()?.remove(name).is_none() {
            return Err(LifecycleError::internal(format!(
                "service '{name}' was never announced"
            )));
        }
        tracing::info!(service = name, "Service withdrawn");
        Ok(())
    }

    fn snapshot(&self) -> LifecycleResult<Vec<(String, String)>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn lock(&self) -> LifecycleResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| LifecycleError::internal("service directory lock poisoned"))
    }
}

impl Stop for ServiceDirectory {
    fn stop(&self) {
        self.closed.store(true, Ordering::Release);
        let remaining = self.entries.lock().map(|e| e.len()).unwrap_or_default();
        tracing::info!(remaining, "Service directory closed");
    }
}

/// Network-facing layer: announces its address once the service is complete.
#[derive(Debug)]
struct Endpoint {
    gate: ConstructionGate<Self>,
    name: String,
    address: String,
}

impl Staged for Endpoint {
    type Args = (String, String);

    fn construct<H: Hooks<Self>>(
        hooks: &mut H,
        (name, address): Self::Args,
    ) -> LifecycleResult<Self> {
        let gate = hooks.gate()?;
        hooks.register_post_construct(|e| DIRECTORY.instance().announce(&e.name, &e.address));
        hooks.register_pre_destruct(|e| DIRECTORY.instance().withdraw(&e.name));
        Ok(Self {
            gate,
            name,
            address,
        })
    }

    fn gate(&self) -> &ConstructionGate<Self> {
        &self.gate
    }
}

/// Health layer: announces a probe endpoint next to the service.
#[derive(Debug)]
struct HealthProbe {
    gate: ConstructionGate<Self>,
    path: String,
}

impl Staged for HealthProbe {
    type Args = String;

    fn construct<H: Hooks<Self>>(hooks: &mut H, path: String) -> LifecycleResult<Self> {
        let gate = hooks.gate()?;
        hooks.register_post_construct(|p| DIRECTORY.instance().announce(&p.path, "health"));
        hooks.register_pre_destruct(|p| DIRECTORY.instance().withdraw(&p.path));
        Ok(Self { gate, path })
    }

    fn gate(&self) -> &ConstructionGate<Self> {
        &self.gate
    }
}

/// A service assembled from an endpoint and a health probe.
#[derive(Debug)]
struct BillingService {
    gate: ConstructionGate<Self>,
    probe: HealthProbe,
    endpoint: Endpoint,
}

impl Staged for BillingService {
    type Args = String;

    fn construct<H: Hooks<Self>>(hooks: &mut H, address: String) -> LifecycleResult<Self> {
        let gate = hooks.gate()?;
        let endpoint = Endpoint::construct(
            &mut hooks.layer("endpoint", |s| &s.endpoint),
            ("billing".to_string(), address),
        )?;
        let probe = HealthProbe::construct(
            &mut hooks.layer("probe", |s| &s.probe),
            "billing/health".to_string(),
        )?;

        hooks.register_post_construct(|s| {
            tracing::info!(endpoint = %s.endpoint.address, probe = %s.probe.path, "Billing online");
            Ok(())
        });

        Ok(Self {
            gate,
            probe,
            endpoint,
        })
    }

    fn gate(&self) -> &ConstructionGate<Self> {
        &self.gate
    }
}

mod supervisor {
    use super::*;

    access_key!(
        /// Only the supervisor may start billing services.
        pub struct SupervisorKey;
    );

    pub type Billing = Restricted<BillingService, (SupervisorKey,)>;

    pub fn start(config: &TeardownConfig, address: &str) -> LifecycleResult<Billing> {
        Billing::with_config(SupervisorKey::new(), *config, address.to_string())
    }
}

/// Main demo run function
fn run(config: LifecycleConfig) -> LifecycleResult<()> {
    tracing::info!("Starting twostage demo v{}", env!("CARGO_PKG_VERSION"));

    let _directory_guard = DIRECTORY.shutdown_guard();

    let billing = supervisor::start(&config.teardown, "127.0.0.1:7100")?;
    for (name, address) in DIRECTORY.instance().snapshot()? {
        tracing::info!(service = %name, address = %address, "Directory entry");
    }
    tracing::info!(phase = ?billing.phase(), endpoint = %billing.endpoint.name, "Billing running");

    billing.close()?;

    let remaining = DIRECTORY.instance().snapshot()?.len();
    tracing::info!(remaining, "Demo finished");
    Ok(())
}
