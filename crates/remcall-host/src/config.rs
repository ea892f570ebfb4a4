use remcall_kernel::KernelConfig;

pub const ENV_EVENTUAL_BATCH: &str = "REMCALL_EVENTUAL_BATCH";
pub const ENV_TENSOR_NAMESPACE: &str = "REMCALL_TENSOR_NAMESPACE";
pub const ENV_PLAN_DEPTH: &str = "REMCALL_PLAN_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Pending eventual messages that trigger a flush on dispatch. Zero
    /// disables automatic flushing.
    pub eventual_batch_limit: usize,
    pub kernel: KernelConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            eventual_batch_limit: 64,
            kernel: KernelConfig::default(),
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `REMCALL_*` environment variables. Malformed
    /// numbers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`HostConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(limit) = parse_number(&lookup, ENV_EVENTUAL_BATCH) {
            config.eventual_batch_limit = limit;
        }
        if let Some(depth) = parse_number(&lookup, ENV_PLAN_DEPTH) {
            config.kernel.plan_depth_limit = depth;
        }
        if let Some(namespace) = lookup(ENV_TENSOR_NAMESPACE).filter(|ns| !ns.is_empty()) {
            config.kernel.tensor_namespace = namespace;
        }
        config
    }
}

fn parse_number(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("ignoring {name}={raw:?}: {err}");
            None
        }
    }
}
