use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Uid;

/// Location of a node in the network/domain/device/vm hierarchy.
///
/// Every level is optional; the most specific present level is the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Uid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<Uid>,
}

impl Address {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(mut self, id: Uid) -> Self {
        self.network = Some(id);
        self
    }

    pub fn with_domain(mut self, id: Uid) -> Self {
        self.domain = Some(id);
        self
    }

    pub fn with_device(mut self, id: Uid) -> Self {
        self.device = Some(id);
        self
    }

    pub fn with_vm(mut self, id: Uid) -> Self {
        self.vm = Some(id);
        self
    }

}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels = [
            ("network", self.network),
            ("domain", self.domain),
            ("device", self.device),
            ("vm", self.vm),
        ];
        let mut first = true;
        for (label, id) in levels {
            if let Some(id) = id {
                if !first {
                    f.write_str("/")?;
                }
                write!(f, "{label}:{}", id.short())?;
                first = false;
            }
        }
        if first {
            f.write_str("<local>")?;
        }
        Ok(())
    }
}
