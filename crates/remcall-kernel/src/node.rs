use std::fmt;
use std::sync::Arc;

use remcall_store::{DynStore, MemStore, ObjectStore};
use remcall_types::{PrincipalKey, Uid};

use crate::builtins;
use crate::capability::CapabilityTable;
use crate::error::KernelError;
use crate::mutation::DEFAULT_TENSOR_NAMESPACE;
use crate::normalize::{ArgNormalizer, Upcast};
use crate::tags::{InheritTags, TagPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    /// Path prefix of tensor methods, used for mutation classification.
    pub tensor_namespace: String,
    /// Maximum nesting of plan calls inside plan calls.
    pub plan_depth_limit: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            tensor_namespace: DEFAULT_TENSOR_NAMESPACE.to_string(),
            plan_depth_limit: 16,
        }
    }
}

/// Everything an action needs to execute on one node.
pub struct Node {
    id: Uid,
    name: String,
    root_key: PrincipalKey,
    store: DynStore,
    capabilities: Arc<dyn CapabilityTable>,
    normalizer: Arc<dyn ArgNormalizer>,
    tags: Arc<dyn TagPolicy>,
    config: KernelConfig,
}

impl Node {
    pub fn builder(name: impl Into<String>, root_key: PrincipalKey) -> NodeBuilder {
        NodeBuilder::new(name, root_key)
    }

    pub fn id(&self) -> Uid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Principal allowed to read every object on this node.
    pub fn root_key(&self) -> &PrincipalKey {
        &self.root_key
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn capabilities(&self) -> &dyn CapabilityTable {
        self.capabilities.as_ref()
    }

    pub fn normalizer(&self) -> &dyn ArgNormalizer {
        self.normalizer.as_ref()
    }

    pub fn tags(&self) -> &dyn TagPolicy {
        self.tags.as_ref()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("root_key", &self.root_key)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub struct NodeBuilder {
    name: String,
    root_key: PrincipalKey,
    store: Option<DynStore>,
    capabilities: Option<Arc<dyn CapabilityTable>>,
    normalizer: Arc<dyn ArgNormalizer>,
    tags: Arc<dyn TagPolicy>,
    config: KernelConfig,
}

impl NodeBuilder {
    pub fn new(name: impl Into<String>, root_key: PrincipalKey) -> Self {
        Self {
            name: name.into(),
            root_key,
            store: None,
            capabilities: None,
            normalizer: Arc::new(Upcast),
            tags: Arc::new(InheritTags),
            config: KernelConfig::default(),
        }
    }

    pub fn with_store(mut self, store: DynStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_capabilities(mut self, capabilities: Arc<dyn CapabilityTable>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ArgNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_tag_policy(mut self, tags: Arc<dyn TagPolicy>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Missing pieces default to an empty in-memory store and the builtin
    /// capability library.
    pub fn build(self) -> Node {
        Node {
            id: Uid::generate(),
            name: self.name,
            root_key: self.root_key,
            store: self.store.unwrap_or_else(|| Arc::new(MemStore::new())),
            capabilities: self
                .capabilities
                .unwrap_or_else(|| Arc::new(builtins::standard_library())),
            normalizer: self.normalizer,
            tags: self.tags,
            config: self.config,
        }
    }
}

/// Execution context threaded through one top-level action, including the
/// plan calls it makes.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    node: &'a Node,
    principal: &'a PrincipalKey,
    depth: usize,
}

impl<'a> CallContext<'a> {
    pub fn root(node: &'a Node, principal: &'a PrincipalKey) -> Self {
        Self {
            node,
            principal,
            depth: 0,
        }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn principal(&self) -> &'a PrincipalKey {
        self.principal
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for a plan call made from this one.
    pub fn nested(&self) -> Result<Self, KernelError> {
        let limit = self.node.config.plan_depth_limit;
        if self.depth >= limit {
            return Err(KernelError::PlanDepthExceeded(limit));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..*self
        })
    }
}
