/// Namespace of tensor methods in capability paths.
pub const DEFAULT_TENSOR_NAMESPACE: &str = "torch.Tensor";

/// Generic call-operator method name.
pub const CALL_OPERATOR: &str = "__call__";

/// Whether a call writes its receiver back, decided from the path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// The callable mutates the stored receiver, which is written back
    /// together with the folded permissions.
    InPlace,
    /// The callable sees a scratch copy; the stored receiver is untouched.
    CopyOnWrite,
}

impl MutationPolicy {
    /// Tensor methods with a trailing underscore (other than the call
    /// operator) mutate, and so does the call operator on anything that is
    /// not a tensor.
    pub fn classify(path: &str, tensor_namespace: &str) -> Self {
        let tensor = path.starts_with(tensor_namespace);
        let call = path.ends_with(CALL_OPERATOR);
        if (tensor && path.ends_with('_') && !call) || (!tensor && call) {
            MutationPolicy::InPlace
        } else {
            MutationPolicy::CopyOnWrite
        }
    }

    pub fn is_in_place(self) -> bool {
        matches!(self, MutationPolicy::InPlace)
    }
}
