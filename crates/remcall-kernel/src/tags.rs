use indexmap::IndexMap;
use remcall_types::StoredObject;

/// Hook letting naming/provenance metadata flow from inputs to a result.
pub trait TagPolicy: Send + Sync {
    fn inherit(
        &self,
        path: &str,
        result: &mut StoredObject,
        receiver: Option<&StoredObject>,
        args: &[StoredObject],
        kwargs: &IndexMap<String, StoredObject>,
    );
}

/// Copies the inputs' tags onto the result, then records the method name.
/// Results of untagged inputs stay untagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritTags;

impl TagPolicy for InheritTags {
    fn inherit(
        &self,
        path: &str,
        result: &mut StoredObject,
        receiver: Option<&StoredObject>,
        args: &[StoredObject],
        kwargs: &IndexMap<String, StoredObject>,
    ) {
        let mut inherited: Vec<&String> = Vec::new();
        let sources = receiver.into_iter().chain(args).chain(kwargs.values());
        for tag in sources.flat_map(|obj| obj.tags.iter()) {
            if !inherited.contains(&tag) {
                inherited.push(tag);
            }
        }
        if inherited.is_empty() {
            return;
        }
        for tag in inherited {
            if !result.tags.contains(tag) {
                result.tags.push(tag.clone());
            }
        }
        let method = path.rsplit('.').next().unwrap_or(path);
        result.tags.push(method.to_string());
    }
}
