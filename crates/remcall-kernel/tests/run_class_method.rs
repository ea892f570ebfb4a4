use std::sync::Arc;

use anyhow::Result;
use remcall_kernel::builtins::standard_library;
use remcall_kernel::{Action, CallShape, CapabilityRegistry, KernelConfig, KernelError, Node};
use remcall_store::{MemStore, ObjectStore, StoreError};
use remcall_types::{
    AccessSet, Address, Identity, Object, Plan, PrincipalKey, Reference, RunClassMethodAction,
    StoredObject, Tensor, Uid, Value,
};

fn key(byte: u8) -> PrincipalKey {
    PrincipalKey::from_bytes([byte; 32])
}

fn readers(keys: &[PrincipalKey]) -> AccessSet {
    keys.iter().map(|key| (*key, Uid::generate())).collect()
}

fn node_with(store: &MemStore, registry: CapabilityRegistry) -> Node {
    Node::builder("alice", key(0))
        .with_store(Arc::new(store.clone()))
        .with_capabilities(Arc::new(registry))
        .build()
}

fn put(store: &MemStore, data: impl Into<Value>, keys: &[PrincipalKey]) -> Result<Reference> {
    let id = Uid::generate();
    store.set(StoredObject::new(id, data.into(), readers(keys)))?;
    Ok(Reference::new(id))
}

fn tensor(data: &[f64]) -> Tensor {
    Tensor::from_vec(data.to_vec())
}

fn keys_of(set: &AccessSet) -> Vec<PrincipalKey> {
    set.keys().copied().collect()
}

fn demo_registry() -> CapabilityRegistry {
    let mut registry = standard_library();
    registry.register_fn("demo.sum", CallShape::Static, |_, args, _| {
        Ok(Value::Int(args.iter().filter_map(Value::as_int).sum()))
    });
    registry.register_fn("demo.Opt.step", CallShape::Bound, |_, _, _| Ok(Value::Int(1)));
    registry.register_fn("demo.patched.step", CallShape::Bound, |_, _, _| Ok(Value::Int(2)));
    registry.register_fn("demo.pinned", CallShape::Static, |_, _, _| {
        Ok(Object::new("demo.Pinned")
            .with_identity(Identity::Pinned(Uid::generate()))
            .into())
    });
    registry
}

#[test]
fn missing_receiver_is_logged_and_leaves_store_untouched() -> Result<()> {
    let store = MemStore::new();
    let arg = put(&store, tensor(&[1.0]), &[key(1)])?;
    let node = node_with(&store, demo_registry());
    let before = store.snapshot()?;

    let dest = Uid::generate();
    let action = RunClassMethodAction::method(
        "torch.Tensor.add_",
        Reference::new(Uid::generate()),
        vec![arg],
        dest,
        Address::new(),
    );
    action.execute_action(&node, &key(1))?;

    assert_eq!(store.snapshot()?, before);
    assert!(!store.contains(&dest)?);
    Ok(())
}

#[test]
fn missing_argument_fails_before_any_write() -> Result<()> {
    let store = MemStore::new();
    let receiver = put(&store, tensor(&[1.0, 2.0]), &[key(1)])?;
    let node = node_with(&store, demo_registry());
    let before = store.snapshot()?;

    let missing = Uid::generate();
    let action = RunClassMethodAction::method(
        "torch.Tensor.add_",
        receiver,
        vec![Reference::new(missing)],
        Uid::generate(),
        Address::new(),
    );
    let err = action.execute_action(&node, &key(1)).unwrap_err();
    assert!(matches!(err, KernelError::ArgumentNotFound { id, .. } if id == missing));
    assert_eq!(store.snapshot()?, before);
    Ok(())
}

#[test]
fn static_call_intersects_argument_permissions() -> Result<()> {
    let store = MemStore::new();
    let a = put(&store, Value::Int(2), &[key(1)])?;
    let b = put(&store, Value::Int(3), &[key(1), key(2)])?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::function("demo.sum", vec![a, b], dest, Address::new())
        .execute_action(&node, &key(1))?;

    let result = store.get(&dest)?.expect("result stored");
    assert_eq!(result.data, Value::boxed(dest, Value::Int(5)));
    assert_eq!(keys_of(&result.read_permissions), vec![key(1)]);
    Ok(())
}

#[test]
fn in_place_call_rewrites_receiver_with_folded_permissions() -> Result<()> {
    let store = MemStore::new();
    let receiver = put(&store, tensor(&[1.0, 2.0]), &[key(1), key(2)])?;
    let arg = put(&store, tensor(&[10.0, 20.0]), &[key(1)])?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::method("torch.Tensor.add_", receiver, vec![arg], dest, Address::new())
        .execute_action(&node, &key(1))?;

    let updated = store.get(&receiver.id_at_location)?.expect("receiver kept");
    assert_eq!(updated.data.as_tensor().map(|t| t.data.clone()), Some(vec![11.0, 22.0]));
    assert_eq!(keys_of(&updated.read_permissions), vec![key(1)]);

    let result = store.get(&dest)?.expect("result stored");
    assert_eq!(result.data.identity(), Some(dest));
    assert_eq!(result.data.as_tensor().map(|t| t.data.clone()), Some(vec![11.0, 22.0]));
    assert_eq!(keys_of(&result.read_permissions), vec![key(1)]);
    Ok(())
}

#[test]
fn copy_on_write_call_leaves_receiver_alone() -> Result<()> {
    let store = MemStore::new();
    let receiver = put(&store, tensor(&[1.0, 2.0]), &[key(1), key(2)])?;
    let arg = put(&store, tensor(&[1.0, 1.0]), &[key(1)])?;
    let node = node_with(&store, demo_registry());
    let stored_before = store.get(&receiver.id_at_location)?;

    let dest = Uid::generate();
    RunClassMethodAction::method("torch.Tensor.add", receiver, vec![arg], dest, Address::new())
        .execute_action(&node, &key(1))?;

    assert_eq!(store.get(&receiver.id_at_location)?, stored_before);
    let result = store.get(&dest)?.expect("result stored");
    assert_eq!(result.data.as_tensor().map(|t| t.data.clone()), Some(vec![2.0, 3.0]));
    assert_eq!(keys_of(&result.read_permissions), vec![key(1)]);
    Ok(())
}

#[test]
fn receiver_override_replaces_the_table_callable() -> Result<()> {
    let store = MemStore::new();
    let opt = Object::new("demo.Opt").with_override("step", "demo.patched.step");
    let receiver = put(&store, opt, &[key(1)])?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::method("demo.Opt.step", receiver, vec![], dest, Address::new())
        .execute_action(&node, &key(1))?;

    let result = store.get(&dest)?.expect("result stored");
    assert_eq!(result.data, Value::boxed(dest, Value::Int(2)));
    Ok(())
}

#[test]
fn pinned_identity_that_differs_is_rejected() -> Result<()> {
    let store = MemStore::new();
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    let err = RunClassMethodAction::function("demo.pinned", vec![], dest, Address::new())
        .execute_action(&node, &key(1))
        .unwrap_err();
    assert!(matches!(err, KernelError::IdentityMismatch { expected, .. } if expected == dest));
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn unknown_path_is_callable_not_found() -> Result<()> {
    let store = MemStore::new();
    let node = node_with(&store, demo_registry());

    let err = RunClassMethodAction::function("demo.nope", vec![], Uid::generate(), Address::new())
        .execute_action(&node, &key(1))
        .unwrap_err();
    assert!(matches!(err, KernelError::CallableNotFound(path) if path == "demo.nope"));
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn tags_flow_from_inputs_to_result() -> Result<()> {
    let store = MemStore::new();
    let receiver = Uid::generate();
    store.set(
        StoredObject::new(receiver, tensor(&[1.0]).into(), readers(&[key(1)])).with_tags(["weights"]),
    )?;
    let arg = Uid::generate();
    store.set(
        StoredObject::new(arg, tensor(&[2.0]).into(), readers(&[key(1)]))
            .with_tags(["grad", "weights"]),
    )?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::method(
        "torch.Tensor.mul",
        Reference::new(receiver),
        vec![Reference::new(arg)],
        dest,
        Address::new(),
    )
    .execute_action(&node, &key(1))?;

    let result = store.get(&dest)?.expect("result stored");
    assert_eq!(result.tags, vec!["weights", "grad", "mul"]);
    Ok(())
}

#[test]
fn plan_call_runs_recorded_actions_on_bound_inputs() -> Result<()> {
    let store = MemStore::new();
    let placeholder = Reference::new(Uid::generate());
    let inner_dest = Uid::generate();
    let plan = Plan::new(
        vec![placeholder],
        vec![RunClassMethodAction::method(
            "torch.Tensor.add",
            placeholder,
            vec![placeholder],
            inner_dest,
            Address::new(),
        )],
        vec![Reference::new(inner_dest)],
    );
    let plan_ref = put(&store, plan, &[key(1), key(2)])?;
    let input = put(&store, tensor(&[1.0, 2.0]), &[key(1)])?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::method("plan.Plan.__call__", plan_ref, vec![input], dest, Address::new())
        .execute_action(&node, &key(1))?;

    let inner = store.get(&inner_dest)?.expect("inner result stored");
    assert_eq!(inner.data.as_tensor().map(|t| t.data.clone()), Some(vec![2.0, 4.0]));

    let result = store.get(&dest)?.expect("plan result stored");
    assert_eq!(result.data.identity(), Some(dest));
    assert_eq!(result.data.as_tensor().map(|t| t.data.clone()), Some(vec![2.0, 4.0]));
    assert_eq!(keys_of(&result.read_permissions), vec![key(1)]);
    Ok(())
}

#[test]
fn plan_call_with_arguments_permuted_over_its_inputs() -> Result<()> {
    let store = MemStore::new();
    let a = put(&store, tensor(&[1.0, 1.0]), &[key(1), key(2)])?;
    let b = put(&store, tensor(&[10.0, 20.0]), &[key(1)])?;
    let inner_dest = Uid::generate();
    let recorded = RunClassMethodAction::method(
        "torch.Tensor.add",
        a,
        vec![b],
        inner_dest,
        Address::new(),
    )
    .with_kwarg("alpha", put(&store, Value::Int(2), &[key(1), key(2)])?);
    let plan = Plan::new(vec![a, b], vec![recorded], vec![Reference::new(inner_dest)]);
    let plan_ref = put(&store, plan, &[key(1), key(2)])?;
    let node = node_with(&store, demo_registry());

    let dest = Uid::generate();
    RunClassMethodAction::method("plan.Plan.__call__", plan_ref, vec![b, a], dest, Address::new())
        .execute_action(&node, &key(1))?;

    // b + 2 * a
    let result = store.get(&dest)?.expect("plan result stored");
    assert_eq!(result.data.as_tensor().map(|t| t.data.clone()), Some(vec![12.0, 22.0]));
    assert_eq!(keys_of(&result.read_permissions), vec![key(1)]);

    let untouched = store.get(&a.id_at_location)?.expect("input a");
    assert_eq!(untouched.data.as_tensor().map(|t| t.data.clone()), Some(vec![1.0, 1.0]));
    Ok(())
}

#[test]
fn self_recursive_plan_hits_depth_limit() -> Result<()> {
    let store = MemStore::new();
    let plan_id = Uid::generate();
    let recurse = RunClassMethodAction::method(
        "plan.Plan.__call__",
        Reference::new(plan_id),
        vec![],
        Uid::generate(),
        Address::new(),
    );
    let plan = Plan::new(vec![], vec![recurse], vec![]);
    store.set(StoredObject::new(plan_id, plan.into(), readers(&[key(1)])))?;

    let node = Node::builder("alice", key(0))
        .with_store(Arc::new(store.clone()))
        .with_config(KernelConfig {
            plan_depth_limit: 3,
            ..KernelConfig::default()
        })
        .build();

    let err = RunClassMethodAction::method(
        "plan.Plan.__call__",
        Reference::new(plan_id),
        vec![],
        Uid::generate(),
        Address::new(),
    )
    .execute_action(&node, &key(1))
    .unwrap_err();
    assert!(matches!(err, KernelError::PlanDepthExceeded(3)));
    Ok(())
}

#[test]
fn concurrent_receiver_write_is_a_conflict() -> Result<()> {
    let store = MemStore::new();
    let receiver = put(&store, Object::new("demo.Counter"), &[key(1)])?;

    let mut registry = demo_registry();
    let shared = store.clone();
    let target = receiver.id_at_location;
    registry.register_fn("demo.Counter.__call__", CallShape::Bound, move |_, _, _| {
        let racer = StoredObject::new(target, Value::Int(99), AccessSet::new());
        shared
            .set(racer)
            .map_err(|err| remcall_kernel::InvocationError::Failed(err.to_string()))?;
        Ok(Value::Null)
    });
    let node = node_with(&store, registry);

    let dest = Uid::generate();
    let err = RunClassMethodAction::method("demo.Counter.__call__", receiver, vec![], dest, Address::new())
        .execute_action(&node, &key(1))
        .unwrap_err();
    assert!(matches!(err, KernelError::Store(StoreError::Conflict { id, .. }) if id == target));
    assert_eq!(store.get(&target)?.map(|obj| obj.data), Some(Value::Int(99)));
    assert!(!store.contains(&dest)?);
    Ok(())
}
