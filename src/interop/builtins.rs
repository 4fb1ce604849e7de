//! Built-in syscalls.
//!
//! Engine introspection calls always succeed; a missing context yields an empty byte
//! array. `Neo.Runtime.Serialize` and `Neo.Runtime.Deserialize` pop one item and push
//! one result, or push nothing and return `false` on failure.

use crate::serialization::{DeserializeError, SerializeError};
use crate::types::bytes::Bytes;
use crate::types::hash::ScriptHash;
use crate::virtual_machine::engine::{ExecutionContext, ExecutionEngine};
use crate::virtual_machine::errors::EngineError;
use crate::virtual_machine::gas::DEFAULT_SYSCALL_PRICE;
use crate::virtual_machine::stack_item::StackItem;
use crate::warn;
use vm_interop_derive::Error;

/// Syscall names of the built-ins.
pub mod names {
    pub const GET_SCRIPT_CONTAINER: &str = "System.ExecutionEngine.GetScriptContainer";
    pub const GET_EXECUTING_SCRIPT_HASH: &str = "System.ExecutionEngine.GetExecutingScriptHash";
    pub const GET_CALLING_SCRIPT_HASH: &str = "System.ExecutionEngine.GetCallingScriptHash";
    pub const GET_ENTRY_SCRIPT_HASH: &str = "System.ExecutionEngine.GetEntryScriptHash";
    pub const SERIALIZE: &str = "Neo.Runtime.Serialize";
    pub const DESERIALIZE: &str = "Neo.Runtime.Deserialize";
}

crate::syscall_table! {
    /// Syscalls every registry starts with.
    pub static BUILTIN_SYSCALLS = [
        "System.ExecutionEngine.GetScriptContainer" => get_script_container, DEFAULT_SYSCALL_PRICE,
        "System.ExecutionEngine.GetExecutingScriptHash" => get_executing_script_hash, DEFAULT_SYSCALL_PRICE,
        "System.ExecutionEngine.GetCallingScriptHash" => get_calling_script_hash, DEFAULT_SYSCALL_PRICE,
        "System.ExecutionEngine.GetEntryScriptHash" => get_entry_script_hash, DEFAULT_SYSCALL_PRICE,
        "Neo.Runtime.Serialize" => runtime_serialize, DEFAULT_SYSCALL_PRICE,
        "Neo.Runtime.Deserialize" => runtime_deserialize, DEFAULT_SYSCALL_PRICE,
    ];
}

/// Failure inside a built-in handler. Logged, then reported to the caller as `false`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyscallError {
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("serialize failed: {0}")]
    Serialize(#[from] SerializeError),
    #[error("deserialize failed: {0}")]
    Deserialize(#[from] DeserializeError),
}

fn push_hash(engine: &mut ExecutionEngine<'_>, hash: Option<ScriptHash>) -> bool {
    let item = match hash {
        Some(hash) => StackItem::from(hash.as_slice()),
        None => StackItem::ByteArray(Bytes::empty()),
    };
    engine.evaluation_stack_mut().push(item);
    true
}

pub fn get_script_container(engine: &mut ExecutionEngine<'_>) -> bool {
    let container = engine.script_container();
    engine
        .evaluation_stack_mut()
        .push(StackItem::Interop(container));
    true
}

pub fn get_executing_script_hash(engine: &mut ExecutionEngine<'_>) -> bool {
    let hash = engine.current_context().map(ExecutionContext::script_hash);
    push_hash(engine, hash)
}

/// Pushes the caller's hash, or an empty byte array when the executing script is the entry.
pub fn get_calling_script_hash(engine: &mut ExecutionEngine<'_>) -> bool {
    let hash = engine.calling_context().map(ExecutionContext::script_hash);
    push_hash(engine, hash)
}

pub fn get_entry_script_hash(engine: &mut ExecutionEngine<'_>) -> bool {
    let hash = engine.entry_context().map(ExecutionContext::script_hash);
    push_hash(engine, hash)
}

pub fn runtime_serialize(engine: &mut ExecutionEngine<'_>) -> bool {
    match serialize_top(engine) {
        Ok(()) => true,
        Err(err) => {
            warn!("{}: {err}", names::SERIALIZE);
            false
        }
    }
}

pub fn runtime_deserialize(engine: &mut ExecutionEngine<'_>) -> bool {
    match deserialize_top(engine) {
        Ok(()) => true,
        Err(err) => {
            warn!("{}: {err}", names::DESERIALIZE);
            false
        }
    }
}

fn serialize_top(engine: &mut ExecutionEngine<'_>) -> Result<(), SyscallError> {
    let item = engine.evaluation_stack_mut().pop()?;
    let bytes = engine.serialize_item(&item)?;
    engine.evaluation_stack_mut().push(bytes);
    Ok(())
}

fn deserialize_top(engine: &mut ExecutionEngine<'_>) -> Result<(), SyscallError> {
    let item = engine.evaluation_stack_mut().pop()?;
    let data = item.to_bytes().ok_or(EngineError::NotBytes {
        actual: item.type_name(),
    })?;
    let value = engine.deserialize_item(&data)?;
    engine.evaluation_stack_mut().push(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::registry::InteropRegistry;
    use crate::utils::test_utils::utils::engine_with_depth;
    use crate::virtual_machine::stack_item::HostRef;

    fn hash_item(hash: ScriptHash) -> StackItem {
        StackItem::from(hash.as_slice())
    }

    #[test]
    fn syscall_error_wraps_engine_error() {
        use std::error::Error as _;
        let err = SyscallError::from(EngineError::StackUnderflow);
        assert_eq!(err.to_string(), "evaluation stack underflow");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("evaluation stack underflow".to_string())
        );
    }

    #[test]
    fn table_names_match_constants() {
        let table: Vec<_> = BUILTIN_SYSCALLS.iter().map(|d| d.name).collect();
        assert_eq!(
            table,
            vec![
                names::GET_SCRIPT_CONTAINER,
                names::GET_EXECUTING_SCRIPT_HASH,
                names::GET_CALLING_SCRIPT_HASH,
                names::GET_ENTRY_SCRIPT_HASH,
                names::SERIALIZE,
                names::DESERIALIZE,
            ]
        );
    }

    #[test]
    fn script_container_is_pushed_as_interop() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(42));
        assert!(registry.invoke(names::GET_SCRIPT_CONTAINER, &mut engine));
        assert_eq!(
            engine.evaluation_stack_mut().pop(),
            Ok(StackItem::Interop(HostRef(42)))
        );
    }

    #[test]
    fn context_hashes_follow_invocation_stack() {
        let registry = InteropRegistry::new();
        let (mut engine, hashes) = engine_with_depth(3);
        let (entry, middle, current) = (hashes[0], hashes[1], hashes[2]);

        assert!(registry.invoke(names::GET_EXECUTING_SCRIPT_HASH, &mut engine));
        assert!(registry.invoke(names::GET_CALLING_SCRIPT_HASH, &mut engine));
        assert!(registry.invoke(names::GET_ENTRY_SCRIPT_HASH, &mut engine));

        let stack = engine.evaluation_stack_mut();
        assert_eq!(stack.pop(), Ok(hash_item(entry)));
        assert_eq!(stack.pop(), Ok(hash_item(middle)));
        assert_eq!(stack.pop(), Ok(hash_item(current)));
    }

    #[test]
    fn entry_script_has_no_caller() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        let entry = engine.load_script(vec![0x01]);
        assert!(registry.invoke(names::GET_CALLING_SCRIPT_HASH, &mut engine));
        assert_eq!(
            engine.evaluation_stack_mut().pop(),
            Ok(StackItem::ByteArray(Bytes::empty()))
        );
        assert!(registry.invoke(names::GET_ENTRY_SCRIPT_HASH, &mut engine));
        assert_eq!(engine.evaluation_stack_mut().pop(), Ok(hash_item(entry)));
    }

    #[test]
    fn empty_invocation_stack_pushes_empty_bytes() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        assert!(registry.invoke(names::GET_ENTRY_SCRIPT_HASH, &mut engine));
        assert!(registry.invoke(names::GET_EXECUTING_SCRIPT_HASH, &mut engine));
        let stack = engine.evaluation_stack();
        assert_eq!(stack.len(), 2);
        assert!(
            stack
                .iter()
                .all(|item| *item == StackItem::ByteArray(Bytes::empty()))
        );
    }

    #[test]
    fn serialize_then_deserialize_restores_value() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        let original = engine
            .heap_mut()
            .new_struct(vec![StackItem::from(-5), StackItem::from(vec![1, 2])]).unwrap();
        engine.evaluation_stack_mut().push(original.clone());

        assert!(registry.invoke(names::SERIALIZE, &mut engine));
        assert!(matches!(
            engine.evaluation_stack().peek(0),
            Some(StackItem::ByteArray(_))
        ));
        assert!(registry.invoke(names::DESERIALIZE, &mut engine));

        let decoded = engine.evaluation_stack_mut().pop().unwrap();
        assert!(engine.evaluation_stack().is_empty());
        assert_ne!(decoded, original);
        assert!(engine.heap().structural_eq(&original, &decoded).unwrap());
    }

    #[test]
    fn serialize_cycle_fails_without_push() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        let handle = engine.heap_mut().alloc_items(vec![]).unwrap();
        engine
            .heap_mut()
            .push_item(handle, StackItem::Array(handle))
            .unwrap();
        engine.evaluation_stack_mut().push(StackItem::Array(handle));

        assert!(!registry.invoke(names::SERIALIZE, &mut engine));
        assert!(engine.evaluation_stack().is_empty());
    }

    #[test]
    fn serialize_host_reference_fails() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        engine
            .evaluation_stack_mut()
            .push(StackItem::Interop(HostRef(1)));
        assert!(!registry.invoke(names::SERIALIZE, &mut engine));
        assert!(engine.evaluation_stack().is_empty());
    }

    #[test]
    fn serialize_on_empty_stack_fails() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        assert!(!registry.invoke(names::SERIALIZE, &mut engine));
        assert!(!registry.invoke(names::DESERIALIZE, &mut engine));
    }

    #[test]
    fn deserialize_malformed_bytes_fails() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        engine.evaluation_stack_mut().push(vec![0x80u8, 0x02, 0x01]);
        assert!(!registry.invoke(names::DESERIALIZE, &mut engine));
        assert!(engine.evaluation_stack().is_empty());
        assert!(engine.heap().is_empty());
    }

    #[test]
    fn deserialize_container_operand_fails() {
        let mut engine = ExecutionEngine::new(HostRef(0));
        let arr = engine.heap_mut().new_array(vec![]).unwrap();
        engine.evaluation_stack_mut().push(arr);
        assert_eq!(
            deserialize_top(&mut engine),
            Err(SyscallError::Engine(EngineError::NotBytes { actual: "Array" }))
        );
    }

    #[test]
    fn deserialize_accepts_primitive_operands() {
        let mut engine = ExecutionEngine::new(HostRef(0));
        // Integer 0x0101 has bytes [01 01], which decode as Boolean(true).
        engine.evaluation_stack_mut().push(0x0101);
        assert_eq!(deserialize_top(&mut engine), Ok(()));
        assert_eq!(
            engine.evaluation_stack_mut().pop(),
            Ok(StackItem::Boolean(true))
        );
    }

    #[test]
    fn serialize_respects_engine_limits() {
        let registry = InteropRegistry::new();
        let limits = crate::virtual_machine::limits::ExecutionLimits::default()
            .with_max_item_size(4);
        let mut engine = ExecutionEngine::new(HostRef(0)).with_limits(limits);
        engine.evaluation_stack_mut().push(vec![0u8; 8]);
        assert!(!registry.invoke(names::SERIALIZE, &mut engine));
        assert!(engine.evaluation_stack().is_empty());
    }
}
