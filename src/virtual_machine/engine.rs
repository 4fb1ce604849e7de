//! Engine context handed to interop handlers.
//!
//! The instruction loop lives outside this crate. [`ExecutionEngine`] holds the state
//! a syscall handler can observe or change: the evaluation stack, the invocation
//! stack of loaded scripts, the script container, the value heap, the codec limits
//! and the gas meter.

use crate::serialization::{DeserializeError, SerializeError, deserialize, serialize};
use crate::storage::script_registry::ScriptTable;
use crate::types::bytes::Bytes;
use crate::types::hash::ScriptHash;
use crate::virtual_machine::errors::EngineError;
use crate::virtual_machine::evaluation_stack::EvaluationStack;
use crate::virtual_machine::gas::GasMeter;
use crate::virtual_machine::heap::ValueHeap;
use crate::virtual_machine::limits::ExecutionLimits;
use crate::virtual_machine::stack_item::{HostRef, StackItem};

/// A loaded script and its hash.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    script: Bytes,
    script_hash: ScriptHash,
}

impl ExecutionContext {
    /// Creates a context for `script`, hashing it once up front.
    pub fn new(script: impl Into<Bytes>) -> Self {
        let script = script.into();
        let script_hash = ScriptHash::of(&script);
        Self {
            script,
            script_hash,
        }
    }

    pub fn script(&self) -> &Bytes {
        &self.script
    }

    pub fn script_hash(&self) -> ScriptHash {
        self.script_hash
    }
}

/// Execution state visible to interop handlers.
pub struct ExecutionEngine<'a> {
    script_container: HostRef,
    script_table: Option<&'a dyn ScriptTable>,
    /// Loaded scripts; the entry script is at the bottom, the executing one on top.
    invocation_stack: Vec<ExecutionContext>,
    evaluation_stack: EvaluationStack,
    heap: ValueHeap,
    limits: ExecutionLimits,
    gas: GasMeter,
}

impl<'a> ExecutionEngine<'a> {
    /// Creates an engine for a script container with default limits and no gas limit.
    pub fn new(script_container: HostRef) -> Self {
        Self {
            script_container,
            script_table: None,
            invocation_stack: Vec::new(),
            evaluation_stack: EvaluationStack::new(),
            heap: ValueHeap::new(),
            limits: ExecutionLimits::default(),
            gas: GasMeter::unlimited(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_gas_limit(mut self, limit: u64) -> Self {
        self.gas = GasMeter::new(limit);
        self
    }

    /// Attaches the table used by [`load_script_by_hash`](Self::load_script_by_hash).
    pub fn with_script_table(mut self, table: &'a dyn ScriptTable) -> Self {
        self.script_table = Some(table);
        self
    }

    /// Pushes a new execution context for `script` and returns its hash.
    pub fn load_script(&mut self, script: impl Into<Bytes>) -> ScriptHash {
        let context = ExecutionContext::new(script);
        let hash = context.script_hash();
        self.invocation_stack.push(context);
        hash
    }

    /// Resolves `script_hash` through the script table and loads the script.
    pub fn load_script_by_hash(&mut self, script_hash: &ScriptHash) -> Result<(), EngineError> {
        let table = self.script_table.ok_or(EngineError::NoScriptTable)?;
        let script = table
            .get_script(script_hash.as_slice())
            .ok_or_else(|| EngineError::UnknownScript(script_hash.to_string()))?;
        self.invocation_stack.push(ExecutionContext {
            script,
            script_hash: *script_hash,
        });
        Ok(())
    }

    /// Pops the executing context, returning to its caller.
    pub fn unload_context(&mut self) -> Option<ExecutionContext> {
        self.invocation_stack.pop()
    }

    /// The context currently executing.
    pub fn current_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.last()
    }

    /// The context that called the executing one.
    pub fn calling_context(&self) -> Option<&ExecutionContext> {
        let len = self.invocation_stack.len();
        len.checked_sub(2)
            .and_then(|idx| self.invocation_stack.get(idx))
    }

    /// The first context loaded into the engine.
    pub fn entry_context(&self) -> Option<&ExecutionContext> {
        self.invocation_stack.first()
    }

    pub fn invocation_depth(&self) -> usize {
        self.invocation_stack.len()
    }

    pub fn script_container(&self) -> HostRef {
        self.script_container
    }

    pub fn evaluation_stack(&self) -> &EvaluationStack {
        &self.evaluation_stack
    }

    pub fn evaluation_stack_mut(&mut self) -> &mut EvaluationStack {
        &mut self.evaluation_stack
    }

    pub fn heap(&self) -> &ValueHeap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut ValueHeap {
        &mut self.heap
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    pub fn gas(&self) -> &GasMeter {
        &self.gas
    }

    pub fn gas_mut(&mut self) -> &mut GasMeter {
        &mut self.gas
    }

    /// Serializes `item` against this engine's heap and limits.
    pub fn serialize_item(&self, item: &StackItem) -> Result<Vec<u8>, SerializeError> {
        serialize(&self.heap, item, &self.limits)
    }

    /// Deserializes `data`, allocating any containers in this engine's heap.
    pub fn deserialize_item(&mut self, data: &[u8]) -> Result<StackItem, DeserializeError> {
        deserialize(&mut self.heap, data, &self.limits)
    }
}
