use crate::interop::builtins::BUILTIN_SYSCALLS;
use crate::interop::{InteropCall, InteropDescriptor};
use crate::virtual_machine::engine::ExecutionEngine;
use crate::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Name-indexed table of syscalls.
///
/// Built once through [`InteropRegistryBuilder`] and read-only afterwards.
#[derive(Clone, Debug)]
pub struct InteropRegistry {
    calls: HashMap<String, InteropCall>,
}

impl Default for InteropRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InteropRegistry {
    /// Creates a registry holding the built-in syscalls.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts a builder preloaded with the built-in syscalls.
    pub fn builder() -> InteropRegistryBuilder {
        InteropRegistryBuilder::empty().extend(BUILTIN_SYSCALLS)
    }

    pub fn find(&self, name: &str) -> Option<&InteropCall> {
        self.calls.get(name)
    }

    pub fn price(&self, name: &str) -> Option<u64> {
        self.find(name).map(InteropCall::price)
    }

    /// Invokes the syscall `name` against `engine`.
    ///
    /// Returns `false` without touching the engine if the name is unknown or its price
    /// does not fit in the remaining gas. Otherwise the price is charged and the
    /// handler's result is returned.
    pub fn invoke(&self, name: &str, engine: &mut ExecutionEngine<'_>) -> bool {
        let Some(call) = self.calls.get(name) else {
            warn!("unknown syscall {name}");
            return false;
        };
        if let Err(err) = engine.gas_mut().charge(name, call.price()) {
            warn!("syscall {name} rejected: {err}");
            return false;
        }
        call.call(engine)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calls.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects syscalls before an [`InteropRegistry`] is built.
#[derive(Debug, Default)]
pub struct InteropRegistryBuilder {
    calls: HashMap<String, InteropCall>,
}

impl InteropRegistryBuilder {
    /// Starts a builder with no syscalls, not even the built-ins.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a syscall, replacing any existing one with the same name.
    pub fn register(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut ExecutionEngine<'_>) -> bool + Send + Sync + 'static,
        price: u64,
    ) -> Self {
        let call = InteropCall::new(name, Arc::new(handler), price);
        self.calls.insert(call.name().to_string(), call);
        self
    }

    /// Adds every syscall of a static table.
    pub fn extend<'d>(
        mut self,
        descriptors: impl IntoIterator<Item = &'d InteropDescriptor>,
    ) -> Self {
        for descriptor in descriptors {
            self.calls
                .insert(descriptor.name.to_string(), InteropCall::from(descriptor));
        }
        self
    }

    pub fn build(self) -> InteropRegistry {
        debug!("interop registry built with {} syscalls", self.calls.len());
        InteropRegistry { calls: self.calls }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::builtins::names;
    use crate::virtual_machine::stack_item::{HostRef, StackItem};

    fn push_seven(engine: &mut ExecutionEngine<'_>) -> bool {
        engine.evaluation_stack_mut().push(7);
        true
    }

    crate::syscall_table! {
        static TEST_SYSCALLS = [
            "Test.PushSeven" => push_seven, 5,
        ];
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InteropRegistry>();
    }

    #[test]
    fn new_registers_builtins() {
        let registry = InteropRegistry::new();
        assert_eq!(registry.len(), 6);
        for name in [
            names::GET_SCRIPT_CONTAINER,
            names::GET_EXECUTING_SCRIPT_HASH,
            names::GET_CALLING_SCRIPT_HASH,
            names::GET_ENTRY_SCRIPT_HASH,
            names::SERIALIZE,
            names::DESERIALIZE,
        ] {
            assert_eq!(registry.price(name), Some(1), "{name}");
        }
    }

    #[test]
    fn unknown_name_returns_false_and_leaves_stack() {
        let registry = InteropRegistry::new();
        let mut engine = ExecutionEngine::new(HostRef(0));
        engine.evaluation_stack_mut().push(1);
        assert!(!registry.invoke("Does.Not.Exist", &mut engine));
        assert_eq!(engine.evaluation_stack().len(), 1);
        assert_eq!(engine.gas().used(), 0);
    }

    #[test]
    fn register_overwrites_existing_name() {
        let registry = InteropRegistry::builder()
            .register(
                names::GET_SCRIPT_CONTAINER,
                |engine| {
                    engine.evaluation_stack_mut().push(false);
                    true
                },
                9,
            )
            .build();
        let mut engine = ExecutionEngine::new(HostRef(3));
        assert!(registry.invoke(names::GET_SCRIPT_CONTAINER, &mut engine));
        assert_eq!(engine.evaluation_stack_mut().pop(), Ok(StackItem::Boolean(false)));
        assert_eq!(registry.price(names::GET_SCRIPT_CONTAINER), Some(9));
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn static_table_extends_registry() {
        let registry = InteropRegistryBuilder::empty().extend(TEST_SYSCALLS).build();
        assert_eq!(registry.names(), vec!["Test.PushSeven"]);
        let call = registry.find("Test.PushSeven").unwrap();
        assert_eq!(call.price(), 5);

        let mut engine = ExecutionEngine::new(HostRef(0));
        assert!(registry.invoke("Test.PushSeven", &mut engine));
        assert_eq!(engine.evaluation_stack_mut().pop(), Ok(StackItem::from(7)));
        assert_eq!(engine.gas().used(), 5);
    }

    #[test]
    fn handler_failure_is_reported() {
        let registry = InteropRegistryBuilder::empty()
            .register("Test.Fail", |_| false, 1)
            .build();
        let mut engine = ExecutionEngine::new(HostRef(0));
        assert!(!registry.invoke("Test.Fail", &mut engine));
        assert_eq!(engine.gas().used(), 1);
    }

    #[test]
    fn out_of_gas_skips_handler() {
        let registry = InteropRegistryBuilder::empty().extend(TEST_SYSCALLS).build();
        let mut engine = ExecutionEngine::new(HostRef(0)).with_gas_limit(4);
        assert!(!registry.invoke("Test.PushSeven", &mut engine));
        assert!(engine.evaluation_stack().is_empty());
        assert_eq!(engine.gas().used(), 0);
    }

    #[test]
    fn gas_is_tracked_per_syscall() {
        let registry = InteropRegistryBuilder::empty().extend(TEST_SYSCALLS).build();
        let mut engine = ExecutionEngine::new(HostRef(0));
        registry.invoke("Test.PushSeven", &mut engine);
        registry.invoke("Test.PushSeven", &mut engine);
        let spent: Vec<_> = engine.gas().iter().collect();
        assert_eq!(spent, vec![("Test.PushSeven", 10)]);
    }
}
