//! Host functions ("syscalls") callable from scripts by name.
//!
//! An [`InteropRegistry`](registry::InteropRegistry) maps syscall names to a handler
//! and a gas price. Handlers receive the [`ExecutionEngine`] and report success as a
//! plain `bool`; on failure the script faults.
//!
//! Registration is explicit. The built-in calls live in a static table declared with
//! [`syscall_table!`](crate::syscall_table), and hosts add their own through
//! [`InteropRegistryBuilder`](registry::InteropRegistryBuilder) before the registry is
//! built. A built registry is immutable and can be shared between engines.
//!
//! # Modules
//!
//! - [`builtins`]: engine introspection and `Neo.Runtime` serialization calls
//! - [`registry`]: the registry, its builder and the handler types

pub mod builtins;
pub mod registry;

use crate::virtual_machine::engine::ExecutionEngine;
use std::fmt;
use std::sync::Arc;

/// Boxed syscall handler.
pub type InteropHandler = Arc<dyn Fn(&mut ExecutionEngine<'_>) -> bool + Send + Sync>;

/// Signature of a handler declared in a static table.
pub type HandlerFn = fn(&mut ExecutionEngine<'_>) -> bool;

/// A registered syscall.
#[derive(Clone)]
pub struct InteropCall {
    name: String,
    handler: InteropHandler,
    price: u64,
}

impl InteropCall {
    pub fn new(name: impl Into<String>, handler: InteropHandler, price: u64) -> Self {
        Self {
            name: name.into(),
            handler,
            price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gas charged per invocation.
    pub fn price(&self) -> u64 {
        self.price
    }

    /// Runs the handler without charging gas.
    pub fn call(&self, engine: &mut ExecutionEngine<'_>) -> bool {
        (self.handler)(engine)
    }
}

impl fmt::Debug for InteropCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteropCall")
            .field("name", &self.name)
            .field("price", &self.price)
            .finish_non_exhaustive()
    }
}

/// Static description of a syscall, as produced by [`syscall_table!`](crate::syscall_table).
#[derive(Clone, Copy, Debug)]
pub struct InteropDescriptor {
    pub name: &'static str,
    pub handler: HandlerFn,
    pub price: u64,
}

impl From<&InteropDescriptor> for InteropCall {
    fn from(descriptor: &InteropDescriptor) -> Self {
        InteropCall::new(descriptor.name, Arc::new(descriptor.handler), descriptor.price)
    }
}

/// Declares a static table of [`InteropDescriptor`]s.
///
/// ```
/// use vm_interop::interop::registry::InteropRegistryBuilder;
/// use vm_interop::virtual_machine::engine::ExecutionEngine;
///
/// fn noop(_: &mut ExecutionEngine<'_>) -> bool {
///     true
/// }
///
/// vm_interop::syscall_table! {
///     static HOST_SYSCALLS = [
///         "Host.Noop" => noop, 10,
///     ];
/// }
///
/// let registry = InteropRegistryBuilder::empty().extend(HOST_SYSCALLS).build();
/// assert_eq!(registry.price("Host.Noop"), Some(10));
/// ```
#[macro_export]
macro_rules! syscall_table {
    (
        $(#[$meta:meta])*
        $vis:vis static $table:ident = [
            $( $name:literal => $handler:path, $price:expr ),* $(,)?
        ];
    ) => {
        $(#[$meta])*
        $vis static $table: &[$crate::interop::InteropDescriptor] = &[
            $(
                $crate::interop::InteropDescriptor {
                    name: $name,
                    handler: $handler,
                    price: $price,
                },
            )*
        ];
    };
}
