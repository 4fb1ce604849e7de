use vm_interop_derive::Error;

/// Errors raised by the engine context while servicing interop calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A pop was attempted on an empty evaluation stack.
    #[error("evaluation stack underflow")]
    StackUnderflow,
    /// Charging the call would exceed the gas limit.
    #[error("out of gas: {requested} requested, {remaining} remaining")]
    OutOfGas { requested: u64, remaining: u64 },
    /// The stack item has no byte representation.
    #[error("expected a primitive stack item, got {actual}")]
    NotBytes { actual: &'static str },
    /// No script is registered under the hash.
    #[error("unknown script {0}")]
    UnknownScript(String),
    /// No script table was attached to the engine.
    #[error("no script table attached")]
    NoScriptTable,
}

/// Errors raised by the value heap.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    /// Handle does not point into this heap.
    #[error("container handle {0} out of bounds")]
    BadHandle(u32),
    /// Map keys must be byte arrays, booleans or integers.
    #[error("{actual} cannot be used as a map key")]
    InvalidMapKey { actual: &'static str },
    /// Every container handle is already in use.
    #[error("container handles exhausted")]
    HandlesExhausted,
}
