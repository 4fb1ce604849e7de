//! Interop layer of a stack-based smart-contract VM.
//!
//! Provides the syscall registry and built-in host functions, the binary codec for
//! stack items, the script registry used to resolve scripts by hash, and the engine
//! context those pieces operate on.

pub mod interop;
pub mod serialization;
pub mod storage;
pub mod types;
pub mod utils;
pub mod virtual_machine;
