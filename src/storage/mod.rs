//! Script storage.
//!
//! - [`script_registry`]: insert-once map from script hash to bytecode, exposed to
//!   the engine through the [`ScriptTable`](script_registry::ScriptTable) trait

pub mod script_registry;
