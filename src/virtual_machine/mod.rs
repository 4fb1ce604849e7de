//! Engine-side state shared by interop handlers.
//!
//! # Value model
//!
//! Stack items are small enums. Primitives (`ByteArray`, `Boolean`, `Integer`) are
//! stored inline; containers (`Array`, `Struct`, `Map`) are handles into the engine's
//! [`heap::ValueHeap`], so copying an item aliases the container it points to.
//!
//! # Modules
//!
//! - [`engine`]: execution engine context (invocation stack, evaluation stack, heap)
//! - [`errors`]: engine and heap error types
//! - [`evaluation_stack`]: operand stack
//! - [`gas`]: per-syscall gas accounting
//! - [`heap`]: arena of container items
//! - [`limits`]: codec size limits
//! - [`stack_item`]: the stack item type and its byte conversions

pub mod engine;
pub mod errors;
pub mod evaluation_stack;
pub mod gas;
pub mod heap;
pub mod limits;
pub mod stack_item;
