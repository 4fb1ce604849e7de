//! Resource limits enforced by the stack item codec.

/// Default maximum size in bytes of a single stack item, including serialized output.
pub const MAX_ITEM_SIZE: usize = 1024 * 1024;

/// Default maximum number of elements (or map entries) in one container.
pub const MAX_ARRAY_SIZE: usize = 1024;

/// Limits applied while serializing and deserializing stack items.
///
/// These are the only load-shedding mechanism against hostile scripts, so every
/// length read from untrusted input is checked against them before allocating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Upper bound on serialized output and on decoded byte array payloads.
    pub max_item_size: usize,
    /// Upper bound on the element count of a decoded array, struct or map.
    pub max_array_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_item_size: MAX_ITEM_SIZE,
            max_array_size: MAX_ARRAY_SIZE,
        }
    }
}

impl ExecutionLimits {
    pub fn new(max_item_size: usize, max_array_size: usize) -> Self {
        Self {
            max_item_size,
            max_array_size,
        }
    }

    pub fn with_max_item_size(mut self, max_item_size: usize) -> Self {
        self.max_item_size = max_item_size;
        self
    }

    pub fn with_max_array_size(mut self, max_array_size: usize) -> Self {
        self.max_array_size = max_array_size;
        self
    }
}
