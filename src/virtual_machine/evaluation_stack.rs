use crate::virtual_machine::errors::EngineError;
use crate::virtual_machine::stack_item::StackItem;

/// Operand stack shared by instructions and interop handlers.
#[derive(Clone, Debug, Default)]
pub struct EvaluationStack {
    items: Vec<StackItem>,
}

impl EvaluationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<StackItem>) {
        self.items.push(item.into());
    }

    /// Removes and returns the top item.
    pub fn pop(&mut self) -> Result<StackItem, EngineError> {
        self.items.pop().ok_or(EngineError::StackUnderflow)
    }

    /// Returns the item `depth` positions below the top (`0` is the top).
    pub fn peek(&self, depth: usize) -> Option<&StackItem> {
        let idx = self.items.len().checked_sub(depth)?.checked_sub(1)?;
        self.items.get(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates from the bottom of the stack to the top.
    pub fn iter(&self) -> impl Iterator<Item = &StackItem> {
        self.items.iter()
    }
}
