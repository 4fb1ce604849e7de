//! Gas accounting for interop calls.

use crate::virtual_machine::errors::EngineError;
use std::collections::BTreeMap;

/// Price charged for a built-in syscall.
pub const DEFAULT_SYSCALL_PRICE: u64 = 1;

/// Tracks gas consumed by interop calls against a limit.
///
/// Consumption is also broken down per syscall name so hosts can see which
/// calls a script spends its budget on.
#[derive(Clone, Debug)]
pub struct GasMeter {
    limit: u64,
    used: u64,
    by_syscall: BTreeMap<String, u64>,
}

impl Default for GasMeter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl GasMeter {
    /// Creates a meter that fails once `limit` would be exceeded.
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            used: 0,
            by_syscall: BTreeMap::new(),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(u64::MAX)
    }

    /// Charges `amount` on behalf of `syscall`.
    ///
    /// Leaves the meter untouched and returns [`EngineError::OutOfGas`] if the charge
    /// does not fit in the remaining budget.
    pub fn charge(&mut self, syscall: &str, amount: u64) -> Result<(), EngineError> {
        let remaining = self.remaining();
        if amount > remaining {
            return Err(EngineError::OutOfGas {
                requested: amount,
                remaining,
            });
        }
        self.used += amount;
        let slot = self.by_syscall.entry(syscall.to_string()).or_insert(0);
        *slot = slot.saturating_add(amount);
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Returns gas consumed per syscall, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.by_syscall.iter().map(|(name, gas)| (name.as_str(), *gas))
    }
}
