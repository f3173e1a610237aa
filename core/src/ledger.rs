use serde::{Deserialize, Serialize};

/// Currency a dig is paid with.
pub trait ResourceLedger {
    fn balance(&self) -> u32;

    fn has_enough(&self, cost: u32) -> bool {
        self.balance() >= cost
    }

    /// Debits `cost`, returns `false` without touching the balance when it is short.
    fn spend(&mut self, cost: u32) -> bool;

    fn credit(&mut self, amount: u32);
}

/// In-memory pickaxe count.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickaxeLedger {
    pickaxes: u32,
}

impl PickaxeLedger {
    pub const DEFAULT_PICKAXES: u32 = 100;

    pub const fn new(pickaxes: u32) -> Self {
        Self { pickaxes }
    }
}

impl Default for PickaxeLedger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PICKAXES)
    }
}

impl ResourceLedger for PickaxeLedger {
    fn balance(&self) -> u32 {
        self.pickaxes
    }

    fn spend(&mut self, cost: u32) -> bool {
        match self.pickaxes.checked_sub(cost) {
            Some(rest) => {
                self.pickaxes = rest;
                true
            }
            None => false,
        }
    }

    fn credit(&mut self, amount: u32) {
        self.pickaxes = self.pickaxes.saturating_add(amount);
    }
}
