//! Deliberate engine defects, used to prove the harness catches them.

use std::collections::BTreeSet;

/// A single way the reference engine can misbehave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fault {
    /// Rotations wrap around at the batch boundary instead of shifting in zeros.
    WrapRotations,
    /// Evaluation results come back without the left operand's metadata.
    DropMetadata,
    /// Subtraction adds instead.
    SubtractAdds,
    /// Decryption fails with an error type foreign to the engine.
    ForeignDecryptError,
    /// Decryption panics.
    PanicOnDecrypt,
}

/// Set of active faults. Empty by default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaultPlan {
    faults: BTreeSet<Fault>,
}

impl FaultPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, fault: Fault) -> Self {
        self.faults.insert(fault);
        self
    }

    pub fn is_active(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}
