//! AVE Configuration
//!
//! Per-actor resource limits and scheduler knobs. Configuration specifies
//! constraints only; enforcement is handled by the VM.

use std::time::Duration;

/// VM configuration
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Maximum operand stack depth per actor
    pub max_stack_size: usize,

    /// Number of addressable memory cells per actor
    pub memory_cells: usize,

    /// Maximum composite heap slots per actor
    pub max_heap_slots: usize,

    /// Instructions an actor may run before the scheduler rotates it out
    pub reduction_budget: usize,

    /// How long a `RECV` on an empty mailbox may block before the actor
    /// faults with `ReceiveTimeout`. `None` blocks indefinitely.
    pub receive_timeout: Option<Duration>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_stack_size: 1024,
            memory_cells: 256,
            max_heap_slots: 4096,
            reduction_budget: 256,
            receive_timeout: None,
        }
    }
}

impl VmConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }
}
