//! Python runtime modules embedded at compile time.
//!
//! These modules are written in Python in the `runtime/` directory
//! and embedded into the compiler binary using `include_str!`.

/// Package entry point re-exporting the public runtime types.
pub const INIT: &str = include_str!("../../runtime/__init__.py");
/// `Runtime` context and `InstanceBase`.
pub const BASE: &str = include_str!("../../runtime/base.py");
/// Per-class object store.
pub const STORAGE: &str = include_str!("../../runtime/storage.py");
/// Symmetric link table.
pub const RELATIONSHIP: &str = include_str!("../../runtime/relationship.py");
/// Table-driven state machine.
pub const STATE_MACHINE: &str = include_str!("../../runtime/state_machine.py");
/// Events, timers, messages, clock and the TIM/LOG bridges.
pub const SERVICES: &str = include_str!("../../runtime/services.py");

/// Returns all runtime modules as (filename, content) pairs, in the order
/// they are previewed.
pub fn get_runtime_modules() -> Vec<(&'static str, &'static str)> {
    vec![
        ("runtime/__init__.py", INIT),
        ("runtime/base.py", BASE),
        ("runtime/storage.py", STORAGE),
        ("runtime/relationship.py", RELATIONSHIP),
        ("runtime/state_machine.py", STATE_MACHINE),
        ("runtime/services.py", SERVICES),
    ]
}
