//! # xtUML Runtime
//!
//! A native execution engine for xtUML models. It provides the same
//! contract as the generated Python runtime package: an object store,
//! symmetric relationship links, per-instance state machines whose
//! actions run outside the state lock, one-shot timers and pluggable
//! external entity bridges.
//!
//! ```rust,ignore
//! use xtuml_runtime::{ClassDef, Runtime, Transition, TransitionTable};
//!
//! let rt = Runtime::new("lamp");
//! rt.register_class(ClassDef::new("Lamp", "LMP").state_machine(
//!     "Off",
//!     TransitionTable::new()
//!         .on("Off", "Toggle", Transition::to("On"))
//!         .on("On", "Toggle", Transition::to("Off")),
//! ));
//! let lamp = rt.create("LMP")?;
//! rt.dispatch(&lamp, "Toggle", Default::default())?;
//! ```

pub mod class;
pub mod error;
pub mod instance;
pub mod links;
pub mod runtime;
pub mod services;
pub mod state_machine;
pub mod store;

pub use class::{ClassDef, MachineDef};
pub use error::{Result, RuntimeError};
pub use instance::{Instance, InstanceId, Payload};
pub use links::LinkTable;
pub use runtime::{Bridge, EventInstance, Function, LogBridge, Runtime};
pub use services::{Message, Services, TimerId};
pub use state_machine::{
    Action, DispatchOutcome, Guard, HistoryEntry, StateMachine, Transition, TransitionTable,
};
pub use store::ObjectStore;
