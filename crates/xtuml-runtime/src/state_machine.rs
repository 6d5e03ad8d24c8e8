//! # State Machines
//!
//! Each instance of a class with a state machine owns one [`StateMachine`]:
//! its current state and transition history behind a mutex, plus a shared
//! [`TransitionTable`]. Looking up the transition, checking the guard and
//! moving to the next state happen under that mutex. The action runs
//! afterwards, without it, so an action can generate events to its own
//! instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::Result;
use crate::instance::{Instance, Payload};
use crate::runtime::Runtime;

/// Decides whether a transition may fire.
pub type Guard = Arc<dyn Fn(&Instance, &Payload) -> bool + Send + Sync>;

/// Runs after a transition has been taken.
pub type Action = Arc<dyn Fn(&Arc<Runtime>, &Arc<Instance>, &Payload) -> Result<()> + Send + Sync>;

/// One `(state, event)` entry of a transition table.
#[derive(Clone)]
pub struct Transition {
    pub next: String,
    pub guard: Option<Guard>,
    pub action: Option<Action>,
}

impl Transition {
    pub fn to(next: impl Into<String>) -> Self {
        Self {
            next: next.into(),
            guard: None,
            action: None,
        }
    }

    pub fn guard(mut self, guard: impl Fn(&Instance, &Payload) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn action(
        mut self,
        action: impl Fn(&Arc<Runtime>, &Arc<Instance>, &Payload) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("next", &self.next)
            .field("guard", &self.guard.is_some())
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// `state -> event -> transition`.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    rows: HashMap<String, HashMap<String, Transition>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row. The first row for a `(state, event)` pair wins.
    pub fn on(mut self, state: &str, event: &str, transition: Transition) -> Self {
        self.rows
            .entry(state.to_string())
            .or_default()
            .entry(event.to_string())
            .or_insert(transition);
        self
    }

    /// Copies every `Base_Variant` row to `Base` when `Base` is one of
    /// `declared` and has no row of its own for that event.
    pub fn with_base_aliases(mut self, declared: &[&str]) -> Self {
        let mut aliases: Vec<(String, String, Transition)> = Vec::new();
        let mut states: Vec<&String> = self.rows.keys().collect();
        states.sort();

        for state in states {
            let Some((base, _)) = state.split_once('_') else {
                continue;
            };
            if base.is_empty() || !declared.contains(&base) {
                continue;
            }
            let mut events: Vec<(&String, &Transition)> = self.rows[state].iter().collect();
            events.sort_by(|a, b| a.0.cmp(b.0));
            for (event, transition) in events {
                let explicit = self.rows.get(base).is_some_and(|r| r.contains_key(event));
                let aliased = aliases.iter().any(|(s, e, _)| s == base && e == event);
                if !explicit && !aliased {
                    aliases.push((base.to_string(), event.clone(), transition.clone()));
                }
            }
        }

        for (state, event, transition) in aliases {
            self.rows.entry(state).or_default().insert(event, transition);
        }
        self
    }

    pub fn get(&self, state: &str, event: &str) -> Option<&Transition> {
        self.rows.get(state).and_then(|events| events.get(event))
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A transition that was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub from: String,
    pub event: String,
    pub to: String,
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Transitioned { from: String, to: String },
    /// No row for the current state and event.
    Ignored { state: String },
    /// The guard returned false.
    GuardRejected { state: String },
}

pub(crate) enum Step {
    Taken {
        from: String,
        to: String,
        action: Option<Action>,
    },
    Ignored(String),
    Rejected(String),
}

#[derive(Debug)]
struct Record {
    current: String,
    history: Vec<HistoryEntry>,
}

/// Per-instance state machine.
pub struct StateMachine {
    table: Arc<TransitionTable>,
    record: Mutex<Record>,
}

impl StateMachine {
    pub fn new(initial_state: impl Into<String>, table: Arc<TransitionTable>) -> Self {
        Self {
            table,
            record: Mutex::new(Record {
                current: initial_state.into(),
                history: Vec::new(),
            }),
        }
    }

    pub fn current_state(&self) -> String {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }

    pub(crate) fn force(&self, owner: &Instance, state: &str) {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        record.current = state.to_string();
        owner.set_attr("currentState", Value::from(state));
    }

    /// Takes the transition for `event`, if any, and returns the action to
    /// run once the lock is released.
    pub(crate) fn step(&self, owner: &Instance, event: &str, payload: &Payload) -> Step {
        let mut record = self.record.lock().unwrap_or_else(PoisonError::into_inner);
        let from = record.current.clone();

        let Some(transition) = self.table.get(&from, event) else {
            return Step::Ignored(from);
        };
        if let Some(guard) = &transition.guard {
            if !guard(owner, payload) {
                return Step::Rejected(from);
            }
        }

        let to = transition.next.clone();
        record.current = to.clone();
        record.history.push(HistoryEntry {
            from: from.clone(),
            event: event.to_string(),
            to: to.clone(),
        });
        owner.set_attr("currentState", Value::from(to.as_str()));

        Step::Taken {
            from,
            to,
            action: transition.action.clone(),
        }
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("current", &self.current_state())
            .field("transitions", &self.table.len())
            .finish()
    }
}
