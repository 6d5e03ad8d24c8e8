//! The [`Runtime`]: class registry, object store, links, dispatch, timers,
//! domain functions and external entity bridges.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{mpsc, Arc, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::class::ClassDef;
use crate::error::{Result, RuntimeError};
use crate::instance::{Instance, InstanceId, Payload};
use crate::links::LinkTable;
use crate::services::{Services, TimerId};
use crate::state_machine::{DispatchOutcome, Step};
use crate::store::ObjectStore;

/// A domain function. Receives the runtime and its named arguments.
pub type Function = Arc<dyn Fn(&Arc<Runtime>, &Payload) -> Result<Value> + Send + Sync>;

/// An external entity the model talks to through `EE::operation(...)`.
pub trait Bridge: Send + Sync {
    fn call(&self, rt: &Arc<Runtime>, operation: &str, args: &Payload) -> Result<Value>;
}

/// Built-in `LOG` entity.
#[derive(Debug, Default)]
pub struct LogBridge;

impl Bridge for LogBridge {
    fn call(&self, rt: &Arc<Runtime>, operation: &str, args: &Payload) -> Result<Value> {
        let message = args
            .get("message")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default();
        let value = args.get("value").cloned().unwrap_or(Value::Null);

        match operation {
            "LogInfo" => tracing::info!(model = %rt.name, "{message}"),
            "LogSuccess" => tracing::info!(model = %rt.name, outcome = "success", "{message}"),
            "LogFailure" => tracing::warn!(model = %rt.name, outcome = "failure", "{message}"),
            "LogInteger" | "LogReal" => tracing::info!(model = %rt.name, %value, "{message}"),
            _ => {
                return Err(RuntimeError::UnknownBridgeOperation {
                    entity: "LOG".to_string(),
                    operation: operation.to_string(),
                })
            }
        }
        Ok(Value::Null)
    }
}

/// An event addressed to an instance.
#[derive(Debug, Clone)]
pub struct EventInstance {
    pub name: String,
    pub target: Arc<Instance>,
    pub payload: Payload,
}

impl EventInstance {
    pub fn new(name: &str, target: &Arc<Instance>, payload: Payload) -> Self {
        Self {
            name: name.to_string(),
            target: Arc::clone(target),
            payload,
        }
    }
}

/// One running model. Shared as `Arc<Runtime>` with actions, functions,
/// bridges and timer threads.
pub struct Runtime {
    name: String,
    classes: RwLock<HashMap<String, Arc<ClassDef>>>,
    store: ObjectStore,
    links: LinkTable,
    services: Services,
    functions: RwLock<HashMap<String, Function>>,
    bridges: RwLock<HashMap<String, Arc<dyn Bridge>>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("name", &self.name)
            .field("instances", &self.store.len())
            .finish()
    }
}

impl Runtime {
    pub fn new(name: &str) -> Arc<Self> {
        let rt = Self {
            name: name.to_string(),
            classes: RwLock::new(HashMap::new()),
            store: ObjectStore::new(),
            links: LinkTable::new(),
            services: Services::new(),
            functions: RwLock::new(HashMap::new()),
            bridges: RwLock::new(HashMap::new()),
        };
        rt.register_bridge("LOG", Arc::new(LogBridge));
        Arc::new(rt)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    // =========================================================================
    // Classes and instances
    // =========================================================================

    /// Registers a class under its name and key letters, case-insensitively.
    pub fn register_class(&self, def: ClassDef) {
        self.store.register(&def.name);
        let def = Arc::new(def);
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        classes.insert(def.name.to_lowercase(), Arc::clone(&def));
        classes.insert(def.key_letters.to_lowercase(), def);
    }

    pub fn class(&self, reference: &str) -> Result<Arc<ClassDef>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&reference.to_lowercase())
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownClass(reference.to_string()))
    }

    /// Resolves a class name or key letters to the class name.
    pub fn class_name(&self, reference: &str) -> Result<String> {
        self.class(reference).map(|def| def.name.clone())
    }

    pub fn create(&self, class_ref: &str) -> Result<Arc<Instance>> {
        self.create_with(class_ref, Payload::new())
    }

    /// Creates an instance with the class defaults overridden by `attrs`.
    pub fn create_with(&self, class_ref: &str, attrs: Payload) -> Result<Arc<Instance>> {
        let def = self.class(class_ref)?;
        let mut values = def.attributes.clone();
        values.extend(attrs);

        let instance = Instance::new(
            self.store.allocate_id(),
            &def.name,
            &def.key_letters,
            values,
            def.new_machine(),
        );
        self.store.insert(Arc::clone(&instance));
        tracing::debug!(instance = %instance, class = %def.name, "created instance");
        Ok(instance)
    }

    /// Removes the instance and every link that touches it.
    pub fn delete(&self, instance: &Instance) -> bool {
        if self.store.remove(instance.id()).is_none() {
            return false;
        }
        let dropped = self.links.forget(instance.id());
        tracing::debug!(instance = %instance, links = dropped, "deleted instance");
        true
    }

    pub fn select_all(&self, class_ref: &str) -> Vec<Arc<Instance>> {
        match self.class_name(class_ref) {
            Ok(name) => self.store.select_all(&name),
            Err(_) => Vec::new(),
        }
    }

    pub fn select_any(
        &self,
        class_ref: &str,
        predicate: impl Fn(&Instance) -> bool,
    ) -> Option<Arc<Instance>> {
        let name = self.class_name(class_ref).ok()?;
        self.store.select_any(&name, predicate)
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    pub fn relate(&self, rel: &str, a: &Instance, b: &Instance) -> Result<bool> {
        self.ensure_live(a)?;
        self.ensure_live(b)?;
        Ok(self.links.relate(rel, a.id(), b.id()))
    }

    /// Links every pair, or none when any end is not in the store.
    pub fn relate_all(&self, rel: &str, pairs: &[(&Instance, &Instance)]) -> Result<usize> {
        for (a, b) in pairs {
            self.ensure_live(a)?;
            self.ensure_live(b)?;
        }
        let ids: Vec<(InstanceId, InstanceId)> = pairs.iter().map(|(a, b)| (a.id(), b.id())).collect();
        Ok(self.links.relate_all(rel, &ids))
    }

    pub fn unrelate(&self, rel: &str, a: &Instance, b: &Instance) -> bool {
        self.links.unrelate(rel, a.id(), b.id())
    }

    /// Instances linked to `source` across `rel`, optionally restricted to
    /// one class. Association instances are stepped through to the far end
    /// unless the association class itself is asked for.
    pub fn select_related(
        &self,
        rel: &str,
        source: &Instance,
        class_ref: Option<&str>,
    ) -> Vec<Arc<Instance>> {
        let wanted = class_ref.map(|c| self.class_name(c).unwrap_or_else(|_| c.to_string()));
        let accepts = |instance: &Instance| {
            wanted
                .as_deref()
                .map_or(true, |name| instance.class_name() == name)
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in self.links.related(rel, source.id()) {
            let Some(near) = self.store.get(id) else {
                continue;
            };
            if self.is_association(&near) && !(wanted.is_some() && accepts(&near)) {
                for far_id in self.links.related(rel, near.id()) {
                    if far_id == source.id() {
                        continue;
                    }
                    if let Some(far) = self.store.get(far_id) {
                        if accepts(&far) && seen.insert(far.id()) {
                            out.push(far);
                        }
                    }
                }
            } else if accepts(&near) && seen.insert(near.id()) {
                out.push(near);
            }
        }
        out
    }

    pub fn select_one_related(
        &self,
        rel: &str,
        source: &Instance,
        class_ref: Option<&str>,
    ) -> Option<Arc<Instance>> {
        self.select_related(rel, source, class_ref).into_iter().next()
    }

    /// Follows a chain of `(rel, class)` hops from `source`.
    pub fn navigate(&self, source: &Arc<Instance>, hops: &[(&str, Option<&str>)]) -> Vec<Arc<Instance>> {
        let mut frontier = vec![Arc::clone(source)];
        for (rel, class_ref) in hops {
            let mut seen = HashSet::new();
            frontier = frontier
                .iter()
                .flat_map(|instance| self.select_related(rel, instance, *class_ref))
                .filter(|instance| seen.insert(instance.id()))
                .collect();
        }
        frontier
    }

    fn is_association(&self, instance: &Instance) -> bool {
        self.class(instance.class_name())
            .map(|def| def.is_association)
            .unwrap_or(false)
    }

    fn ensure_live(&self, instance: &Instance) -> Result<()> {
        if self.store.contains(instance.id()) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownInstance(instance.id()))
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Sends `event` to `target`. The transition is taken under the state
    /// machine lock; the action runs after it is released, and its failure
    /// is logged rather than returned.
    pub fn dispatch(
        self: &Arc<Self>,
        target: &Arc<Instance>,
        event: &str,
        payload: Payload,
    ) -> Result<DispatchOutcome> {
        let sm = target
            .state_machine()
            .ok_or(RuntimeError::NoStateMachine(target.id()))?;

        match sm.step(target, event, &payload) {
            Step::Ignored(state) => {
                tracing::debug!(instance = %target, event, state = %state, "event ignored");
                Ok(DispatchOutcome::Ignored { state })
            }
            Step::Rejected(state) => {
                tracing::debug!(instance = %target, event, state = %state, "guard rejected event");
                Ok(DispatchOutcome::GuardRejected { state })
            }
            Step::Taken { from, to, action } => {
                tracing::debug!(instance = %target, event, from = %from, to = %to, "transition");
                if let Some(action) = action {
                    if let Err(err) = action(self, target, &payload) {
                        self.report(&format!("{}[{}/{}]", target.class_name(), from, event), &err);
                    }
                }
                Ok(DispatchOutcome::Transitioned { from, to })
            }
        }
    }

    pub fn deliver(self: &Arc<Self>, event: EventInstance) -> Result<DispatchOutcome> {
        self.dispatch(&event.target, &event.name, event.payload)
    }

    /// Moves `target` to `state` without running any action.
    pub fn force_state(&self, target: &Instance, state: &str) -> Result<()> {
        let sm = target
            .state_machine()
            .ok_or(RuntimeError::NoStateMachine(target.id()))?;
        sm.force(target, state);
        Ok(())
    }

    pub fn send_message(&self, target: &Instance, name: &str, payload: Payload) {
        self.services.send_message(target.id(), name, payload);
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Delivers `event` after `delay` on a dedicated thread. The timer is
    /// registered before the thread starts and unregisters itself when it
    /// fires.
    pub fn start_timer(self: &Arc<Self>, event: EventInstance, delay: Duration) -> Result<TimerId> {
        let id = self.services.next_timer_id();
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        self.services.register_timer(id, cancel_tx);

        let rt = Arc::downgrade(self);
        let spawned = thread::Builder::new()
            .name(format!("xtuml-{id}"))
            .spawn(move || {
                if cancel_rx.recv_timeout(delay) != Err(mpsc::RecvTimeoutError::Timeout) {
                    return;
                }
                let Some(rt) = rt.upgrade() else {
                    return;
                };
                if !rt.services.claim_timer(id) {
                    return;
                }
                tracing::debug!(timer = %id, event = %event.name, instance = %event.target, "timer fired");
                if let Err(err) = rt.deliver(event) {
                    rt.report(&format!("{id}"), &err);
                }
            });

        if let Err(err) = spawned {
            self.services.claim_timer(id);
            return Err(RuntimeError::TimerSpawn(err.to_string()));
        }
        Ok(id)
    }

    /// False when the timer already fired or was cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        self.services.cancel_timer(id)
    }

    // =========================================================================
    // Functions and bridges
    // =========================================================================

    pub fn register_function(
        &self,
        name: &str,
        function: impl Fn(&Arc<Runtime>, &Payload) -> Result<Value> + Send + Sync + 'static,
    ) {
        self.functions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(function));
    }

    pub fn call_function(self: &Arc<Self>, name: &str, args: &Payload) -> Result<Value> {
        let function = self
            .functions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))?;
        tracing::debug!(function = name, "calling function");
        function(self, args)
    }

    /// Registers the handler for an external entity, replacing any earlier
    /// one. Key letters are matched case-insensitively.
    pub fn register_bridge(&self, entity: &str, bridge: Arc<dyn Bridge>) {
        self.bridges
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.to_uppercase(), bridge);
    }

    pub fn bridge(self: &Arc<Self>, entity: &str, operation: &str, args: &Payload) -> Result<Value> {
        let bridge = self
            .bridges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity.to_uppercase())
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownBridge(entity.to_string()))?;
        bridge.call(self, operation, args)
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Logs a failure inside model code without interrupting the caller.
    pub fn report(&self, context: &str, err: &dyn std::error::Error) {
        tracing::warn!(model = %self.name, context, error = %err, "model code failed");
    }

    /// Cancels every timer and drops all instances, links and messages.
    /// Registered classes, functions and bridges stay.
    pub fn reset(&self) {
        self.services.clear();
        self.links.clear();
        self.store.clear();
    }
}
