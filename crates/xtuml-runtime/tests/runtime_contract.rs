use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use xtuml_runtime::{
    Bridge, ClassDef, DispatchOutcome, EventInstance, Payload, Runtime, RuntimeError, Transition,
    TransitionTable,
};

fn make_vending_runtime() -> Arc<Runtime> {
    let table = TransitionTable::new()
        .on(
            "Idle",
            "InsertCoin",
            Transition::to("Collecting").action(|_, owner, payload| {
                let amount = payload.get("amount").and_then(Value::as_i64).unwrap_or(0);
                let credit = owner.get_attr("credit").and_then(|v| v.as_i64()).unwrap_or(0);
                owner.set_attr("credit", json!(credit + amount));
                Ok(())
            }),
        )
        .on(
            "Collecting",
            "Select",
            Transition::to("Dispensing")
                .guard(|owner, _| owner.get_attr("credit").and_then(|v| v.as_i64()) >= Some(100))
                .action(|rt, owner, _| {
                    // Generating to self from inside the action must not deadlock.
                    rt.dispatch(owner, "Dispense", Payload::new()).map(|_| ())
                }),
        )
        .on("Dispensing", "Dispense", Transition::to("Idle"))
        .on("Collecting_Refund", "Cancel", Transition::to("Idle"))
        .with_base_aliases(&["Idle", "Collecting", "Dispensing"]);

    let rt = Runtime::new("vending");
    rt.register_class(
        ClassDef::new("VendingMachine", "VM")
            .attribute("credit", json!(0))
            .state_machine("Idle", table),
    );
    rt.register_class(ClassDef::new("Product", "PRD"));
    rt
}

fn amount(value: i64) -> Payload {
    Payload::from([("amount".to_string(), json!(value))])
}

fn wait_until(deadline: Duration, condition: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// =============================================================================
// Links
// =============================================================================

#[test]
fn test_links_are_symmetric_and_idempotent() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let product = rt.create("PRD").unwrap();

    assert!(rt.relate("R2", &vm, &product).unwrap());
    assert!(!rt.relate("R2", &product, &vm).unwrap());
    assert_eq!(rt.links().count("R2"), 1);
    assert_eq!(rt.select_related("R2", &product, Some("VM"))[0].id(), vm.id());
    assert_eq!(rt.select_one_related("R2", &vm, Some("Product")).unwrap().id(), product.id());

    assert!(rt.unrelate("R2", &product, &vm));
    assert!(rt.select_related("R2", &vm, None).is_empty());
}

#[test]
fn test_relate_all_is_atomic() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let a = rt.create("PRD").unwrap();
    let gone = rt.create("PRD").unwrap();
    assert!(rt.delete(&gone));

    let err = rt.relate_all("R2", &[(&*vm, &*a), (&*vm, &*gone)]).unwrap_err();
    assert_eq!(err, RuntimeError::UnknownInstance(gone.id()));
    assert_eq!(rt.links().count("R2"), 0);
}

#[test]
fn test_delete_forgets_links() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let product = rt.create("PRD").unwrap();
    rt.relate("R2", &vm, &product).unwrap();

    assert!(rt.delete(&product));
    assert!(!rt.delete(&product));
    assert!(rt.select_related("R2", &vm, None).is_empty());
    assert_eq!(rt.select_all("PRD").len(), 0);
}

#[test]
fn test_navigate_chains_hops() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let product = rt.create("PRD").unwrap();
    let other = rt.create("VM").unwrap();
    rt.relate("R2", &vm, &product).unwrap();
    rt.relate("R3", &product, &other).unwrap();

    let reached = rt.navigate(&vm, &[("R2", Some("PRD")), ("R3", Some("VM"))]);
    assert_eq!(reached.len(), 1);
    assert_eq!(reached[0].id(), other.id());
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn test_dispatch_runs_action_and_tracks_state() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    assert_eq!(vm.get_attr("currentState"), Some(json!("Idle")));

    let outcome = rt.dispatch(&vm, "InsertCoin", amount(150)).unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Transitioned {
            from: "Idle".into(),
            to: "Collecting".into()
        }
    );
    assert_eq!(vm.get_attr("credit"), Some(json!(150)));
    assert_eq!(vm.get_attr("currentState"), Some(json!("Collecting")));
}

#[test]
fn test_unknown_event_is_ignored() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    assert_eq!(
        rt.dispatch(&vm, "Dispense", Payload::new()).unwrap(),
        DispatchOutcome::Ignored { state: "Idle".into() }
    );
    assert!(vm.state_machine().unwrap().history().is_empty());
}

#[test]
fn test_guard_rejection_keeps_state() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    rt.dispatch(&vm, "InsertCoin", amount(50)).unwrap();
    assert_eq!(
        rt.dispatch(&vm, "Select", Payload::new()).unwrap(),
        DispatchOutcome::GuardRejected { state: "Collecting".into() }
    );
}

#[test]
fn test_action_can_generate_to_self() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    rt.dispatch(&vm, "InsertCoin", amount(100)).unwrap();
    rt.dispatch(&vm, "Select", Payload::new()).unwrap();

    assert_eq!(vm.current_state().as_deref(), Some("Idle"));
    let events: Vec<String> = vm
        .state_machine()
        .unwrap()
        .history()
        .into_iter()
        .map(|h| h.event)
        .collect();
    assert_eq!(events, vec!["InsertCoin", "Select", "Dispense"]);
}

#[test]
fn test_failing_action_does_not_abort_dispatch() {
    let table = TransitionTable::new().on(
        "Off",
        "Toggle",
        Transition::to("On").action(|_, _, _| Err(RuntimeError::Action("bulb blew".into()))),
    );
    let rt = Runtime::new("lamp");
    rt.register_class(ClassDef::new("Lamp", "LMP").state_machine("Off", table));
    let lamp = rt.create("LMP").unwrap();

    let outcome = rt.dispatch(&lamp, "Toggle", Payload::new()).unwrap();
    assert!(matches!(outcome, DispatchOutcome::Transitioned { .. }));
    assert_eq!(lamp.current_state().as_deref(), Some("On"));
}

#[test]
fn test_alias_rows_apply_to_base_state() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    rt.dispatch(&vm, "InsertCoin", amount(10)).unwrap();
    let outcome = rt
        .deliver(EventInstance::new("Cancel", &vm, Payload::new()))
        .unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Transitioned {
            from: "Collecting".into(),
            to: "Idle".into()
        }
    );
}

#[test]
fn test_dispatch_without_state_machine() {
    let rt = make_vending_runtime();
    let product = rt.create("PRD").unwrap();
    assert_eq!(
        rt.dispatch(&product, "Anything", Payload::new()),
        Err(RuntimeError::NoStateMachine(product.id()))
    );
}

#[test]
fn test_concurrent_dispatch_is_serialized_per_instance() {
    let table = TransitionTable::new()
        .on("A", "flip", Transition::to("B"))
        .on("B", "flip", Transition::to("A"));
    let rt = Runtime::new("flipper");
    rt.register_class(ClassDef::new("Flipper", "FLP").state_machine("A", table));
    let flipper = rt.create("FLP").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let rt = Arc::clone(&rt);
            let flipper = Arc::clone(&flipper);
            thread::spawn(move || {
                for _ in 0..25 {
                    rt.dispatch(&flipper, "flip", Payload::new()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let history = flipper.state_machine().unwrap().history();
    assert_eq!(history.len(), 200);
    assert!(history.windows(2).all(|w| w[0].to == w[1].from));
    assert_eq!(flipper.current_state().as_deref(), Some("A"));
}

// =============================================================================
// Timers
// =============================================================================

#[test]
fn test_timer_fires_and_unregisters() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let id = rt
        .start_timer(EventInstance::new("InsertCoin", &vm, amount(25)), Duration::from_millis(20))
        .unwrap();
    assert_eq!(rt.services().active_timers(), vec![id]);

    assert!(wait_until(Duration::from_secs(2), || vm.get_attr("credit") == Some(json!(25))));
    assert!(wait_until(Duration::from_secs(1), || rt.services().active_timers().is_empty()));
    assert!(!rt.cancel_timer(id));
}

#[test]
fn test_cancelled_timer_never_fires() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let id = rt
        .start_timer(EventInstance::new("InsertCoin", &vm, amount(25)), Duration::from_millis(50))
        .unwrap();

    assert!(rt.cancel_timer(id));
    thread::sleep(Duration::from_millis(150));
    assert_eq!(vm.current_state().as_deref(), Some("Idle"));
    assert_eq!(vm.get_attr("credit"), Some(json!(0)));
}

// =============================================================================
// Functions and bridges
// =============================================================================

struct Display {
    shown: Mutex<Vec<String>>,
}

impl Bridge for Display {
    fn call(&self, _rt: &Arc<Runtime>, operation: &str, args: &Payload) -> xtuml_runtime::Result<Value> {
        match operation {
            "show" => {
                let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
                self.shown.lock().unwrap().push(text.to_string());
                Ok(Value::Null)
            }
            _ => Err(RuntimeError::UnknownBridgeOperation {
                entity: "DSP".into(),
                operation: operation.into(),
            }),
        }
    }
}

#[test]
fn test_bridges_are_bound_per_runtime() {
    let first = make_vending_runtime();
    let second = make_vending_runtime();
    let display = Arc::new(Display {
        shown: Mutex::new(Vec::new()),
    });
    first.register_bridge("DSP", display.clone());

    let args = Payload::from([("text".to_string(), json!("Insert coin"))]);
    first.bridge("dsp", "show", &args).unwrap();
    assert!(second.bridge("DSP", "show", &args).is_err());
    assert_eq!(*display.shown.lock().unwrap(), vec!["Insert coin"]);
}

#[test]
fn test_functions_receive_runtime() {
    let rt = make_vending_runtime();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    rt.register_function("restock", move |rt, args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let count = args.get("count").and_then(Value::as_u64).unwrap_or(1);
        for _ in 0..count {
            rt.create("PRD")?;
        }
        Ok(json!(rt.select_all("PRD").len()))
    });

    let result = rt
        .call_function("restock", &Payload::from([("count".to_string(), json!(3))]))
        .unwrap();
    assert_eq!(result, json!(3));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reset_clears_instances_but_keeps_classes() {
    let rt = make_vending_runtime();
    let vm = rt.create("VM").unwrap();
    let product = rt.create("PRD").unwrap();
    rt.relate("R2", &vm, &product).unwrap();
    rt.send_message(&vm, "hello", Payload::new());

    rt.reset();
    assert!(rt.store().is_empty());
    assert_eq!(rt.links().count("R2"), 0);
    assert!(rt.services().messages().is_empty());
    assert!(rt.create("VM").is_ok());
}
