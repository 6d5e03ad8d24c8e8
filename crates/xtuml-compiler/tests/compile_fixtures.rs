//! End-to-end compilation of the fixture models.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use xtuml_compiler::{compile_document, Compiler, CompilerConfig, CompilerError};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_fixture(name: &str) -> Value {
    let source = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&source).unwrap()
}

#[test]
fn test_vending_machine_generates_project() {
    let code = compile_document(&load_fixture("vending_machine.json")).unwrap();

    for path in [
        "runtime/__init__.py",
        "runtime/base.py",
        "runtime/services.py",
        "models/__init__.py",
        "models/VendingMachine.py",
        "models/Product.py",
        "models/Payment.py",
        "models/CardPayment.py",
        "models/CashPayment.py",
        "models/Display.py",
        "models/VendingMachine_Product_R1.py",
        "functions.py",
        "app.py",
    ] {
        assert!(code.get(path).is_some(), "missing {path}");
    }
    assert_eq!(code.unresolved().count(), 0, "{:?}", code.warnings);
}

#[test]
fn test_vending_machine_state_table() {
    let code = compile_document(&load_fixture("vending_machine.json")).unwrap();
    let machine = code.get("models/VendingMachine.py").unwrap();

    assert!(machine.contains("        self.set_attr(\"machine_id\", str(uuid.uuid4()))  # unique_id\n"));
    assert!(machine.contains("initial_state = self.get_attr(\"currentState\") or \"Idle\""));
    assert!(machine.contains("def _sm_action_Idle_InsertCoin(self, owner, payload: Dict[str, Any]) -> None:"));
    assert!(machine.contains("# Event parameters: amount: integer"));
    assert!(machine.contains("# Collecting inherits from Collecting_Selection"));
    assert!(machine.contains(
        "table.setdefault(\"Collecting\", {})[\"Dispense\"] = (None, self._sm_action_Collecting_Selection_Dispense, \"Idle\")"
    ));
    assert!(machine.contains(
        "table.setdefault(\"Collecting_Selection\", {})[\"Cancel\"] = (None, None, \"Idle\")"
    ));
    assert!(machine.contains("rt.bridge(\"TIM\", \"timer_start\""));
    assert!(machine.contains("def refund(self, amount: int = 0, **kwargs):"));
}

#[test]
fn test_vending_machine_generalization_and_association() {
    let code = compile_document(&load_fixture("vending_machine.json")).unwrap();

    let card = code.get("models/CardPayment.py").unwrap();
    assert!(card.contains("    supertype = \"Payment\"\n"));
    assert!(card.contains("select_one_related(\"R3\", self, \"Payment\")"));

    let payment = code.get("models/Payment.py").unwrap();
    let subtypes = payment.lines().find(|l| l.trim_start().starts_with("subtypes = ")).unwrap();
    assert!(subtypes.contains("\"CardPayment\"") && subtypes.contains("\"CashPayment\""));

    let assoc = code.get("models/VendingMachine_Product_R1.py").unwrap();
    assert!(assoc.contains("self.set_attr(\"slot\", 0)  # integer"));
    assert!(assoc.contains("def get_vendingmachine(self)"));

    let index = code.get("models/__init__.py").unwrap();
    assert!(index.contains("VM = VendingMachine\n"));
    assert!(index.contains("EXTERNAL_ENTITIES = [Display]\n"));

    let display = code.get("models/Display.py").unwrap();
    assert!(display.contains("class Display:\n"));
    assert!(!display.contains("InstanceBase"));
}

#[test]
fn test_vending_machine_functions_and_app() {
    let code = compile_document(&load_fixture("vending_machine.json")).unwrap();

    let functions = code.get("functions.py").unwrap();
    assert!(functions.contains("def restock(rt, count: int = 0, **kwargs):"));
    assert!(functions.contains("    for product in (products or []):\n"));
    assert!(functions.contains("rt.bridge(\"DSP\", \"show\", text=\"restocked\")"));

    let app = code.get("app.py").unwrap();
    assert!(app.contains("    functions.register_all(rt)\n"));
    assert!(app.contains("instances.get(\"vendingmachine\")"));
    assert!(app.contains("# main_instance.dispatch_event(\"InsertCoin\", amount=0)"));
}

#[test]
fn test_broken_model_reports_every_issue() {
    let mut doc = load_fixture("vending_machine.json");
    doc["model"][0]["states"][0]["next_state"] = Value::from("Nowhere");
    doc["model"][1]["attributes"][0]["data_type"] = Value::from("money");
    doc["functions"][0]["action"] = Value::from("select any x from instances of Ghost;");

    let err = compile_document(&doc).unwrap_err();
    let paths: Vec<&str> = err.issues().iter().map(|i| i.path.as_str()).collect();
    assert!(paths.contains(&"classes[0].states[0].next_state"), "{paths:?}");
    assert!(paths.contains(&"classes[1].attributes[0].data_type"), "{paths:?}");
    assert!(paths.contains(&"functions[0].action.line1"), "{paths:?}");
}

#[test]
fn test_compiler_writes_project() {
    let out = tempfile::tempdir().unwrap();
    let compiler = Compiler::new(CompilerConfig {
        input: fixture_path("vending_machine.json"),
        out_dir: out.path().to_path_buf(),
        model_name: None,
        strict_symbols: true,
    });

    let result = compiler.compile().unwrap();
    assert_eq!(result.models, 1);
    assert_eq!(result.outputs, vec![out.path().to_path_buf()]);
    assert!(out.path().join("models/VendingMachine.py").is_file());
    assert!(out.path().join("runtime/relationship.py").is_file());
    assert_eq!(compiler.check().unwrap(), 1);
}

#[test]
fn test_invalid_json_is_reported_with_position() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\n  \"model\": [\n}").unwrap();

    let compiler = Compiler::new(CompilerConfig {
        input: path,
        out_dir: dir.path().join("out"),
        ..Default::default()
    });
    match compiler.compile() {
        Err(CompilerError::InvalidJson { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected invalid JSON, got {other:?}"),
    }
}

#[test]
fn test_compile_is_deterministic() {
    let doc = load_fixture("vending_machine.json");
    let first = compile_document(&doc).unwrap();
    let second = compile_document(&doc).unwrap();
    assert_eq!(first.files, second.files);
}

fn python3_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

const DRIVER: &str = r#"
import app

rt = app.build_runtime(verbose=False)
machine = rt.create("VM")
product = rt.create("Product")
assert rt.links.relate("R1", machine, product)
assert rt.links.select_related("R1", machine) == [product]
assert rt.links.select_related("R1", product) == [machine]
assert machine.get_current_state() == "Idle"
assert machine.dispatch_event("InsertCoin", amount=5)
assert machine.get_current_state() == "Collecting"
print("driver ok")
"#;

#[test]
fn test_generated_project_runs_under_python() {
    if !python3_available() {
        eprintln!("python3 not found, skipping");
        return;
    }
    let out = tempfile::tempdir().unwrap();
    let compiler = Compiler::new(CompilerConfig {
        input: fixture_path("vending_machine.json"),
        out_dir: out.path().to_path_buf(),
        model_name: None,
        strict_symbols: true,
    });
    compiler.compile().unwrap();

    let app = Command::new("python3")
        .arg("app.py")
        .current_dir(out.path())
        .output()
        .unwrap();
    assert!(app.status.success(), "{}", String::from_utf8_lossy(&app.stderr));
    assert!(String::from_utf8_lossy(&app.stdout).contains("system start"));

    let driver = Command::new("python3")
        .arg("-c")
        .arg(DRIVER)
        .current_dir(out.path())
        .output()
        .unwrap();
    assert!(driver.status.success(), "{}", String::from_utf8_lossy(&driver.stderr));
    assert!(String::from_utf8_lossy(&driver.stdout).contains("driver ok"));
}
