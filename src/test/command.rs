use crate::calc::{Calculator, IoPath};
use crate::command::{CommandCalculator, CommandParameters};
use crate::error::ErrorClass;
use crate::params::CalculatorParameters;
use serde_json::json;

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parameters_require_a_program() {
    let err = CommandParameters::new("  ", Vec::new()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Value);

    let m = json!({ "args": ["-v"] });
    assert!(CommandParameters::from_map(m.as_object().unwrap()).is_err());
}

#[test]
fn parameters_from_map() {
    let m = json!({
        "program": "simulate",
        "args": ["--in", "{input}"],
        "nodes_per_task": 2,
        "forced_launch_command": "mpirun -np 4"
    });
    let p = CommandParameters::from_map(m.as_object().unwrap()).unwrap();
    assert_eq!(p.program(), "simulate");
    assert_eq!(p.args(), args(&["--in", "{input}"]).as_slice());
    assert_eq!(p.resources().nodes_per_task(), 2);
    assert_eq!(p.resources().forced_launch_command(), "mpirun -np 4");

    let bad = json!({ "program": "simulate", "args": "--in" });
    let err = CommandParameters::from_map(bad.as_object().unwrap()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Type);
}

#[test]
fn placeholders_are_substituted() {
    let p = CommandParameters::new("simulate", args(&["--in={input}", "--out", "{output}"]))
        .unwrap();
    let calc = CommandCalculator::new(p, "/data/in.h5", "out.h5").unwrap();
    let (program, argv) = calc.command_line();
    assert_eq!(program, "simulate");
    assert_eq!(argv, args(&["--in=/data/in.h5", "--out", "out.h5"]));
}

#[test]
fn launch_prefix_wraps_the_program() {
    let mut p = CommandParameters::new("simulate", args(&["{output}"])).unwrap();
    p.resources_mut().set_forced_launch_command("mpirun -np 4").unwrap();
    let calc = CommandCalculator::new(p, "/in", "/out").unwrap();
    let (program, argv) = calc.command_line();
    assert_eq!(program, "mpirun");
    assert_eq!(argv, args(&["-np", "4", "simulate", "/out"]));
}

#[test]
fn base_accessors() {
    let p = CommandParameters::new("simulate", Vec::new()).unwrap();
    let mut calc = CommandCalculator::new(p, "in", "out").unwrap();
    assert!(calc.input_path().is_absolute());
    calc.base_mut().set_output_path("elsewhere").unwrap();
    assert_eq!(calc.base().output_path(), &IoPath::from("elsewhere"));
}

#[cfg(unix)]
#[test]
fn run_returns_program_exit_status() {
    let ok = CommandParameters::new("true", Vec::new()).unwrap();
    let mut calc = CommandCalculator::new(ok, "in", "out").unwrap();
    assert_eq!(calc.run().unwrap(), 0);

    let fail = CommandParameters::new("sh", args(&["-c", "exit 7"])).unwrap();
    let mut calc = CommandCalculator::new(fail, "in", "out").unwrap();
    assert_eq!(calc.run().unwrap(), 7);
}

#[test]
fn missing_program_is_an_io_error() {
    let p = CommandParameters::new("simex-rs-definitely-missing", Vec::new()).unwrap();
    let mut calc = CommandCalculator::new(p, "in", "out").unwrap();
    assert_eq!(calc.backengine().unwrap_err().class(), ErrorClass::Io);
}
