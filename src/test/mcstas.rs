use super::unique_temp_dir;
use crate::calc::{Calculator, IoPath};
use crate::error::{ErrorClass, Result};
use crate::mcstas::{
    DEFAULT_MPI, DEFAULT_NCOUNT, Instrument, InstrumentRunner, McStasCalculator, McStasParameters,
    RunOutcome, RunRequest, command_line, resolve_output_folder,
};
use crate::params::{CalculatorParameters, CpusPerTask};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn instrument() -> Instrument {
    Instrument::new("ESS_BEER")
        .unwrap()
        .with_input_path("/opt/instruments")
}

fn pars() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("lambda".to_string(), json!(2.5)),
        ("sample".to_string(), json!("Ni")),
    ])
}

fn map(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("object literal")
}

#[derive(Default)]
struct RecordingRunner {
    folders: Vec<PathBuf>,
    ncounts: Vec<f64>,
    mpis: Vec<u64>,
    increments: Vec<bool>,
}

impl InstrumentRunner for RecordingRunner {
    fn run_full_instrument(&mut self, req: &RunRequest<'_>) -> Result<RunOutcome> {
        self.folders.push(req.output_folder.to_path_buf());
        self.ncounts.push(req.ncount);
        self.mpis.push(req.mpi);
        self.increments.push(req.increment_folder_name);
        Ok(RunOutcome {
            output_folder: req.output_folder.to_path_buf(),
            exit_code: 0,
            data_files: vec![req.output_folder.join("mccode.sim")],
        })
    }
}

#[test]
fn parameters_defaults() {
    let p = McStasParameters::new(instrument(), pars()).unwrap();
    assert_eq!(p.mpi(), DEFAULT_MPI);
    assert_eq!(p.ncount(), DEFAULT_NCOUNT);
    assert!(!p.increment_folder_name());
    assert_eq!(p.custom_flags(), "");
    assert_eq!(p.resources().nodes_per_task(), 1);
    assert_eq!(p.resources().cpus_per_task(), CpusPerTask::Count(1));
    assert_eq!(p.resources().gpus_per_task(), 0);
    assert_eq!(p.resources().forced_launch_command(), "");
}

#[test]
fn parameters_from_map() {
    let p = McStasParameters::from_map(&map(json!({
        "instrument": { "name": "ESS_BEER", "input_path": "/opt/instruments" },
        "pars": { "lambda": 2.5 },
        "ncount": 5000,
        "mpi": 4,
        "increment_folder_name": true,
        "custom_flags": "--gravitation",
        "nodes_per_task": 2,
        "cpus_per_task": 4
    })))
    .unwrap();
    assert_eq!(p.instrument(), &instrument());
    assert_eq!(p.pars().get("lambda"), Some(&json!(2.5)));
    assert_eq!(p.ncount(), 5000.0);
    assert_eq!(p.mpi(), 4);
    assert!(p.increment_folder_name());
    assert_eq!(p.custom_flags(), "--gravitation");
    assert_eq!(p.resources().nodes_per_task(), 2);
    assert_eq!(p.resources().cpus_per_task(), CpusPerTask::Count(4));
}

#[test]
fn parameters_require_instrument_and_pars() {
    let err = McStasParameters::from_map(&map(json!({ "pars": {} }))).unwrap_err();
    assert!(err.to_string().contains("instrument"));

    let err = McStasParameters::from_map(&map(json!({
        "instrument": { "name": "x" }
    })))
    .unwrap_err();
    assert!(err.to_string().contains("pars"));
}

#[test]
fn parameters_reject_wrong_shapes() {
    let base = json!({ "instrument": { "name": "x" }, "pars": {} });
    let cases = [
        ("pars", json!([1, 2]), ErrorClass::Type),
        ("pars", json!({ "a": [1] }), ErrorClass::Type),
        ("instrument", json!("x"), ErrorClass::Type),
        ("mpi", json!(2.5), ErrorClass::Type),
        ("mpi", json!(0), ErrorClass::Value),
        ("ncount", json!("many"), ErrorClass::Type),
        ("ncount", json!(-1), ErrorClass::Value),
        ("increment_folder_name", json!("yes"), ErrorClass::Type),
        ("custom_flags", json!(3), ErrorClass::Type),
        ("nodes_per_task", json!(-1), ErrorClass::Value),
    ];
    for (key, value, class) in cases {
        let mut m = map(base.clone());
        m.insert(key.to_string(), value.clone());
        let err = McStasParameters::from_map(&m).unwrap_err();
        assert_eq!(err.class(), class, "{key}={value}");
    }
}

#[test]
fn instrument_names_must_be_identifiers() {
    assert!(Instrument::new("templateDIFF").is_ok());
    assert!(Instrument::new("_x1").is_ok());
    for bad in ["", "1abc", "my instr", "a-b"] {
        let err = Instrument::new(bad).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Value, "{bad}");
    }
    assert_eq!(
        instrument().instr_file(),
        Path::new("/opt/instruments/ESS_BEER.instr")
    );
}

#[test]
fn setters_validate() {
    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    assert!(p.set_mpi(0).is_err());
    assert_eq!(p.mpi(), DEFAULT_MPI);
    assert!(p.set_ncount(f64::NAN).is_err());
    assert!(p.set_ncount(0.0).is_err());
    p.set_ncount(1e7).unwrap();
    assert_eq!(p.ncount(), 1e7);
    assert!(p.set_par("", json!(1)).is_err());
    assert!(p.set_par("flag", json!(true)).is_err());
    p.set_par("theta", json!(30)).unwrap();
    assert_eq!(p.pars().get("theta"), Some(&json!(30)));
}

#[test]
fn set_from_value_routes_keys() {
    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    p.set_from_value("ncount", &json!(100)).unwrap();
    p.set_from_value("gpus_per_task", &json!(1)).unwrap();
    p.set_from_value("lambda", &json!(4.0)).unwrap();
    assert_eq!(p.ncount(), 100.0);
    assert_eq!(p.resources().gpus_per_task(), 1);
    assert_eq!(p.pars().get("lambda"), Some(&json!(4.0)));
    assert!(p.set_from_value("mpi", &json!("four")).is_err());
}

#[test]
fn calculator_input_path_comes_from_instrument() {
    let p = McStasParameters::new(instrument(), pars()).unwrap();
    let calc = McStasCalculator::new(p, "beer_out").unwrap();
    assert_eq!(calc.input_path(), &IoPath::from("/opt/instruments"));
    assert_eq!(calc.output_path(), &IoPath::from("beer_out"));
}

#[test]
fn calculator_relative_instrument_dir_is_made_absolute() {
    let inst = Instrument::new("demo").unwrap();
    let p = McStasParameters::new(inst, BTreeMap::new()).unwrap();
    let calc = McStasCalculator::new(p, "out").unwrap();
    assert!(calc.input_path().is_absolute());
}

#[test]
fn calculator_rejects_multiple_output_folders() {
    let p = McStasParameters::new(instrument(), pars()).unwrap();
    let err = McStasCalculator::new(p.clone(), vec!["a", "b"]).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Value);
    let calc = McStasCalculator::new(p, vec!["a"]).unwrap();
    assert_eq!(calc.output_path(), &IoPath::from("a"));
}

#[test]
fn set_parameters_rederives_input_path() {
    let p = McStasParameters::new(instrument(), pars()).unwrap();
    let calc = McStasCalculator::new(p.clone(), "out").unwrap();
    let mut moved = p;
    moved.set_instrument(Instrument::new("ESS_BEER").unwrap().with_input_path("/srv/other"));
    let calc2 = calc.with_parameters(moved).unwrap();
    assert_eq!(calc2.input_path(), &IoPath::from("/srv/other"));
    assert_eq!(calc.input_path(), &IoPath::from("/opt/instruments"));
}

#[test]
fn backengine_forwards_parameters_and_returns_outcome_unmodified() {
    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    p.set_mpi(8).unwrap();
    p.set_ncount(2e5).unwrap();
    p.set_increment_folder_name(true);
    let calc = McStasCalculator::new(p, "beer_out").unwrap();

    let mut runner = RecordingRunner::default();
    let outcome = calc.backengine_with(&mut runner).unwrap();
    assert_eq!(runner.folders, vec![PathBuf::from("beer_out")]);
    assert_eq!(runner.ncounts, vec![2e5]);
    assert_eq!(runner.mpis, vec![8]);
    assert_eq!(runner.increments, vec![true]);
    assert_eq!(outcome.output_folder, PathBuf::from("beer_out"));
    assert_eq!(outcome.data_files, vec![PathBuf::from("beer_out/mccode.sim")]);
}

#[test]
fn mcrun_command_line_order() {
    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    p.set_mpi(4).unwrap();
    p.set_custom_flags("--gravitation -s 7");
    let req = RunRequest {
        instrument: p.instrument(),
        pars: p.pars(),
        output_folder: Path::new("out"),
        mpi: p.mpi(),
        ncount: p.ncount(),
        increment_folder_name: false,
        custom_flags: p.custom_flags(),
        forced_launch_command: "",
    };
    let (program, args) = command_line(&req, Path::new("out"));
    assert_eq!(program, "mcrun");
    assert_eq!(
        args,
        vec![
            "-c",
            "-n",
            "1000000",
            "-d",
            "out",
            "--mpi=4",
            "--gravitation",
            "-s",
            "7",
            "/opt/instruments/ESS_BEER.instr",
            "lambda=2.5",
            "sample=Ni",
        ]
    );
}

#[test]
fn forced_launch_command_replaces_mcrun() {
    let p = McStasParameters::new(instrument(), BTreeMap::new()).unwrap();
    let req = RunRequest {
        instrument: p.instrument(),
        pars: p.pars(),
        output_folder: Path::new("out"),
        mpi: 1,
        ncount: 10.0,
        increment_folder_name: false,
        custom_flags: "",
        forced_launch_command: "/opt/mcstas/bin/mcrun --verbose",
    };
    let (program, args) = command_line(&req, Path::new("out"));
    assert_eq!(program, "/opt/mcstas/bin/mcrun");
    assert_eq!(args[0], "--verbose");
    assert_eq!(args[1], "-c");
}

#[test]
fn output_folder_increment_picks_first_free_suffix() {
    let dir = unique_temp_dir("mcstas-increment");
    let requested = dir.join("run");

    assert_eq!(resolve_output_folder(&requested, true), requested);

    fs::create_dir_all(&requested).unwrap();
    assert_eq!(resolve_output_folder(&requested, false), requested);
    assert_eq!(resolve_output_folder(&requested, true), dir.join("run_0"));

    fs::create_dir_all(dir.join("run_0")).unwrap();
    fs::create_dir_all(dir.join("run_1")).unwrap();
    assert_eq!(resolve_output_folder(&requested, true), dir.join("run_2"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn data_contract_hooks() {
    let p = McStasParameters::new(instrument(), pars()).unwrap();
    let mut calc = McStasCalculator::new(p, "out").unwrap();
    assert!(calc.expected_data().is_empty());
    assert_eq!(calc.provided_data(), &["mccode.sim", "mccode.dat"]);
    calc.read_structured().unwrap();
    calc.save_structured().unwrap();
}

#[cfg(unix)]
#[test]
fn backengine_runs_forced_command_and_collects_data_files() {
    let dir = unique_temp_dir("mcstas-true");
    let out = dir.join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("mccode.sim"), "").unwrap();
    fs::write(out.join("detector.dat"), "").unwrap();
    fs::write(out.join("notes.txt"), "").unwrap();

    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    p.resources_mut().set_forced_launch_command("true").unwrap();
    let mut calc = McStasCalculator::new(p, out.clone()).unwrap();
    let outcome = calc.backengine().unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.output_folder, out);
    assert_eq!(
        outcome.data_files,
        vec![out.join("detector.dat"), out.join("mccode.sim")]
    );

    let _ = fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn run_returns_backend_exit_code() {
    let mut p = McStasParameters::new(instrument(), pars()).unwrap();
    p.resources_mut().set_forced_launch_command("false").unwrap();
    let mut calc = McStasCalculator::new(p, "never_written").unwrap();
    assert_eq!(calc.run().unwrap(), 1);
}
