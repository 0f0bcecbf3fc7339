//! 构建并运行（或写出检查点）一个 McStas 计算器

use clap::Parser;
use serde_json::{Map, Value};
use simex_rs::calc::Calculator;
use simex_rs::checkpoint::Checkpoint;
use simex_rs::mcstas::{McStasCalculator, McStasParameters};
use simex_rs::params::{CalculatorParameters, CpusPerTask};
use simex_rs::{CalcError, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(
    name = "mcstas_calc",
    about = "Build a McStas calculator, then run it or dump it to a checkpoint"
)]
struct Args {
    /// JSON object with McStas parameters (instrument, pars, ncount, mpi, ...)
    #[arg(long)]
    params: Option<PathBuf>,

    /// Instrument name; overrides the one in --params
    #[arg(long)]
    instrument: Option<String>,

    /// Directory holding <instrument>.instr
    #[arg(long)]
    input_path: Option<PathBuf>,

    /// Folder mcrun writes into
    #[arg(long)]
    output_path: PathBuf,

    /// Instrument parameter, repeatable: --par name=value
    #[arg(long = "par", value_parser = parse_par)]
    pars: Vec<(String, Value)>,

    /// Override any parameter key, repeatable: --set key=value (JSON value, else string)
    #[arg(long = "set", value_parser = parse_set)]
    overrides: Vec<(String, Value)>,

    /// Number of rays
    #[arg(long)]
    ncount: Option<f64>,

    /// Number of MPI processes
    #[arg(long)]
    mpi: Option<i64>,

    /// Write into <output>_<n> when the output folder exists
    #[arg(long)]
    increment_folder_name: bool,

    /// Extra flags passed to mcrun
    #[arg(long)]
    custom_flags: Option<String>,

    /// Program (and leading args) used instead of mcrun
    #[arg(long)]
    forced_launch_command: Option<String>,

    #[arg(long)]
    nodes_per_task: Option<i64>,

    /// Positive integer or MAX
    #[arg(long)]
    cpus_per_task: Option<String>,

    #[arg(long)]
    gpus_per_task: Option<i64>,

    /// Write a checkpoint here instead of running
    #[arg(long)]
    dump: Option<PathBuf>,
}

/// `name=value`；数值保持为数字，其余按字符串处理。
fn parse_par(raw: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ Value::Number(_)) => v,
        _ => Value::String(value.to_string()),
    };
    Ok((name.trim().to_string(), value))
}

/// `key=value`；值按 JSON 解析，失败时视为字符串。
fn parse_set(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let value = serde_json::from_str::<Value>(value)
        .unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.trim().to_string(), value))
}

fn load_params_map(args: &Args) -> Result<Map<String, Value>> {
    let mut map = match &args.params {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| CalcError::Io {
                path: path.clone(),
                source: e,
            })?;
            match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(CalcError::Type {
                        field: "params".to_string(),
                        expected: "object".to_string(),
                        found: "other JSON value".to_string(),
                    });
                }
                Err(e) => {
                    return Err(CalcError::Io {
                        path: path.clone(),
                        source: io::Error::from(e),
                    });
                }
            }
        }
        None => Map::new(),
    };

    if let Some(name) = &args.instrument {
        let input_path = args
            .input_path
            .as_ref()
            .map_or_else(|| ".".to_string(), |p| p.display().to_string());
        map.insert(
            "instrument".to_string(),
            serde_json::json!({ "name": name, "input_path": input_path }),
        );
    }
    map.entry("pars").or_insert_with(|| Value::Object(Map::new()));
    Ok(map)
}

fn build_parameters(args: &Args) -> Result<McStasParameters> {
    let mut params = McStasParameters::from_map(&load_params_map(args)?)?;
    for (key, value) in &args.overrides {
        params.set_from_value(key, value)?;
    }
    for (name, value) in &args.pars {
        params.set_par(name.clone(), value.clone())?;
    }
    if let Some(ncount) = args.ncount {
        params.set_ncount(ncount)?;
    }
    if let Some(mpi) = args.mpi {
        params.set_mpi(mpi)?;
    }
    if args.increment_folder_name {
        params.set_increment_folder_name(true);
    }
    if let Some(flags) = &args.custom_flags {
        params.set_custom_flags(flags.clone());
    }

    let resources = params.resources_mut();
    if let Some(cmd) = &args.forced_launch_command {
        resources.set_forced_launch_command(cmd.clone())?;
    }
    if let Some(nodes) = args.nodes_per_task {
        resources.set_nodes_per_task(nodes)?;
    }
    if let Some(cpus) = &args.cpus_per_task {
        resources.set_cpus_per_task(CpusPerTask::parse(cpus)?)?;
    }
    if let Some(gpus) = args.gpus_per_task {
        resources.set_gpus_per_task(gpus)?;
    }
    Ok(params)
}

fn run(args: &Args) -> Result<i32> {
    let params = build_parameters(args)?;
    let mut calculator = McStasCalculator::new(params, args.output_path.clone())?;

    if let Some(path) = &args.dump {
        calculator.dump_to_file(path)?;
        eprintln!("wrote checkpoint to {}", path.display());
        return Ok(0);
    }

    let outcome = calculator.backengine()?;
    println!(
        "done folder={} exit_code={} data_files={}",
        outcome.output_folder.display(),
        outcome.exit_code,
        outcome.data_files.len()
    );
    Ok(outcome.exit_code)
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(status) => process::exit(status),
        Err(err) => {
            tracing::error!(error = %err, "McStas 计算器失败");
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}
