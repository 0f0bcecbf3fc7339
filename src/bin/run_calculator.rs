//! 从检查点运行计算器
//!
//! 用法：`run_calculator <checkpoint.json>`。退出码即计算器的运行状态；
//! 参数个数不为一时什么也不做。

use clap::Parser;
use simex_rs::checkpoint::run_from_cli;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(
    name = "run_calculator",
    about = "Load a calculator checkpoint and run it"
)]
struct Args {
    /// Path to the checkpoint file
    checkpoint: Vec<PathBuf>,
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

    match run_from_cli(args.checkpoint) {
        Ok(Some(status)) => process::exit(status),
        Ok(None) => {}
        Err(err) => {
            tracing::error!(error = %err, "运行检查点失败");
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}
