//! interest - run one interestingness test and report the verdict
//!
//! ```text
//! interest hangs 3 ./js --fuzzing-safe testcase.js
//! interest range -n RANGENUM 1 5 hangs 3 ./js --seed=RANGENUM testcase.js
//! interest ./my-check.sh testcase.js
//! ```
//!
//! The verdict is printed on stdout and encoded in the exit code
//! (0 interesting, 1 not interesting, 10+ errors). Logs go to stderr.

use clap::{Args, Parser, ValueEnum};
use interest_core::config::{ConfigError, ExecConfig, CONFIG_ENV_VAR};
use interest_core::exec::ProcessExecutor;
use interest_core::exit_codes::ExitCode;
use interest_core::interesting::{TestContext, TestError, TestRegistry};
use interest_core::logging::{
    init_logging, LogConfig, LogFormat, LogLevel, TracingSink, LOG_FORMAT_ENV_VAR,
    LOG_LEVEL_ENV_VAR, LOG_TIMESTAMPS_ENV_VAR,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Interestingness tests for test-case reducers
#[derive(Parser)]
#[command(name = "interest")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    /// List the built-in tests and exit
    #[arg(long, conflicts_with = "invocation")]
    list: bool,

    /// Test name (or script path) followed by its arguments
    #[arg(
        value_name = "TEST [ARGS]",
        trailing_var_arg = true,
        required_unless_present = "list"
    )]
    invocation: Vec<String>,
}

/// Options that apply to every invocation
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Scratch prefix for captured output (`<prefix>-out.txt`, `<prefix>-err.txt`)
    #[arg(long, env = "INTEREST_TEMP_PREFIX", default_value = "")]
    temp_prefix: String,

    /// Output format for the verdict
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, env = LOG_LEVEL_ENV_VAR)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, env = LOG_FORMAT_ENV_VAR)]
    log_format: Option<LogFormat>,

    /// Prefix human log lines with a timestamp
    #[arg(long, env = LOG_TIMESTAMPS_ENV_VAR)]
    log_timestamps: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Executor config file (TOML)
    #[arg(long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Grace period between SIGTERM and SIGKILL for timed-out targets
    #[arg(long, value_name = "MS")]
    kill_grace_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format)
        .with_verbosity(cli.global.verbose, cli.global.quiet)
        .with_timestamps(cli.global.log_timestamps);
    init_logging(&log_config);

    let exit_code = run(&cli);
    debug!(exit_code = %exit_code, "done");
    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli) -> ExitCode {
    let registry = Arc::new(TestRegistry::builtin());

    if cli.list {
        print_tests(&cli.global, &registry);
        return ExitCode::Interesting;
    }

    let exec_config = match load_exec_config(&cli.global) {
        Ok(config) => config,
        Err(e) => return output_error(&cli.global, ExitCode::from(&e), &e),
    };
    let script_timeout = exec_config.script_timeout;
    debug!(?exec_config, "executor configured");

    let ctx = TestContext::new(
        Arc::new(ProcessExecutor::new(exec_config)),
        Arc::new(TracingSink),
        registry,
    )
    .with_script_timeout(script_timeout);

    let Some((name, args)) = cli.invocation.split_first() else {
        let e = TestError::MissingArgument("test");
        return output_error(&cli.global, ExitCode::from(&e), &e);
    };

    match run_test(&ctx, name, args, &cli.global.temp_prefix) {
        Ok(interesting) => {
            let code = ExitCode::from_verdict(interesting);
            output_verdict(&cli.global, name, interesting, code);
            code
        }
        Err(e) => output_error(&cli.global, ExitCode::from(&e), &e),
    }
}

fn load_exec_config(global: &GlobalOpts) -> Result<ExecConfig, ConfigError> {
    let mut config = ExecConfig::resolve(global.config.as_deref())?;
    if let Some(ms) = global.kill_grace_ms {
        config = config.with_kill_grace(Duration::from_millis(ms));
        config.validate()?;
    }
    Ok(config)
}

fn run_test(
    ctx: &TestContext,
    name: &str,
    args: &[String],
    temp_prefix: &str,
) -> Result<bool, TestError> {
    let mut test = ctx.resolve(name)?;
    test.init(args)?;
    test.interesting(args, temp_prefix)
}

fn print_tests(global: &GlobalOpts, registry: &TestRegistry) {
    let names: Vec<&str> = registry.names().collect();
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "tests": names }));
        }
        OutputFormat::Human => {
            for name in names {
                println!("{}", name);
            }
        }
    }
}

fn output_verdict(global: &GlobalOpts, test: &str, interesting: bool, code: ExitCode) {
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "test": test,
                "interesting": interesting,
                "exit_code": code.as_i32(),
            });
            println!("{}", response);
        }
        OutputFormat::Human => {
            if interesting {
                println!("interesting");
            } else {
                println!("not interesting");
            }
        }
    }
}

/// Report an error in the requested format and return its exit code.
fn output_error(
    global: &GlobalOpts,
    code: ExitCode,
    error: &dyn std::error::Error,
) -> ExitCode {
    debug!(code = code.code_name(), "command failed");

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "exit_code": code.as_i32(),
                "error": {
                    "code": code.code_name(),
                    "message": error.to_string(),
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Human => {
            eprintln!("interest: {}", error);
        }
    }

    code
}
