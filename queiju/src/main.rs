//! Command-line front end for the QE runner.
//!
//! Reads an input deck, runs `pw.x` or `bands.x` against it and reports the
//! captured output, the elapsed time and the files the binary touched.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use queiju::io::config::{DEFAULT_CONFIG_FILE, QueijuConfig, load_config, write_config};
use queiju::report::RunReport;
use queiju::{Error, ErrorKind, ExitPolicy, Runner, exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "queiju",
    version,
    about = "Run Quantum ESPRESSO binaries and track the files they touch"
)]
struct Cli {
    /// Config file; defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log more (`-v` info, `-vv` debug); `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the QE binary location without running anything.
    Check {
        /// Directory holding the QE binaries (empty = PATH).
        #[arg(long)]
        path: Option<String>,
    },
    /// Run a QE binary with an input deck on stdin.
    Run {
        /// QE executable: `pw.x` or `bands.x`.
        command: String,
        /// Input deck (`-` reads stdin).
        #[arg(short, long)]
        input: PathBuf,
        /// Directory holding the QE binaries (empty = PATH).
        #[arg(long)]
        path: Option<String>,
        /// Working directory for the run and the modified-file scan.
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Save captured output here instead of printing it (relative to the working directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write a JSON run report to this file.
        #[arg(long)]
        report: Option<PathBuf>,
        /// Kill the binary after this many seconds (0 = never).
        #[arg(long)]
        timeout: Option<u64>,
        /// Treat a non-zero exit status as a failure.
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Check { path } => cmd_check(&cli.config, path),
        Command::Run {
            command,
            input,
            path,
            workdir,
            output,
            report,
            timeout,
            strict,
        } => cmd_run(
            &cli.config,
            RunArgs {
                command,
                input,
                path,
                workdir,
                output,
                report,
                timeout,
                strict,
            },
        ),
    }
}

struct RunArgs {
    command: String,
    input: PathBuf,
    path: Option<String>,
    workdir: Option<PathBuf>,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    timeout: Option<u64>,
    strict: bool,
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(());
    }
    write_config(config_path, &QueijuConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(())
}

fn cmd_check(config_path: &Path, path: Option<String>) -> Result<()> {
    let cfg = load_config(config_path)?;
    let path = path.unwrap_or(cfg.bin_dir);
    let runner = Runner::builder("").path(path).build()?;
    if runner.binary_search_path().is_empty() {
        println!("QE binaries resolved through PATH");
    } else {
        println!("QE binaries found in {}", runner.binary_search_path());
    }
    Ok(())
}

fn cmd_run(config_path: &Path, args: RunArgs) -> Result<()> {
    let cfg = load_config(config_path)?;
    let mut options = cfg.run_options();
    if let Some(secs) = args.timeout {
        options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }
    if args.strict {
        options.exit_policy = ExitPolicy::Strict;
    }
    debug!(?options, "run options resolved");

    let input_text = read_input(&args.input)?;
    let mut builder = Runner::builder(input_text)
        .path(args.path.unwrap_or(cfg.bin_dir))
        .options(options);
    if let Some(workdir) = args.workdir {
        builder = builder.workdir(workdir);
    }
    let mut runner = builder.build()?;

    // A strict-mode failure still has output worth keeping.
    let outcome = match runner.run(&args.command) {
        Ok(elapsed) => Ok(elapsed),
        Err(err) if err.kind() == ErrorKind::CommandFailed => Err(err),
        Err(err) => return Err(err.into()),
    };

    match &args.output {
        Some(path) => runner.save_output(path)?,
        None => println!("{}", runner.output_text()),
    }
    if let Some(path) = &args.report
        && let Some(report) = RunReport::from_runner(&runner)
    {
        report.write(path)?;
    }
    eprint!("modified files:\n{}", runner.modified_files());
    eprintln!("elapsed: {:.3} s", runner.elapsed_seconds());

    outcome?;
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read input from stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("read input {}", path.display()))
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>().map(Error::kind) {
        Some(ErrorKind::CommandFailed) => exit_codes::CHILD_FAILED,
        Some(ErrorKind::Timeout) => exit_codes::TIMEOUT,
        _ => exit_codes::INVALID,
    }
}
