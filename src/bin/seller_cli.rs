use anyhow::{anyhow, bail, Context, Result};
use rustyline::{error::ReadlineError, DefaultEditor};
use seller_console::{about, logging};
use seller_engine::{
    SellerConsole, WriteSimulator,
    config::SellerConfig,
    lead_query::LeadBrowser,
    lead_source::lead_source_for,
    remote_write::{FixedOutcome, OutcomeSource, RandomOutcome},
    shell::{parse_shell_line, shell_help_text, ShellSession},
};
use serde::Serialize;
use std::{env, fs, sync::Arc};
use tokio::runtime::Runtime;

const DEFAULT_CONFIG_PATH: &str = "seller.json";

fn usage() {
    eprintln!(
        "Usage:\n  \
  seller_cli --version\n  \
  seller_cli [--config PATH] [--leads PATH|URL] [--outcome success|failure|random] [--delay-ms N] [SCRIPT]\n\n  \
  Without SCRIPT an interactive shell starts. Type 'help' for commands, 'exit' to quit."
    );
}

#[derive(Debug, Default)]
struct CliArgs {
    config_path: Option<String>,
    leads: Option<String>,
    outcome: Option<String>,
    delay_ms: Option<u64>,
    script: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        let mut value = || {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| anyhow!("Missing value for {arg}"))
        };
        match arg.as_str() {
            "--config" => cli.config_path = Some(value()?),
            "--leads" => cli.leads = Some(value()?),
            "--outcome" => cli.outcome = Some(value()?),
            "--delay-ms" => {
                let raw = value()?;
                cli.delay_ms = Some(
                    raw.parse()
                        .map_err(|e| anyhow!("Invalid --delay-ms '{raw}': {e}"))?,
                );
            }
            other if other.starts_with('-') => bail!("Unknown option '{other}'"),
            other => {
                if cli.script.is_some() {
                    bail!("Only one script file may be given");
                }
                cli.script = Some(other.to_string());
            }
        }
        idx += 1;
    }
    Ok(cli)
}

fn outcome_source(name: &str, config: &SellerConfig) -> Result<Arc<dyn OutcomeSource>> {
    Ok(match name {
        "success" => Arc::new(FixedOutcome::success()),
        "failure" => Arc::new(FixedOutcome::failure()),
        "random" => Arc::new(RandomOutcome::new(config.write.success_probability)),
        other => bail!("Unknown outcome '{other}', expected success, failure or random"),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

/// Runs one shell line. Errors are reported and the shell keeps going.
fn run_line(runtime: &Runtime, shell: &mut ShellSession, line: &str) -> Result<()> {
    let command = match parse_shell_line(line) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(());
        }
    };
    tracing::debug!(command = %command.preview(), "running shell command");
    match runtime.block_on(shell.execute(&command)) {
        Ok(result) => print_json(&result.output),
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(())
        }
    }
}

fn is_skippable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

fn run_script(runtime: &Runtime, shell: &mut ShellSession, path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Could not read script '{path}'"))?;
    for line in text.lines().filter(|line| !is_skippable(line)) {
        println!("seller> {}", line.trim());
        run_line(runtime, shell, line)?;
    }
    Ok(())
}

fn run_repl(runtime: &Runtime, shell: &mut ShellSession) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", shell_help_text());

    loop {
        match rl.readline("seller> ") {
            Ok(line) => {
                if line.trim() == "exit" || line.trim() == "quit" {
                    break;
                }
                if is_skippable(&line) {
                    continue;
                }
                rl.add_history_entry(line.as_str())?;
                run_line(runtime, shell, &line)?;
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
            }
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init_tracing("warn");

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    if args.iter().any(|a| a == "--help" || a == "-h") {
        usage();
        return Ok(());
    }
    let cli = parse_args(&args).inspect_err(|_| usage())?;

    let config_path = cli.config_path.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut config = SellerConfig::load_or_default(config_path)?;
    if let Some(leads) = &cli.leads {
        config.leads_source = leads.clone();
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.write.delay_ms = delay_ms;
    }

    let runtime = Runtime::new()?;
    let mut writer = WriteSimulator::from_config(&config.write, runtime.handle().clone());
    if let Some(outcome) = &cli.outcome {
        writer = writer.with_outcomes(outcome_source(outcome, &config)?);
    }
    tracing::debug!(delay_ms = config.write.delay_ms, "write simulator ready");

    let console = SellerConsole::new(writer);
    let source = lead_source_for(&config.leads_source);
    if let Err(e) = console.load_leads(source.as_ref()) {
        eprintln!("Warning: {e}");
    }

    let mut shell = ShellSession::new(console, LeadBrowser::new(config.page_size));
    match &cli.script {
        Some(path) => run_script(&runtime, &mut shell, path)?,
        None => run_repl(&runtime, &mut shell)?,
    }

    if shell.pending_count() > 0 {
        let settled = runtime.block_on(shell.wait_all());
        print_json(&settled)?;
    }
    Ok(())
}
