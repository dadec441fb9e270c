//! Command-line front end for the interop gateway.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hub::{read_config, InteropConfig, InteropManager};
use message_abi::{InteractionMode, Message, Payload};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use transport_codecs::{BinaryMessageCodec, JsonMessageCodec};

mod render;

/// Drive external training applications through interop interfaces.
#[derive(Parser, Debug)]
#[command(author, version, about = "Training application interop gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the interfaces a configuration declares, without connecting anything.
    Plugins {
        /// Interop configuration (TOML).
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
    },
    /// Convert a message log between JSON lines and binary frames.
    Convert {
        #[arg(long, value_enum)]
        from: Format,
        #[arg(long, value_enum)]
        to: Format,
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
    /// Print every frame of a binary log as JSON.
    Inspect {
        #[arg(value_name = "LOG")]
        log: PathBuf,
    },
    /// Connect interfaces and dispatch JSON messages read from stdin, one per line.
    Run {
        /// Interop configuration (TOML).
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        /// Ref ids of the interfaces to connect, in order.
        #[arg(long = "interop", value_name = "ID", required = true, num_args = 1..)]
        interops: Vec<u32>,
        #[arg(long, value_enum, default_value_t = ModeArg::Learner)]
        mode: ModeArg,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One JSON message per line.
    Json,
    /// Length-prefixed frames.
    Binary,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Learner,
    Author,
}

impl From<ModeArg> for InteractionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Learner => InteractionMode::Learner,
            ModeArg::Author => InteractionMode::Author,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Plugins { config } => handle_plugins(&config),
        Command::Convert {
            from,
            to,
            input,
            output,
        } => handle_convert(from, to, &input, &output),
        Command::Inspect { log } => handle_inspect(&log),
        Command::Run {
            config,
            interops,
            mode,
        } => handle_run(&config, &interops, mode.into()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn build_manager(config: &Path) -> Result<(InteropManager, Vec<InteropConfig>)> {
    let configs = read_config(config)?;
    let manager = InteropManager::builder()
        .with_default_plugins()
        .configs(configs.clone())
        .build()
        .with_context(|| format!("failed to load {}", config.display()))?;
    Ok((manager, configs))
}

fn handle_plugins(config: &Path) -> Result<()> {
    let (manager, declared) = build_manager(config)?;
    for config in &declared {
        match manager.interface(config.ref_id) {
            Some(interface) => print!("{}", render::plugin(config, interface.registration())),
            None => print!("{}", render::skipped(config)),
        }
    }
    Ok(())
}

fn handle_convert(from: Format, to: Format, input: &Path, output: &Path) -> Result<()> {
    let messages = read_messages(from, input)?;
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);
    match to {
        Format::Binary => {
            BinaryMessageCodec.write_log(&mut out, &messages)?;
        }
        Format::Json => {
            for message in &messages {
                writeln!(out, "{}", JsonMessageCodec.encode_string(message)?)?;
            }
            out.flush()?;
        }
    }
    info!(count = messages.len(), output = %output.display(), "log converted");
    Ok(())
}

fn read_messages(format: Format, path: &Path) -> Result<Vec<Message>> {
    match format {
        Format::Binary => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            BinaryMessageCodec
                .read_log(BufReader::new(file))
                .enumerate()
                .map(|(idx, message)| message.with_context(|| format!("frame {idx}")))
                .collect()
        }
        Format::Json => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            text.lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(idx, line)| {
                    JsonMessageCodec
                        .decode_str(line)
                        .with_context(|| format!("line {}", idx + 1))
                })
                .collect()
        }
    }
}

fn handle_inspect(log: &Path) -> Result<()> {
    let file = File::open(log).with_context(|| format!("failed to open {}", log.display()))?;
    for (idx, message) in BinaryMessageCodec.read_log(BufReader::new(file)).enumerate() {
        let message = message.with_context(|| format!("frame {idx}"))?;
        let discrepancy = match message.payload() {
            Payload::TimerBatch(batch) => batch.size_discrepancy(),
            _ => None,
        };
        let json = JsonMessageCodec.encode_string(&message)?;
        print!(
            "{}",
            render::frame(idx, message.message_type(), &json, discrepancy)
        );
    }
    Ok(())
}

fn handle_run(config: &Path, interops: &[u32], mode: InteractionMode) -> Result<()> {
    let (mut manager, _) = build_manager(config)?;
    manager.connect_interops(interops, mode)?;

    let stdin = io::stdin();
    for (idx, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match JsonMessageCodec.decode_str(&line) {
            Ok(message) => print!("{}", render::report(&manager.dispatch(&message))),
            Err(err) => warn!(line = idx + 1, error = %err, "skipping undecodable message"),
        }
        print_produced(&manager)?;
    }

    let result = manager.disconnect_current_interops();
    print_produced(&manager)?;
    result?;
    Ok(())
}

fn print_produced(manager: &InteropManager) -> Result<()> {
    for message in manager.produced().try_iter() {
        print!(
            "{}",
            render::produced(&JsonMessageCodec.encode_string(&message)?)
        );
    }
    Ok(())
}
