//! Actor Virtual Engine - CLI
//!
//! Command-line interface to assemble, encode, and execute AVE
//! programs. Text sources are assembled on the fly; files carrying the
//! binary magic are loaded directly.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ave_core::vm::{Reg, REGISTER_COUNT};
use ave_core::{assemble, Program, ProgramLoader, Scheduler, VmConfig};
use ave_host::LoopbackTransport;

#[derive(Parser, Debug)]
#[command(name = "ave")]
#[command(about = "Run an AVE actor program (assembly text or binary)")]
struct Cli {
    /// Path to an assembly source or encoded program
    program: PathBuf,

    /// Label to spawn the initial actor at
    #[arg(long, default_value = "main")]
    entry: String,

    /// Instructions per scheduling slice
    #[arg(long)]
    budget: Option<usize>,

    /// Fault actors that wait on RECV longer than this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Encode the program to this path instead of running it
    #[arg(long)]
    emit: Option<PathBuf>,

    /// Print each actor's registers after the run
    #[arg(long)]
    dump_registers: bool,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ave=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let bytes = match fs::read(&cli.program) {
        Ok(b) => b,
        Err(e) => {
            error!("failed to read {}: {}", cli.program.display(), e);
            process::exit(1);
        }
    };

    let program = match load_program(&bytes) {
        Ok(p) => p,
        Err(message) => {
            error!("{message}");
            process::exit(1);
        }
    };

    if let Some(out) = cli.emit {
        let encoded = ProgramLoader::encode(&program);
        if let Err(e) = fs::write(&out, encoded) {
            error!("failed to write {}: {}", out.display(), e);
            process::exit(1);
        }
        info!("encoded {} instructions to {}", program.len(), out.display());
        return;
    }

    let mut config = VmConfig::new();
    if let Some(budget) = cli.budget {
        config.reduction_budget = budget;
    }
    if let Some(ms) = cli.timeout_ms {
        config.receive_timeout = Some(Duration::from_millis(ms));
    }

    let mut scheduler = Scheduler::new(program, config);
    LoopbackTransport::install(&mut scheduler);

    let root = match scheduler.spawn_at_label(&cli.entry) {
        Ok(addr) => addr,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    info!(actor = %root, entry = cli.entry, "starting run");

    scheduler.run();

    if cli.dump_registers {
        dump_registers(&scheduler, root);
    }

    let faults = scheduler.faults();
    for (addr, fault) in &faults {
        error!(actor = %addr, %fault, "actor faulted");
    }
    if !faults.is_empty() {
        process::exit(1);
    }
}

/// Binary programs announce themselves with the loader magic; anything
/// else is treated as assembly text.
fn load_program(bytes: &[u8]) -> Result<Program, String> {
    if bytes.starts_with(&ProgramLoader::MAGIC.to_be_bytes()) {
        ProgramLoader::load(bytes).map_err(|e| format!("invalid program: {e}"))
    } else {
        let source =
            std::str::from_utf8(bytes).map_err(|_| "program is neither binary nor UTF-8 text")?;
        assemble(source).map_err(|e| format!("assembly failed: {e}"))
    }
}

fn dump_registers(scheduler: &Scheduler, root: ave_core::ActorAddr) {
    let mut addr = root;
    loop {
        let Some(actor) = scheduler.actor(addr) else {
            break;
        };
        println!("{} [{:?}]", addr, actor.state());
        for index in 0..REGISTER_COUNT as u8 {
            if let Some(reg) = Reg::from_index(index) {
                println!("  {:>3} = {:?}", reg.to_string(), actor.register(reg));
            }
        }
        addr = ave_core::ActorAddr(addr.0 + 1);
    }
}
