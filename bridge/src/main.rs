use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ff::Field;
use plonk_bridge::facade::PlonkOps;
use plonk_bridge::plonk_core::circuit::{GateType, Wires};
use plonk_bridge::plonk_core::{Fp, Pallas, PastaCurve, Vesta};
use plonk_bridge::{init_logger, Bridge, BridgeConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "plonk-bridge", version, about = "Drive the Pasta PLONK core from the command line")]
struct Cli {
    /// Execution units to start; overrides PLONK_BRIDGE_THREADS
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Per-unit handshake timeout in milliseconds; overrides PLONK_BRIDGE_HANDSHAKE_MS
    #[arg(long, global = true)]
    handshake_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Curve {
    Pallas,
    Vesta,
}

#[derive(Subcommand)]
enum Command {
    /// Create a URS and write it to a file
    Urs {
        #[arg(long, value_enum, default_value = "vesta")]
        curve: Curve,
        #[arg(long, default_value_t = 64)]
        depth: u32,
        #[arg(long)]
        out: PathBuf,
        /// Append to the file instead of replacing it
        #[arg(long)]
        append: bool,
    },
    /// Prove and verify a one-gate circuit
    Selftest {
        #[arg(long, default_value_t = 1)]
        depth: u32,
        /// Start the execution-unit pool first
        #[arg(long)]
        parallel: bool,
    },
    /// Start the execution-unit pool and report readiness
    Bootstrap,
}

fn write_urs<C: PastaCurve>(plonk: PlonkOps<'_, C>, depth: u32, out: &Path, append: bool) -> Result<()> {
    let urs = plonk.urs_create(depth)?;
    plonk.urs_write(Some(append), &urs, out)?;
    info!(curve = C::NAME, depth, path = %out.display(), "wrote URS");
    Ok(())
}

fn selftest(bridge: &Bridge, depth: u32) -> Result<()> {
    let plonk = bridge.fp_plonk();
    let urs = plonk.urs_create(depth)?;
    let gates = plonk.gate_vector()?;
    plonk.gate_vector_add(&gates, plonk.gate(GateType::Generic, Wires::trivial(0), vec![Fp::ONE])?)?;
    let index = plonk.index_create(&gates, 1, &urs)?;
    let d1 = plonk.index_domain_d1_size(&index)? as u32;

    let vi = plonk.verifier_index_create(index.deep_copy()?)?;
    let proof = plonk.proof_create(index, &[Fp::from(9)], &[], &[], vec![])?;
    let dummy_vi = vi.deep_copy()?;
    let verified = plonk.proof_verify(plonk.urs_lagrange_commitments(&urs, d1, 1)?, vi, proof)?;
    let dummy = plonk.proof_verify(
        plonk.urs_lagrange_commitments(&urs, d1, 1)?,
        dummy_vi,
        plonk.proof_dummy()?,
    )?;
    info!(verified, dummy, d1, "self-test finished");
    if !verified || dummy {
        bail!("self-test failed: proof verified {verified}, dummy verified {dummy}");
    }
    println!("ok");
    Ok(())
}

fn main() -> Result<()> {
    let _logger = init_logger()?;
    let cli = Cli::parse();

    let mut config = BridgeConfig::from_env();
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    if let Some(ms) = cli.handshake_ms {
        config = config.with_handshake_timeout(Duration::from_millis(ms));
    }
    let bridge = Bridge::new(config)?;

    match cli.command {
        Command::Urs {
            curve,
            depth,
            out,
            append,
        } => match curve {
            Curve::Pallas => write_urs::<Pallas>(bridge.fq_plonk(), depth, &out, append),
            Curve::Vesta => write_urs::<Vesta>(bridge.fp_plonk(), depth, &out, append),
        },
        Command::Selftest { depth, parallel } => {
            if parallel {
                bridge.bootstrap()?;
            }
            selftest(&bridge, depth)
        }
        Command::Bootstrap => {
            bridge.bootstrap()?;
            println!("{:?} with {} execution units", bridge.pool_state(), bridge.config().threads);
            Ok(())
        }
    }
}
