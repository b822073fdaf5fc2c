#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zkwasm_core::ProofArchive;
use zkwasm_exec::{ExecConfig, ProgramArgs};
use zkwasm_field::Scalar;
use zkwasm_interp::{HostTable, Module};

#[derive(Parser, Debug)]
#[command(
    name = "zkwasm-cli",
    about = "zkWASM reference CLI",
    long_about = "Ligero-backed zkWASM reference CLI.\n\nRuns a WASM guest through the three-stage prover pipeline and produces or checks a proof archive.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run the guest under a single concrete-only pass (no transcript), for
    /// sanity-checking a config before spending the full three-stage replay.
    Run {
        /// JSON run configuration (spec §6's loader keys).
        #[arg(long)]
        config: PathBuf,
    },

    /// Run all three prover stages and write a proof archive.
    Prove {
        /// JSON run configuration (spec §6's loader keys).
        #[arg(long)]
        config: PathBuf,

        /// Output path for the binary proof archive.
        #[arg(long, default_value = "proof.bin")]
        out: PathBuf,
    },

    /// Verify a previously produced proof archive against a config.
    Verify {
        /// JSON run configuration (spec §6's loader keys); only `packing` and
        /// `sample-size` are consulted — computing the expected linear
        /// constant sum from public inputs is this program's job, not this
        /// crate's (same scope cut as loading the program itself, spec §1),
        /// so the caller supplies it directly.
        #[arg(long)]
        config: PathBuf,

        /// Proof archive to check.
        #[arg(long)]
        proof: PathBuf,

        /// The public linear constant sum the prover's `constant_sum` must
        /// reduce to, as a decimal integer.
        #[arg(long, default_value_t = 0)]
        expected_constant_sum: i64,
    },
}

/// One entry of the `args` array (spec §6: `{i64}|{str}|{hex}`).
///
/// Only `i64` is implemented as a genuine interpreter argument: a `str`/`hex`
/// entry would need to be marshaled into guest linear memory (a pointer plus
/// length pushed as the actual argument, with the bytes written into some
/// caller-chosen memory region before the entry call), and nothing in this
/// crate or its sibling crates exposes a memory-preload hook on `Machine` to
/// do that safely. Rather than improvise an ad hoc placement policy, this CLI
/// rejects them outright — a deliberate scope cut, not an oversight.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ArgEntry {
    I64(i64),
    Str(String),
    Hex(String),
}

/// The JSON configuration object spec §6 describes, plus the ambient sizing
/// parameters (`packing`/`sample-size`/`seed`) the three-stage pipeline needs
/// to construct an [`ExecConfig`] — the distilled spec names `packing` as a
/// config key but leaves `sample_size` and the master seed unspecified; both
/// are carried here as CLI-level ambient parameters, not part of the
/// witnessed computation itself.
#[derive(Debug, Deserialize, Serialize)]
struct RunConfig {
    /// Path to an already-decoded [`Module`], stored as JSON (the
    /// WAT/WASM-to-`Module` translator is a named out-of-scope collaborator,
    /// spec §1).
    program: PathBuf,
    /// Index of the function to call as the proof's entry point.
    #[serde(default)]
    entry: u32,
    /// Message slots per row (`l` in the glossary).
    packing: usize,
    /// Padding-randomness slots appended per row.
    #[serde(rename = "sample-size")]
    sample_size: usize,
    /// Master RNG seed, hex-encoded (32 bytes). Defaults to all-zero, which
    /// matches spec §8's end-to-end scenarios ("seed 0x00... for all PRNGs").
    #[serde(default)]
    seed: Option<String>,
    /// GPU shader search path, passed through unused: the compute executor
    /// this names is an opaque out-of-scope collaborator (spec §1).
    #[serde(rename = "shader-path", default)]
    #[allow(dead_code)]
    shader_path: Option<String>,
    /// GPU thread count, passed through unused for the same reason.
    #[serde(rename = "gpu-threads", default)]
    #[allow(dead_code)]
    gpu_threads: Option<u32>,
    /// The entry function's argument list.
    #[serde(default)]
    args: Vec<ArgEntry>,
    /// Positions in `args` that are private (secret) inputs.
    #[serde(rename = "private-indices", default)]
    private_indices: Vec<usize>,
    /// Index into the module's function space at which the `bn254fr` host
    /// ABI is registered (spec §6's guest ABI). `None` skips registration for
    /// guests that make no host calls.
    #[serde(rename = "bn254fr-base", default)]
    bn254fr_base: Option<u32>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Run { config } => run(&config),
        Cmd::Prove { config, out } => prove(&config, &out),
        Cmd::Verify { config, proof, expected_constant_sum } => verify(&config, &proof, expected_constant_sum),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<RunConfig> {
    let f = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing config {}", path.display()))
}

fn load_module(path: &Path) -> Result<Module> {
    let f = File::open(path).with_context(|| format!("opening program {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parsing program module {}", path.display()))
}

fn seed_bytes(seed: Option<&str>) -> Result<[u8; 32]> {
    let Some(hex) = seed else {
        return Ok([0u8; 32]);
    };
    let hex = hex.trim();
    if hex.len() != 64 {
        bail!("seed must be 64 hex characters (32 bytes), got {}", hex.len());
    }
    let mut out = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).context("seed is not valid ASCII hex")?;
        out[i] = u8::from_str_radix(byte_str, 16).context("seed contains a non-hex digit")?;
    }
    Ok(out)
}

fn build_args(config: &RunConfig) -> Result<ProgramArgs> {
    let mut values = Vec::with_capacity(config.args.len());
    for (i, entry) in config.args.iter().enumerate() {
        match entry {
            ArgEntry::I64(v) => values.push(zkwasm_core::Value::I64(*v)),
            ArgEntry::Str(_) | ArgEntry::Hex(_) => {
                bail!(
                    "arg {i}: string/hex guest-memory arguments aren't supported by this CLI \
                     (no memory-preload path exists on Machine to marshal them) — pass {{i64}} instead"
                );
            }
        }
    }
    Ok(ProgramArgs { values, private_indices: config.private_indices.clone() })
}

fn build_host(config: &RunConfig) -> HostTable {
    let host = HostTable::new();
    match config.bn254fr_base {
        Some(base) => host.with_bn254fr_abi(base.into()),
        None => host,
    }
}

fn build_exec_config(config: &RunConfig) -> Result<ExecConfig> {
    Ok(ExecConfig {
        row_size: config.packing,
        sample_size: config.sample_size,
        master_seed: seed_bytes(config.seed.as_deref())?,
    })
}

fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let module = load_module(&config.program)?;
    let args = build_args(&config)?;
    let host = build_host(&config);
    let exec_config = build_exec_config(&config)?;

    info!(program=%config.program.display(), entry = config.entry, "running guest (stage-1 replay only)");
    let result = zkwasm_exec::stage1::run(&module, config.entry, &args, host, &exec_config)
        .map_err(|trap| anyhow::anyhow!("trap: {trap}"))?;

    println!("ok: {} return value(s), merkle root {}", result.outputs.len(), hex_of(result.merkle_root));
    Ok(())
}

fn prove(config_path: &Path, out: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let module = load_module(&config.program)?;
    let args = build_args(&config)?;
    let host = build_host(&config);
    let exec_config = build_exec_config(&config)?;

    info!(program=%config.program.display(), entry = config.entry, out=%out.display(), "proving");
    let archive = zkwasm_exec::prove(&module, config.entry, &args, &host, &exec_config)
        .with_context(|| "proof attempt failed")?;

    ensure_parent_dir(out)?;
    let f = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut w = BufWriter::new(f);
    w.write_all(&archive.to_bytes())?;
    w.flush()?;

    println!(
        "proved: merkle root {}, {} sampled column(s) → {}",
        hex_of(archive.merkle_root),
        archive.sampled_columns.len(),
        out.display()
    );
    Ok(())
}

fn verify(config_path: &Path, proof_path: &Path, expected_constant_sum: i64) -> Result<()> {
    let config = load_config(config_path)?;
    let exec_config = build_exec_config(&config)?;

    let bytes = std::fs::read(proof_path).with_context(|| format!("reading {}", proof_path.display()))?;
    let archive = ProofArchive::from_bytes(&bytes).context("decoding proof archive")?;

    info!(proof=%proof_path.display(), "verifying");
    zkwasm_exec::verify(&archive, &exec_config, Scalar::from_i64(expected_constant_sum))
        .context("proof verification failed")?;

    println!("OK: proof verified");
    Ok(())
}

fn hex_of(digest: [u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
