//! Ed25519 keypair generation for artifact signing.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_keypair -- --out-seed <path> [--out-pub <path>] [--force]
//! ```
//!
//! The base64 seed is written with 0600 permissions (Unix) and is the input
//! for `sign_artifacts`. The base64 public key is the file that
//! `COPD_RISK_ARTIFACT_PUBKEY_B64_FILE` points the service at.

use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

const USAGE: &str = "Usage: generate_keypair --out-seed <path> [--out-pub <path>] [--force]";

struct Args {
    out_seed: PathBuf,
    out_pub: Option<PathBuf>,
    force: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut out_seed = None;
    let mut out_pub = None;
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-seed" => out_seed = args.next().map(PathBuf::from),
            "--out-pub" => out_pub = Some(args.next().map(PathBuf::from).context(USAGE)?),
            "--force" => force = true,
            _ => bail!("Unknown arg: {arg}\n{USAGE}"),
        }
    }

    Ok(Args {
        out_seed: out_seed.context(USAGE)?,
        out_pub,
        force,
    })
}

fn write_new(path: &Path, contents: &[u8], mode: u32, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Refusing to overwrite existing file {path:?}. Use --force.");
    }
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    opts.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = opts.open(path).with_context(|| format!("opening {path:?}"))?;
    file.write_all(contents)?;
    file.write_all(b"\n")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let verifying_key = SigningKey::from_bytes(&seed).verifying_key();

    let seed_b64 = Zeroizing::new(general_purpose::STANDARD.encode(seed));
    seed.zeroize();
    let pub_b64 = general_purpose::STANDARD.encode(verifying_key.as_bytes());

    write_new(&args.out_seed, seed_b64.as_bytes(), 0o600, args.force)?;
    println!("Wrote signing seed (base64) to {:?}", args.out_seed);

    if let Some(pub_path) = &args.out_pub {
        write_new(pub_path, pub_b64.as_bytes(), 0o644, args.force)?;
        println!("Wrote public key (base64) to {pub_path:?}");
    }

    // Only non-secret material goes to stdout.
    println!("Verifying key (base64)={pub_b64}");
    Ok(())
}
