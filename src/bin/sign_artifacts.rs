//! Artifact signing utility.
//!
//! Writes `manifest.json` (SHA-256 of each exported artifact) and
//! `artifacts.sig` (Ed25519 signature over the manifest bytes) into the
//! artifact directory, so `copd-risk` can verify the set at startup.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sign_artifacts -- <artifact_dir>
//! ```
//!
//! The signing seed (base64, 32 bytes) is read from the file named by
//! `COPD_RISK_SIGNING_KEY_B64_FILE`. Debug builds also accept the seed
//! directly in `COPD_RISK_SIGNING_KEY_B64`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, Zeroizing};

use copd_risk::adapters::artifacts::ARTIFACT_FILES;
use copd_risk::adapters::manifest::{ArtifactManifest, MANIFEST_FILE, SIGNATURE_FILE};

const KEY_FILE_ENV: &str = "COPD_RISK_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "COPD_RISK_SIGNING_KEY_B64";

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    let secret = if let Ok(path) = env::var(KEY_FILE_ENV) {
        Zeroizing::new(
            fs::read_to_string(path.trim()).context("reading signing key file")?,
        )
    } else if cfg!(debug_assertions) {
        Zeroizing::new(env::var(KEY_ENV).map_err(|_| {
            anyhow!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds).")
        })?)
    } else {
        bail!("Missing signing key. Set {KEY_FILE_ENV}.");
    };

    let trimmed = Zeroizing::new(secret.trim().to_string());
    if trimmed.is_empty() {
        bail!("Empty signing key");
    }
    Ok(trimmed)
}

fn read_signing_key() -> Result<SigningKey> {
    let b64 = read_signing_seed_b64()?;
    let mut raw = general_purpose::STANDARD
        .decode(b64.as_bytes())
        .context("signing key is not valid base64")?;

    let result = <[u8; 32]>::try_from(raw.as_slice())
        .map(|mut seed| {
            let key = SigningKey::from_bytes(&seed);
            seed.zeroize();
            key
        })
        .map_err(|_| anyhow!("Signing key seed must be 32 bytes (got {})", raw.len()));
    raw.zeroize();
    result
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let dir = match (args.next(), args.next()) {
        (Some(arg), None) if arg != "-h" && arg != "--help" => PathBuf::from(arg),
        _ => bail!("Usage: sign_artifacts <artifact_dir>"),
    };
    if !dir.is_dir() {
        bail!("{dir:?} is not a directory");
    }

    let signing_key = read_signing_key()?;

    let manifest = ArtifactManifest::build(&dir, &ARTIFACT_FILES)?;
    let manifest_bytes = manifest.to_bytes().context("serializing manifest")?;

    let manifest_path = dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("writing {manifest_path:?}"))?;

    let signature: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, signature.to_bytes()).with_context(|| format!("writing {sig_path:?}"))?;

    println!("Signed {} artifacts in {dir:?}", manifest.files.len());
    println!("Wrote manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "Verifying key (base64)={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );
    Ok(())
}
