//! Signed artifact manifest.
//!
//! `manifest.json` lists the SHA-256 digest of every artifact file and
//! `artifacts.sig` holds an Ed25519 signature over the exact manifest bytes.
//! Verification checks the signature first, then that the manifest binds
//! every required artifact, then every listed digest.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ArtifactLoadError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "artifacts.sig";
pub const MANIFEST_VERSION: u32 = 1;

/// Allowed clock skew for `created_at`, in seconds.
const MAX_CLOCK_SKEW_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was created.
    pub created_at: i64,
    /// Random nonce (base64, 16 bytes).
    pub nonce_b64: String,
    /// Relative file name -> lowercase hex SHA-256.
    pub files: BTreeMap<String, String>,
}

impl ArtifactManifest {
    /// Hash `files` inside `dir` into a new manifest.
    ///
    /// # Errors
    /// Returns `ArtifactLoadError::Missing` or `Unreadable` for any file that
    /// cannot be read.
    pub fn build(dir: &Path, files: &[&str]) -> Result<Self, ArtifactLoadError> {
        let mut digests = BTreeMap::new();
        for rel in files {
            let bytes = read_file(&dir.join(rel))?;
            digests.insert((*rel).to_string(), sha256_hex(&bytes));
        }

        let mut nonce = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        Ok(Self {
            version: MANIFEST_VERSION,
            created_at: unix_now(),
            nonce_b64: base64::engine::general_purpose::STANDARD.encode(nonce),
            files: digests,
        })
    }

    /// The exact bytes that get signed.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

/// Whether `dir` carries a manifest or signature file.
#[must_use]
pub fn is_present(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).exists() || dir.join(SIGNATURE_FILE).exists()
}

/// Verify the signed manifest in `dir` and the digests of the files it binds.
///
/// # Errors
/// Returns `ArtifactLoadError::Signature` on any verification failure.
pub fn verify_dir(
    dir: &Path,
    key: &VerifyingKey,
    required: &[&str],
) -> Result<ArtifactManifest, ArtifactLoadError> {
    let sig_bytes = read_file(&dir.join(SIGNATURE_FILE))?;
    let signature = Signature::from_bytes(
        sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| signature_error("invalid signature length (expected 64 bytes)"))?,
    );

    let manifest_bytes = read_file(&dir.join(MANIFEST_FILE))?;
    key.verify(&manifest_bytes, &signature)
        .map_err(|_| signature_error("manifest signature does not verify"))?;

    let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| signature_error(format!("invalid manifest format: {e}")))?;

    if manifest.version != MANIFEST_VERSION {
        return Err(signature_error(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }
    if manifest.created_at > unix_now() + MAX_CLOCK_SKEW_SECS {
        return Err(signature_error("manifest created_at is in the future"));
    }
    validate_nonce_b64(&manifest.nonce_b64)?;

    if let Some(unbound) = required.iter().find(|r| !manifest.files.contains_key(**r)) {
        return Err(signature_error(format!(
            "manifest does not bind required artifact {unbound}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let bytes = read_file(&dir.join(rel))?;
        if !constant_time_eq_str(&sha256_hex(&bytes), expected_hex) {
            return Err(signature_error(format!("digest mismatch for {rel}")));
        }
    }

    tracing::info!(
        files = manifest.files.len(),
        created_at = manifest.created_at,
        "Artifact manifest signature and digests verified"
    );
    Ok(manifest)
}

/// Decode a base64 Ed25519 verifying key (32 bytes).
///
/// # Errors
/// Returns `ArtifactLoadError::Signature` if the key is malformed.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ArtifactLoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| signature_error("invalid public key base64"))?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| signature_error("invalid public key length (expected 32 bytes)"))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| signature_error("invalid verifying key"))
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn validate_nonce_b64(nonce_b64: &str) -> Result<(), ArtifactLoadError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(nonce_b64.trim())
        .map_err(|e| signature_error(format!("invalid nonce base64: {e}")))?;
    if raw.len() != 16 {
        return Err(signature_error("nonce must decode to exactly 16 bytes"));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::Missing(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| ArtifactLoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}

fn signature_error(msg: impl Into<String>) -> ArtifactLoadError {
    ArtifactLoadError::Signature(msg.into())
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

// Constant-time compare for ASCII hex digests.
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use tempfile::tempdir;

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn sign_dir(dir: &Path, key: &SigningKey, files: &[&str]) -> ArtifactManifest {
        let manifest = ArtifactManifest::build(dir, files).expect("build manifest");
        let bytes = manifest.to_bytes().expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let signature: Signature = key.sign(&bytes);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
        manifest
    }

    #[test]
    fn test_verify_signed_dir() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.json"), b"[1, 2]").expect("write");
        let key = signing_key();
        let signed = sign_dir(temp.path(), &key, &["a.json"]);

        let verified =
            verify_dir(temp.path(), &key.verifying_key(), &["a.json"]).expect("verifies");
        assert_eq!(verified, signed);
    }

    #[test]
    fn test_tampered_file_fails() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.json"), b"[1, 2]").expect("write");
        let key = signing_key();
        sign_dir(temp.path(), &key, &["a.json"]);

        fs::write(temp.path().join("a.json"), b"[1, 3]").expect("tamper");
        let err = verify_dir(temp.path(), &key.verifying_key(), &["a.json"]).expect_err("must fail");
        assert!(err.to_string().contains("digest mismatch"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.json"), b"[1, 2]").expect("write");
        sign_dir(temp.path(), &signing_key(), &["a.json"]);

        let err = verify_dir(temp.path(), &signing_key().verifying_key(), &["a.json"])
            .expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Signature(_)));
    }

    #[test]
    fn test_unbound_required_file_fails() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join("a.json"), b"[]").expect("write");
        fs::write(temp.path().join("b.json"), b"[]").expect("write");
        let key = signing_key();
        sign_dir(temp.path(), &key, &["a.json"]);

        let err = verify_dir(temp.path(), &key.verifying_key(), &["a.json", "b.json"])
            .expect_err("must fail");
        assert!(err.to_string().contains("b.json"));
    }

    #[test]
    fn test_verifying_key_round_trip_through_b64() {
        let key = signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let decoded = verifying_key_from_b64(&b64).expect("valid key");
        assert_eq!(decoded, key.verifying_key());
        assert!(verifying_key_from_b64("AAAA").is_err());
    }
}
