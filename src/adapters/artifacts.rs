//! JSON artifact store: Implementation of `ArtifactStore` over a directory.
//!
//! The training export writes three files into one directory:
//! - `feature_names.json`: the column order the model was fitted on
//! - `standard_scaler.json`: fitted scaler attributes
//! - `logistic_regression_model.json`: fitted classifier attributes
//!
//! A `manifest.json` + `artifacts.sig` pair, when present, is verified
//! before any artifact is parsed.

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use serde::de::DeserializeOwned;

use super::manifest;
use super::{LogisticRegression, StandardScaler};
use crate::domain::FeatureNames;
use crate::ports::{ArtifactStore, Artifacts};

pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const SCALER_FILE: &str = "standard_scaler.json";
pub const CLASSIFIER_FILE: &str = "logistic_regression_model.json";

/// Every file the store requires, in load order.
pub const ARTIFACT_FILES: [&str; 3] = [FEATURE_NAMES_FILE, SCALER_FILE, CLASSIFIER_FILE];

/// Error type for artifact loading. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    #[error("Artifact not found: {0:?}")]
    Missing(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Artifacts are inconsistent: {0}")]
    Inconsistent(String),

    #[error("Artifact signature check failed: {0}")]
    Signature(String),
}

/// Artifact store reading the exported JSON files from one directory.
#[derive(Debug, Clone)]
pub struct JsonArtifactStore {
    dir: PathBuf,
    verifying_key: Option<VerifyingKey>,
    require_signed: bool,
}

impl JsonArtifactStore {
    /// Create a store over `dir`. Signatures are checked opportunistically.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            verifying_key: None,
            require_signed: false,
        }
    }

    /// Key used to verify `artifacts.sig`.
    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    /// Refuse to load artifacts without a valid signed manifest.
    #[must_use]
    pub fn require_signed(mut self, required: bool) -> Self {
        self.require_signed = required;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn verify_signature(&self) -> Result<(), ArtifactLoadError> {
        let signed = manifest::is_present(&self.dir);

        match (&self.verifying_key, signed) {
            (Some(key), true) => {
                manifest::verify_dir(&self.dir, key, &ARTIFACT_FILES)?;
                Ok(())
            }
            (None, true) if self.require_signed => Err(ArtifactLoadError::Signature(
                "signed artifacts required but no verifying key is configured".into(),
            )),
            (None, true) => {
                tracing::warn!(
                    "Artifact manifest present but no verifying key configured; skipping signature check"
                );
                Ok(())
            }
            (_, false) if self.require_signed => Err(ArtifactLoadError::Signature(format!(
                "signed artifacts required but {} is missing from {:?}",
                manifest::MANIFEST_FILE,
                self.dir
            ))),
            (_, false) => {
                tracing::debug!("Loading unsigned artifacts from {:?}", self.dir);
                Ok(())
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArtifactLoadError> {
        let path = self.dir.join(name);
        let content = fs::read(&path).map_err(|source| ArtifactLoadError::Unreadable {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| ArtifactLoadError::Malformed { path, source })
    }
}

impl ArtifactStore for JsonArtifactStore {
    type Scaler = StandardScaler;
    type Classifier = LogisticRegression;
    type Error = ArtifactLoadError;

    fn load(&self) -> Result<Artifacts<StandardScaler, LogisticRegression>, ArtifactLoadError> {
        tracing::info!("Loading artifacts from {:?}", self.dir);

        // All three must exist before anything is parsed.
        if let Some(missing) = ARTIFACT_FILES
            .iter()
            .map(|name| self.dir.join(name))
            .find(|path| !path.is_file())
        {
            return Err(ArtifactLoadError::Missing(missing));
        }

        self.verify_signature()?;

        let names: Vec<String> = self.read_json(FEATURE_NAMES_FILE)?;
        let feature_names =
            FeatureNames::new(names).map_err(|reason| ArtifactLoadError::Invalid {
                name: FEATURE_NAMES_FILE,
                reason,
            })?;

        let scaler: StandardScaler = self.read_json(SCALER_FILE)?;
        scaler.validate().map_err(|reason| ArtifactLoadError::Invalid {
            name: SCALER_FILE,
            reason,
        })?;
        if let Some(fitted_on) = scaler.feature_names_in() {
            if fitted_on != feature_names.as_slice() {
                return Err(ArtifactLoadError::Inconsistent(
                    "scaler feature_names_in_ differs from feature_names".into(),
                ));
            }
        }

        let classifier: LogisticRegression = self.read_json(CLASSIFIER_FILE)?;
        classifier
            .validate()
            .map_err(|reason| ArtifactLoadError::Invalid {
                name: CLASSIFIER_FILE,
                reason,
            })?;

        let artifacts = Artifacts::new(feature_names, scaler, classifier)
            .map_err(ArtifactLoadError::Inconsistent)?;

        tracing::info!(
            n_features = artifacts.feature_names().len(),
            "Loaded feature order, scaler and classifier"
        );
        Ok(artifacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::manifest::{ArtifactManifest, MANIFEST_FILE, SIGNATURE_FILE};
    use ed25519_dalek::{Signature, Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn copy_fixtures(dir: &Path) {
        for name in ARTIFACT_FILES {
            fs::copy(Path::new("artifacts").join(name), dir.join(name)).expect("copy fixture");
        }
    }

    fn signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn sign(dir: &Path, key: &SigningKey) {
        let manifest = ArtifactManifest::build(dir, &ARTIFACT_FILES).expect("build manifest");
        let bytes = manifest.to_bytes().expect("serialize");
        fs::write(dir.join(MANIFEST_FILE), &bytes).expect("write manifest");
        let signature: Signature = key.sign(&bytes);
        fs::write(dir.join(SIGNATURE_FILE), signature.to_bytes()).expect("write signature");
    }

    #[test]
    fn test_load_checked_in_artifacts() {
        let artifacts = JsonArtifactStore::new("artifacts")
            .load()
            .expect("fixtures should load");

        assert_eq!(artifacts.feature_names().len(), 10);
        assert_eq!(artifacts.feature_names().as_slice()[0], "age");
    }

    #[test]
    fn test_each_missing_artifact_fails_load() {
        for name in ARTIFACT_FILES {
            let temp = tempdir().expect("tempdir");
            copy_fixtures(temp.path());
            fs::remove_file(temp.path().join(name)).expect("remove");

            let err = JsonArtifactStore::new(temp.path())
                .load()
                .expect_err("must fail");
            match err {
                ArtifactLoadError::Missing(path) => assert!(path.ends_with(name)),
                other => panic!("expected Missing for {name}, got {other}"),
            }
        }
    }

    #[test]
    fn test_malformed_artifact_fails_load() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        fs::write(temp.path().join(SCALER_FILE), b"{not json").expect("write");

        let err = JsonArtifactStore::new(temp.path())
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Malformed { .. }));
    }

    #[test]
    fn test_arity_mismatch_fails_load() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        fs::write(
            temp.path().join(CLASSIFIER_FILE),
            br#"{"classes_": [0, 1], "coef_": [[0.1, 0.2]], "intercept_": [0.0]}"#,
        )
        .expect("write");

        let err = JsonArtifactStore::new(temp.path())
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Inconsistent(_)));
    }

    #[test]
    fn test_scaler_fitted_on_other_order_fails_load() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        let names: Vec<String> = serde_json::from_slice(
            &fs::read(temp.path().join(FEATURE_NAMES_FILE)).expect("read"),
        )
        .expect("parse");
        let mut reordered = names;
        reordered.swap(0, 1);
        fs::write(
            temp.path().join(FEATURE_NAMES_FILE),
            serde_json::to_vec(&reordered).expect("serialize"),
        )
        .expect("write");

        let err = JsonArtifactStore::new(temp.path())
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Inconsistent(_)));
    }

    #[test]
    fn test_signed_artifacts_load_and_tampering_fails() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());
        let key = signing_key();
        sign(temp.path(), &key);

        let store = JsonArtifactStore::new(temp.path())
            .with_verifying_key(key.verifying_key())
            .require_signed(true);
        store.load().expect("signed artifacts should load");

        let mut model = fs::read(temp.path().join(CLASSIFIER_FILE)).expect("read");
        model.push(b'\n');
        fs::write(temp.path().join(CLASSIFIER_FILE), model).expect("tamper");

        let err = store.load().expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Signature(_)));
    }

    #[test]
    fn test_require_signed_rejects_unsigned_dir() {
        let temp = tempdir().expect("tempdir");
        copy_fixtures(temp.path());

        let err = JsonArtifactStore::new(temp.path())
            .with_verifying_key(signing_key().verifying_key())
            .require_signed(true)
            .load()
            .expect_err("must fail");
        assert!(matches!(err, ArtifactLoadError::Signature(_)));
    }
}
