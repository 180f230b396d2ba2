//! Persistence for the vectorizer/model pair.
//!
//! Each artifact is a 4-byte magic followed by a bincode payload. The
//! vectorizer records which normalizer produced its vocabulary; the model
//! records which vectorizer produced its feature space. Both links are
//! checked on load, so a pair from different training runs never reaches
//! the service.

use crate::classifier::LogisticRegression;
use crate::error::{Result, SentimentError};
use crate::normalizer::Normalizer;
use crate::vectorizer::TfidfVectorizer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the persisted vectorizer.
pub const VECTORIZER_FILE: &str = "vectorizer.bin";
/// File name of the persisted classifier.
pub const MODEL_FILE: &str = "sentiment_model.bin";

const VECTORIZER_MAGIC: &[u8; 4] = b"SVEC";
const MODEL_MAGIC: &[u8; 4] = b"SMDL";
const TMP_SUFFIX: &str = ".tmp";
const BACKUP_SUFFIX: &str = ".bak";

#[derive(Serialize, Deserialize)]
struct VectorizerArtifact {
    normalizer_fingerprint: u32,
    vocabulary_fingerprint: u32,
    vectorizer: TfidfVectorizer,
}

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    vectorizer_fingerprint: u32,
    n_features: usize,
    model: LogisticRegression,
}

/// Locations of the two artifacts inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Vectorizer artifact path.
    pub vectorizer: PathBuf,
    /// Model artifact path.
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vectorizer: dir.join(VECTORIZER_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

/// Writes both artifacts into `dir`.
///
/// Payloads are encoded and written to temporary files first; the final
/// names only appear once both writes succeeded. A failed swap restores
/// whatever pair was there before.
pub fn save_pair(
    dir: impl AsRef<Path>,
    normalizer: &Normalizer,
    vectorizer: &TfidfVectorizer,
    model: &LogisticRegression,
) -> Result<ArtifactPaths> {
    if model.n_features() != vectorizer.dim() {
        return Err(SentimentError::ArtifactMismatch(format!(
            "model expects {} features but the vectorizer produces {}",
            model.n_features(),
            vectorizer.dim()
        )));
    }
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let paths = ArtifactPaths::in_dir(dir);

    let vocabulary_fingerprint = vectorizer.fingerprint();
    let vectorizer_bytes = encode(
        VECTORIZER_MAGIC,
        &VectorizerArtifact {
            normalizer_fingerprint: normalizer.fingerprint(),
            vocabulary_fingerprint,
            vectorizer: vectorizer.clone(),
        },
    )?;
    let model_bytes = encode(
        MODEL_MAGIC,
        &ModelArtifact {
            vectorizer_fingerprint: vocabulary_fingerprint,
            n_features: model.n_features(),
            model: model.clone(),
        },
    )?;

    let staged = [
        (sibling(&paths.vectorizer, TMP_SUFFIX), paths.vectorizer.clone()),
        (sibling(&paths.model, TMP_SUFFIX), paths.model.clone()),
    ];
    let written = fs::write(&staged[0].0, &vectorizer_bytes)
        .and_then(|_| fs::write(&staged[1].0, &model_bytes));
    if let Err(err) = written {
        for (tmp, _) in &staged {
            let _ = fs::remove_file(tmp);
        }
        return Err(err.into());
    }
    install(&staged)?;

    info!(
        vectorizer = %paths.vectorizer.display(),
        model = %paths.model.display(),
        features = vectorizer.dim(),
        fingerprint = format_args!("{vocabulary_fingerprint:08x}"),
        "saved artifacts"
    );
    Ok(paths)
}

/// Loads and cross-checks the artifact pair in `dir`.
pub fn load_pair(
    dir: impl AsRef<Path>,
    normalizer: &Normalizer,
) -> Result<(TfidfVectorizer, LogisticRegression)> {
    let paths = ArtifactPaths::in_dir(dir);
    let vectorizer: VectorizerArtifact = decode(VECTORIZER_MAGIC, &paths.vectorizer)?;
    let model: ModelArtifact = decode(MODEL_MAGIC, &paths.model)?;

    if vectorizer.normalizer_fingerprint != normalizer.fingerprint() {
        return Err(SentimentError::ArtifactMismatch(format!(
            "vectorizer was trained with normalizer {:08x}, running {:08x}",
            vectorizer.normalizer_fingerprint,
            normalizer.fingerprint()
        )));
    }
    let actual = vectorizer.vectorizer.fingerprint();
    if actual != vectorizer.vocabulary_fingerprint {
        return Err(SentimentError::InvalidArtifact {
            path: paths.vectorizer,
            reason: "vocabulary checksum does not match its contents".to_string(),
        });
    }
    if model.n_features != vectorizer.vectorizer.dim() || model.model.n_features() != model.n_features
    {
        return Err(SentimentError::ArtifactMismatch(format!(
            "model expects {} features but the vectorizer produces {}",
            model.model.n_features(),
            vectorizer.vectorizer.dim()
        )));
    }
    if model.vectorizer_fingerprint != actual {
        return Err(SentimentError::ArtifactMismatch(format!(
            "model was trained against vectorizer {:08x}, found {:08x}",
            model.vectorizer_fingerprint, actual
        )));
    }

    debug!(
        features = model.n_features,
        fingerprint = format_args!("{actual:08x}"),
        "artifact pair verified"
    );
    Ok((vectorizer.vectorizer, model.model))
}

fn encode<T: Serialize>(magic: &[u8; 4], value: &T) -> Result<Vec<u8>> {
    let mut bytes = magic.to_vec();
    bincode::serialize_into(&mut bytes, value)?;
    Ok(bytes)
}

fn decode<T: for<'de> Deserialize<'de>>(magic: &[u8; 4], path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => SentimentError::ArtifactNotFound(path.to_path_buf()),
        _ => SentimentError::Io(err),
    })?;
    if bytes.len() < magic.len() || &bytes[..magic.len()] != magic {
        return Err(SentimentError::InvalidArtifact {
            path: path.to_path_buf(),
            reason: format!("expected {} header", String::from_utf8_lossy(magic)),
        });
    }
    bincode::deserialize(&bytes[magic.len()..]).map_err(|err| SentimentError::InvalidArtifact {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Moves staged files over their targets as one unit.
fn install(files: &[(PathBuf, PathBuf)]) -> io::Result<()> {
    let mut backups = Vec::new();
    let mut installed = Vec::new();
    match swap_in(files, &mut backups, &mut installed) {
        Ok(()) => {
            for (backup, _) in &backups {
                let _ = fs::remove_file(backup);
            }
            Ok(())
        }
        Err(err) => {
            for target in &installed {
                let _ = fs::remove_file(target);
            }
            for (backup, target) in &backups {
                let _ = fs::rename(backup, target);
            }
            for (staged, _) in files {
                let _ = fs::remove_file(staged);
            }
            Err(err)
        }
    }
}

fn swap_in(
    files: &[(PathBuf, PathBuf)],
    backups: &mut Vec<(PathBuf, PathBuf)>,
    installed: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for (_, target) in files {
        if target.is_file() {
            let backup = sibling(target, BACKUP_SUFFIX);
            fs::rename(target, &backup)?;
            backups.push((backup, target.clone()));
        }
    }
    for (staged, target) in files {
        fs::rename(staged, target)?;
        installed.push(target.clone());
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::VectorizerConfig;
    use tempfile::tempdir;

    fn fitted(docs: &[&str]) -> (TfidfVectorizer, LogisticRegression) {
        let vectorizer = TfidfVectorizer::fit(VectorizerConfig::default(), docs).unwrap();
        let model = LogisticRegression::from_parameters(vec![0.5; vectorizer.dim()], -0.1);
        (vectorizer, model)
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let normalizer = Normalizer::new();
        let (vectorizer, model) = fitted(&["good film", "bad film"]);
        let paths = save_pair(dir.path(), &normalizer, &vectorizer, &model).unwrap();
        assert!(paths.vectorizer.exists() && paths.model.exists());
        assert!(!sibling(&paths.model, TMP_SUFFIX).exists());

        let (loaded_vectorizer, loaded_model) = load_pair(dir.path(), &normalizer).unwrap();
        assert_eq!(loaded_vectorizer.terms(), vectorizer.terms());
        assert_eq!(loaded_model, model);
    }

    #[test]
    fn rejects_pairs_from_different_runs() {
        let normalizer = Normalizer::new();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let (v1, m1) = fitted(&["good film", "bad film"]);
        let (v2, m2) = fitted(&["great plot", "awful plot"]);
        save_pair(first.path(), &normalizer, &v1, &m1).unwrap();
        save_pair(second.path(), &normalizer, &v2, &m2).unwrap();

        fs::copy(second.path().join(MODEL_FILE), first.path().join(MODEL_FILE)).unwrap();
        let err = load_pair(first.path(), &normalizer).unwrap_err();
        assert!(matches!(err, SentimentError::ArtifactMismatch(_)), "{err}");
    }

    #[test]
    fn rejects_missing_and_corrupt_files() {
        let normalizer = Normalizer::new();
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_pair(dir.path(), &normalizer),
            Err(SentimentError::ArtifactNotFound(_))
        ));

        let (vectorizer, model) = fitted(&["good film", "bad film"]);
        save_pair(dir.path(), &normalizer, &vectorizer, &model).unwrap();
        fs::write(dir.path().join(MODEL_FILE), b"pickle").unwrap();
        assert!(matches!(
            load_pair(dir.path(), &normalizer),
            Err(SentimentError::InvalidArtifact { .. })
        ));

        fs::write(dir.path().join(MODEL_FILE), b"SMDL\x01").unwrap();
        assert!(matches!(
            load_pair(dir.path(), &normalizer),
            Err(SentimentError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn refuses_to_save_mismatched_dimensions() {
        let dir = tempdir().unwrap();
        let (vectorizer, _) = fitted(&["good film", "bad film"]);
        let model = LogisticRegression::from_parameters(vec![0.0; 2], 0.0);
        let err = save_pair(dir.path(), &Normalizer::new(), &vectorizer, &model).unwrap_err();
        assert!(matches!(err, SentimentError::ArtifactMismatch(_)));
        assert!(!dir.path().join(VECTORIZER_FILE).exists());
    }

    #[test]
    fn failed_swap_restores_the_previous_pair() {
        let dir = tempdir().unwrap();
        let normalizer = Normalizer::new();
        let (old_vectorizer, _) = fitted(&["good film", "bad film"]);
        let (new_vectorizer, new_model) = fitted(&["great plot", "awful plot"]);

        let paths = ArtifactPaths::in_dir(dir.path());
        let old_bytes = encode(
            VECTORIZER_MAGIC,
            &VectorizerArtifact {
                normalizer_fingerprint: normalizer.fingerprint(),
                vocabulary_fingerprint: old_vectorizer.fingerprint(),
                vectorizer: old_vectorizer,
            },
        )
        .unwrap();
        fs::write(&paths.vectorizer, &old_bytes).unwrap();
        // A non-empty directory in place of the model makes its rename fail
        // after the vectorizer has already been moved.
        fs::create_dir(&paths.model).unwrap();
        fs::write(paths.model.join("keep"), b"x").unwrap();

        let err = save_pair(dir.path(), &normalizer, &new_vectorizer, &new_model).unwrap_err();
        assert!(matches!(err, SentimentError::Io(_)), "{err}");
        assert_eq!(fs::read(&paths.vectorizer).unwrap(), old_bytes);
        for suffix in [TMP_SUFFIX, BACKUP_SUFFIX] {
            assert!(!sibling(&paths.vectorizer, suffix).exists());
            assert!(!sibling(&paths.model, suffix).exists());
        }
    }
}
