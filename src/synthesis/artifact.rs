//! 输出产物目录：文件命名、冲突策略与下载路径解析。

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use crate::orchestrator::config::CollisionPolicy;
use crate::orchestrator::constants::ARTIFACT_EXTENSION;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact '{0}' already exists")]
    Collision(String),
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("artifact '{0}' not found")]
    NotFound(String),
    #[error("artifact I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArtifactError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
        move |source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Lowercased topic with spaces (and path separators) turned into underscores.
pub fn artifact_filename(topic: &str) -> String {
    let stem: String = topic
        .trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    format!("{stem}.{ARTIFACT_EXTENSION}")
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    policy: CollisionPolicy,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Claims a filename for one job; released when dropped.
#[derive(Debug)]
pub struct ArtifactReservation {
    filename: String,
    path: PathBuf,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ArtifactReservation {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactReservation {
    fn drop(&mut self) {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        in_flight.remove(&self.filename);
    }
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, policy: CollisionPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub async fn reserve(&self, topic: &str) -> Result<ArtifactReservation, ArtifactError> {
        let base = artifact_filename(topic);
        if base.len() == ARTIFACT_EXTENSION.len() + 1 {
            return Err(ArtifactError::InvalidName(topic.to_string()));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(ArtifactError::io(&self.dir))?;

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let taken = |name: &str, in_flight: &HashSet<String>| {
            in_flight.contains(name) || self.dir.join(name).exists()
        };

        let chosen = match self.policy {
            CollisionPolicy::Overwrite => {
                if taken(&base, &in_flight) {
                    warn!(
                        target: "artifact_store",
                        filename = %base,
                        "overwriting existing artifact"
                    );
                }
                base
            }
            CollisionPolicy::Reject => {
                if taken(&base, &in_flight) {
                    return Err(ArtifactError::Collision(base));
                }
                base
            }
            CollisionPolicy::Uniquify => {
                let stem = base
                    .strip_suffix(&format!(".{ARTIFACT_EXTENSION}"))
                    .unwrap_or(&base)
                    .to_string();
                let mut candidate = base.clone();
                let mut suffix = 2_u32;
                while taken(&candidate, &in_flight) {
                    candidate = format!("{stem}_{suffix}.{ARTIFACT_EXTENSION}");
                    suffix += 1;
                }
                candidate
            }
        };

        in_flight.insert(chosen.clone());
        info!(
            target: "artifact_store",
            filename = %chosen,
            policy = self.policy.as_str(),
            "reserved artifact"
        );

        Ok(ArtifactReservation {
            path: self.dir.join(&chosen),
            filename: chosen,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub async fn is_present(&self, reservation: &ArtifactReservation) -> bool {
        matches!(
            tokio::fs::metadata(reservation.path()).await,
            Ok(metadata) if metadata.is_file()
        )
    }

    /// Resolves a download name to a path inside the output directory.
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf, ArtifactError> {
        let candidate = Path::new(filename);
        let mut components = candidate.components();
        let valid = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none()
            && !filename.contains('/')
            && !filename.contains('\\');
        if !valid {
            return Err(ArtifactError::InvalidName(filename.to_string()));
        }

        let path = self.dir.join(candidate);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            _ => Err(ArtifactError::NotFound(filename.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn filenames_are_normalized() {
        assert_eq!(artifact_filename("Black Hole"), "black_hole.mp3");
        assert_eq!(artifact_filename("  Taj Mahal "), "taj_mahal.mp3");
        assert_eq!(artifact_filename("AC/DC"), "ac_dc.mp3");
    }

    #[tokio::test]
    async fn overwrite_reuses_the_name() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path(), CollisionPolicy::Overwrite);
        std::fs::write(dir.path().join("chai.mp3"), b"old").expect("seed");
        let reservation = store.reserve("Chai").await.expect("reserve");
        assert_eq!(reservation.filename(), "chai.mp3");
    }

    #[tokio::test]
    async fn reject_refuses_existing_and_in_flight_names() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path(), CollisionPolicy::Reject);
        let first = store.reserve("Chai").await.expect("reserve");
        assert!(matches!(
            store.reserve("chai").await,
            Err(ArtifactError::Collision(name)) if name == "chai.mp3"
        ));
        drop(first);
        assert!(store.reserve("chai").await.is_ok());

        std::fs::write(dir.path().join("samosa.mp3"), b"x").expect("seed");
        assert!(store.reserve("Samosa").await.is_err());
    }

    #[tokio::test]
    async fn uniquify_skips_taken_names() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path(), CollisionPolicy::Uniquify);
        std::fs::write(dir.path().join("chai.mp3"), b"x").expect("seed");
        let first = store.reserve("Chai").await.expect("reserve");
        assert_eq!(first.filename(), "chai_2.mp3");
        let second = store.reserve("Chai").await.expect("reserve");
        assert_eq!(second.filename(), "chai_3.mp3");
    }

    #[tokio::test]
    async fn resolve_rejects_traversal() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path(), CollisionPolicy::Overwrite);
        std::fs::write(dir.path().join("chai.mp3"), b"x").expect("seed");
        assert!(store.resolve("chai.mp3").await.is_ok());
        assert!(matches!(
            store.resolve("../chai.mp3").await,
            Err(ArtifactError::InvalidName(_))
        ));
        assert!(matches!(
            store.resolve("missing.mp3").await,
            Err(ArtifactError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_topic_is_invalid() {
        let dir = tempdir().expect("tempdir");
        let store = ArtifactStore::new(dir.path(), CollisionPolicy::Overwrite);
        assert!(matches!(
            store.reserve("   ").await,
            Err(ArtifactError::InvalidName(_))
        ));
    }
}
