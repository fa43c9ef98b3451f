//! Host root validation: every marker directory must exist and be readable.
//!
//! Probes run concurrently. Any I/O failure counts as a missing marker.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MarkerStatus {
    pub marker: String,
    pub present: bool,
}

/// Probe each marker under `root`, returning results in marker order.
pub async fn probe_markers(root: &Path, markers: &[String]) -> Vec<MarkerStatus> {
    let mut set = JoinSet::new();
    for (idx, marker) in markers.iter().enumerate() {
        let path = root.join(marker);
        set.spawn(async move { (idx, probe_dir(path).await) });
    }

    let mut present = vec![false; markers.len()];
    while let Some(joined) = set.join_next().await {
        if let Ok((idx, ok)) = joined {
            present[idx] = ok;
        }
    }

    markers
        .iter()
        .zip(present)
        .map(|(marker, present)| MarkerStatus {
            marker: marker.clone(),
            present,
        })
        .collect()
}

/// `true` iff every marker is a readable directory under `root`.
pub async fn is_valid_host(root: &Path, markers: &[String]) -> bool {
    probe_markers(root, markers).await.iter().all(|m| m.present)
}

async fn probe_dir(path: PathBuf) -> bool {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            debug!(path = %path.display(), "marker is not a directory");
            return false;
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "marker probe failed");
            return false;
        }
    }
    match tokio::fs::read_dir(&path).await {
        Ok(_) => true,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "marker is unreadable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn markers() -> Vec<String> {
        vec!["api".into(), "web".into(), "docker".into()]
    }

    #[tokio::test]
    async fn test_all_markers_present() {
        let dir = tempdir().unwrap();
        for m in markers() {
            std::fs::create_dir(dir.path().join(m)).unwrap();
        }
        assert!(is_valid_host(dir.path(), &markers()).await);
    }

    #[tokio::test]
    async fn test_one_marker_missing() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("api")).unwrap();
        std::fs::create_dir(dir.path().join("web")).unwrap();

        let status = probe_markers(dir.path(), &markers()).await;
        assert!(!is_valid_host(dir.path(), &markers()).await);
        assert_eq!(
            status.iter().filter(|m| !m.present).map(|m| m.marker.as_str()).collect::<Vec<_>>(),
            vec!["docker"]
        );
    }

    #[tokio::test]
    async fn test_marker_that_is_a_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("api")).unwrap();
        std::fs::create_dir(dir.path().join("web")).unwrap();
        std::fs::write(dir.path().join("docker"), "").unwrap();
        assert!(!is_valid_host(dir.path(), &markers()).await);
    }

    #[tokio::test]
    async fn test_missing_root() {
        let dir = tempdir().unwrap();
        assert!(!is_valid_host(&dir.path().join("nope"), &markers()).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_marker_is_negative() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::geteuid().is_root() {
            return;
        }

        let dir = tempdir().unwrap();
        for m in markers() {
            std::fs::create_dir(dir.path().join(m)).unwrap();
        }
        let web = dir.path().join("web");
        std::fs::set_permissions(&web, std::fs::Permissions::from_mode(0o000)).unwrap();

        let valid = is_valid_host(dir.path(), &markers()).await;
        std::fs::set_permissions(&web, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!valid);
    }
}
