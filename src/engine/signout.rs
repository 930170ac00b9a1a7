//! Credential removal for the sign-out action.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::cancel::CancelToken;
use super::events::EventSink;
use super::summary::SignOutSummary;

/// Whether a file name contains any of the lowercase `markers`,
/// ignoring case.
pub fn is_credential_file(file_name: &str, markers: &[String]) -> bool {
    let name = file_name.to_lowercase();
    markers.iter().any(|m| name.contains(m.as_str()))
}

/// Credential files below `roots`, in walk order. Missing roots are skipped.
pub fn find_credential_files(roots: &[PathBuf], markers: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for root in roots {
        if !root.is_dir() {
            tracing::debug!("Credential root not present: {}", root.display());
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            if is_credential_file(&entry.file_name().to_string_lossy(), markers) {
                found.push(entry.into_path());
            }
        }
    }

    found
}

/// Delete every credential file below `roots`.
///
/// Failures are logged and counted; cancellation is checked before each
/// file.
pub(crate) fn sign_out(
    roots: &[PathBuf],
    markers: &[String],
    cancel: &CancelToken,
    sink: &EventSink,
) -> SignOutSummary {
    let files = find_credential_files(roots, markers);
    let mut summary = SignOutSummary {
        matched: files.len() as u64,
        ..Default::default()
    };

    if files.is_empty() {
        sink.info("No credential files found");
        return summary;
    }

    for file in &files {
        if cancel.is_cancelled() {
            summary.interrupted = true;
            break;
        }
        match remove(file) {
            Ok(()) => {
                summary.deleted += 1;
                tracing::debug!("Removed credential file {}", file.display());
            }
            Err(e) => {
                summary.failed += 1;
                sink.error(format!("Failed to remove {}: {}", file.display(), e));
            }
        }
    }

    if summary.failed == 0 && !summary.interrupted {
        sink.success(format!("Signed out, {} credential files removed", summary.deleted));
    }
    summary
}

fn remove(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn markers() -> Vec<String> {
        ["unity.sso", "accesstoken", "refreshtoken", "credentials"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_marker_match_ignores_case() {
        assert!(is_credential_file("Unity.SSO.json", &markers()));
        assert!(is_credential_file("hub-AccessToken", &markers()));
        assert!(is_credential_file("CREDENTIALS", &markers()));
        assert!(!is_credential_file("settings.json", &markers()));
    }

    #[test]
    fn test_sign_out_removes_only_credentials() {
        let tmp = TempDir::new().unwrap();
        let hub = tmp.path().join("UnityHub");
        fs::create_dir_all(hub.join("nested")).unwrap();
        fs::write(hub.join("refreshToken"), "t").unwrap();
        fs::write(hub.join("nested/user.credentials"), "c").unwrap();
        fs::write(hub.join("preferences.json"), "{}").unwrap();

        let (tx, _rx) = mpsc::channel();
        let summary = sign_out(
            &[hub.clone(), tmp.path().join("missing")],
            &markers(),
            &CancelToken::new(),
            &EventSink::new(tx),
        );

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.failed, 0);
        assert!(!hub.join("refreshToken").exists());
        assert!(hub.join("preferences.json").exists());
    }

    #[test]
    fn test_cancelled_sign_out_deletes_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("accessToken"), "t").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let (tx, _rx) = mpsc::channel();
        let summary = sign_out(
            &[tmp.path().to_path_buf()],
            &markers(),
            &cancel,
            &EventSink::new(tx),
        );

        assert!(summary.interrupted);
        assert_eq!(summary.deleted, 0);
        assert!(tmp.path().join("accessToken").exists());
    }
}
