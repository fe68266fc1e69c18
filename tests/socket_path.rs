use std::{ffi::OsString, path::PathBuf};

use stakeledger::client::{resolve_socket_path_from, Client, ClientError};

#[test]
fn missing_socket_path_is_reported_verbatim() {
    let err = resolve_socket_path_from(None, None).unwrap_err();

    assert!(matches!(err, ClientError::MissingSocketPath));
    assert_eq!(err.to_string(), "Missing: --socket-path SOCKET_PATH");
}

#[test]
fn empty_environment_value_counts_as_missing() {
    let err = resolve_socket_path_from(None, Some(OsString::new())).unwrap_err();

    assert!(matches!(err, ClientError::MissingSocketPath));
}

#[test]
fn environment_is_used_as_fallback() {
    let path = resolve_socket_path_from(None, Some("/tmp/node.socket".into())).unwrap();

    assert_eq!(path, PathBuf::from("/tmp/node.socket"));
}

#[test]
fn explicit_flag_wins_over_environment() {
    let path = resolve_socket_path_from(
        Some("/run/explicit.socket".into()),
        Some("/tmp/node.socket".into()),
    )
    .unwrap();

    assert_eq!(path, PathBuf::from("/run/explicit.socket"));
}

#[tokio::test]
async fn connecting_to_absent_daemon_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nobody-home.socket");

    let err = Client::connect(&path).await.unwrap_err();

    let ClientError::Connect { path: reported, .. } = &err else {
        panic!("expected connect error, got {err:?}");
    };

    assert_eq!(reported, &path);
}
