//! Tests for core error types

use toolchain_diagram::core::DiagramError;

#[test]
fn test_retrieval_error_names_url() {
    let error = DiagramError::retrieval_error(
        "https://rancher.com/docs/img/logo-square.png",
        "connection refused",
    );
    let error_msg = error.to_string();
    assert!(error_msg.starts_with("Retrieval error"));
    assert!(error_msg.contains("logo-square.png"));
    assert!(error_msg.contains("connection refused"));
}

#[test]
fn test_render_error() {
    let error = DiagramError::render_error("Graphviz executable 'dot' not found");
    assert_eq!(
        error.to_string(),
        "Render error: Graphviz executable 'dot' not found"
    );
}

#[test]
fn test_topology_error() {
    let error = DiagramError::topology_error("no icon asset registered for 'k3d'");
    assert!(error.to_string().contains("Topology error"));
    assert!(!error.is_retrieval());
    assert!(!error.is_render());
}

#[test]
fn test_downcast_through_anyhow() {
    let err: anyhow::Error = DiagramError::render_error("boom").into();
    let err = err.context("rendering terraform_k3d_diagram.png");
    assert!(err.downcast_ref::<DiagramError>().unwrap().is_render());
    assert!(format!("{:#}", err).contains("Render error: boom"));
}

#[test]
fn test_io_error() {
    use std::io;
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system");
    let error: DiagramError = io_err.into();
    assert!(error.to_string().contains("IO error"));
    assert!(error.to_string().contains("read-only"));
}
