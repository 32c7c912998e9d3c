//! Core error types for diagram generation
//!
//! Every stage of the pipeline (asset fetch, topology construction, render)
//! reports failures through [`DiagramError`]. Public functions return
//! `anyhow::Result`, so callers can `downcast_ref::<DiagramError>()` to
//! tell the stages apart.

use thiserror::Error;

/// Core error types for diagram generation
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Retrieval error: {url}: {message}")]
    RetrievalError { url: String, message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Topology error: {message}")]
    TopologyError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new retrieval error for the given URL
    pub fn retrieval_error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RetrievalError {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    /// Create a new topology error
    pub fn topology_error(message: impl Into<String>) -> Self {
        Self::TopologyError {
            message: message.into(),
        }
    }

    /// True for failures raised while fetching assets
    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::RetrievalError { .. })
    }

    /// True for failures raised by a renderer
    pub fn is_render(&self) -> bool {
        matches!(self, Self::RenderError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_error() {
        let error = DiagramError::retrieval_error("https://example.com/a.png", "404 Not Found");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Retrieval error"));
        assert!(error_msg.contains("https://example.com/a.png"));
        assert!(error_msg.contains("404 Not Found"));
        assert!(error.is_retrieval());
        assert!(!error.is_render());
    }

    #[test]
    fn test_render_error() {
        let error = DiagramError::render_error("dot exited with status 1");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Render error"));
        assert!(error_msg.contains("dot exited"));
        assert!(error.is_render());
    }

    #[test]
    fn test_topology_error() {
        let error = DiagramError::topology_error("edge references unknown node 12");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Topology error"));
        assert!(error_msg.contains("unknown node 12"));
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: DiagramError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("File not found"));
    }
}
