//! Image renderer backed by the Graphviz `dot` executable
//!
//! The DOT source is piped into `dot -T<format> -o <tmp>`, where `<tmp>` is a
//! temporary file in the working directory. The file is moved onto the final
//! name only after `dot` succeeds, so a failed render leaves nothing behind.
//! `dot` runs inside the working directory so relative icon paths resolve.
//! Graphviz reports unloadable images on stderr while still exiting 0; those
//! lines are re-emitted as `warn!` events.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Result;
use tracing::{debug, info, span, warn, Level};

use super::DotRenderer;
use crate::core::{Diagram, DiagramError, OutputFormat, Renderer};

/// Default Graphviz layout command
pub const DEFAULT_DOT_COMMAND: &str = "dot";

/// Environment variable overriding the layout command
pub const DOT_COMMAND_ENV: &str = "TOOLCHAIN_DIAGRAM_DOT";

/// Permissions of the written diagram (unix)
pub const OUTPUT_MODE: u32 = 0o644;

/// Renders a diagram to an image file through Graphviz
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    work_dir: PathBuf,
    command: String,
}

impl GraphvizRenderer {
    /// Create a renderer writing into `work_dir` with the default `dot` command
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            command: DEFAULT_DOT_COMMAND.to_string(),
        }
    }

    /// Use a different Graphviz executable
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Where the diagram will be written
    pub fn output_path(&self, diagram: &Diagram) -> PathBuf {
        self.work_dir.join(diagram.output_file_name())
    }

    /// Run Graphviz, returning the non-empty stderr lines of a successful run
    fn run_dot(
        &self,
        work_dir: &Path,
        source: &str,
        format: OutputFormat,
        output: &Path,
    ) -> Result<Vec<String>> {
        debug!(command = %self.command, format = %format, "Spawning Graphviz");
        let mut child = Command::new(&self.command)
            .arg(format!("-T{}", format.extension()))
            .arg("-o")
            .arg(output)
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    DiagramError::render_error(format!(
                        "Graphviz executable '{}' not found; install Graphviz or set {}",
                        self.command, DOT_COMMAND_ENV
                    ))
                } else {
                    DiagramError::render_error(format!("failed to start '{}': {}", self.command, e))
                }
            })?;

        // A write failure usually means dot exited early; its status and
        // stderr explain why, so check those first.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(source.as_bytes()),
            None => Ok(()),
        };

        let result = child.wait_with_output().map_err(|e| {
            DiagramError::render_error(format!("failed to wait for '{}': {}", self.command, e))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(DiagramError::render_error(format!(
                "'{}' exited with {}: {}",
                self.command,
                result.status,
                stderr.trim()
            ))
            .into());
        }
        written.map_err(|e| {
            DiagramError::render_error(format!("failed to send DOT source to '{}': {}", self.command, e))
        })?;

        let diagnostics = String::from_utf8_lossy(&result.stderr)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(diagnostics)
    }
}

impl Renderer for GraphvizRenderer {
    type Output = PathBuf;

    fn render(&self, diagram: &Diagram) -> Result<Self::Output> {
        let render_span = span!(
            Level::INFO,
            "render_graphviz",
            format = %diagram.format(),
            file = %diagram.output_file_name()
        );
        let _enter = render_span.enter();

        let source = DotRenderer::new().render(diagram)?;

        let work_dir = fs::canonicalize(&self.work_dir).map_err(|e| {
            DiagramError::render_error(format!(
                "working directory {} is not usable: {}",
                self.work_dir.display(),
                e
            ))
        })?;
        let target = work_dir.join(diagram.output_file_name());

        let staged = tempfile::Builder::new()
            .prefix(".toolchain-diagram-")
            .suffix(&format!(".{}", diagram.format().extension()))
            .tempfile_in(&work_dir)
            .map_err(|e| {
                DiagramError::render_error(format!(
                    "cannot create temporary output in {}: {}",
                    work_dir.display(),
                    e
                ))
            })?;

        if diagram.format().needs_graphviz() {
            let diagnostics = self.run_dot(&work_dir, &source, diagram.format(), staged.path())?;
            for line in &diagnostics {
                warn!(command = %self.command, "{}", line);
            }
        } else {
            fs::write(staged.path(), &source)?;
        }

        let bytes = fs::metadata(staged.path())?.len();
        if bytes == 0 {
            return Err(DiagramError::render_error(format!(
                "'{}' produced an empty {} file",
                self.command,
                diagram.format()
            ))
            .into());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staged.path(), fs::Permissions::from_mode(OUTPUT_MODE))?;
        }

        staged.persist(&target).map_err(|e| {
            DiagramError::render_error(format!("cannot write {}: {}", target.display(), e.error))
        })?;

        info!(path = %target.display(), bytes, "Diagram written");
        Ok(target)
    }

    fn name(&self) -> &'static str {
        "graphviz"
    }

    fn format(&self) -> &'static str {
        "image"
    }
}
