//! Batch compiler launcher
//!
//! After export the game's own tooling packs `level_xml/` into
//! `level_xml.dz`. We only start the script, wait for it and copy the
//! archive it produces.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// Archive produced by the compile scripts
pub const ARCHIVE_NAME: &str = "level_xml.dz";

/// Errors that can occur when launching the compiler
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Compile script not found: {0}")]
    MissingFile(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a compile run
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub elapsed: Duration,
    pub success: bool,
    /// Where the archive was copied, if it was
    pub deployed: Option<PathBuf>,
}

/// Script name for the requested build speed
pub fn script_name(fast: bool) -> &'static str {
    if fast {
        "compile-fast.bat"
    } else {
        "compile.bat"
    }
}

fn script_command(script: &Path) -> Command {
    if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C").arg(script);
        command
    } else {
        Command::new(script)
    }
}

/// Run the compile script in `tools_dir` and wait for it to finish.
///
/// A non-zero exit is logged and reported, not returned as an error. When
/// `deploy_dir` is set and the archive exists it is copied there.
pub fn compile(
    tools_dir: &Path,
    fast: bool,
    deploy_dir: Option<&Path>,
) -> Result<CompileReport, CompileError> {
    let script = tools_dir.join(script_name(fast));
    if !script.exists() {
        return Err(CompileError::MissingFile(script));
    }

    tracing::info!("Running {}", script.display());
    let started = Instant::now();
    let status = script_command(&script).current_dir(tools_dir).status()?;
    let elapsed = started.elapsed();

    if !status.success() {
        tracing::warn!("{} exited with {}", script.display(), status);
    }

    let archive = tools_dir.join(ARCHIVE_NAME);
    let deployed = match deploy_dir {
        Some(dir) if archive.exists() => {
            std::fs::create_dir_all(dir)?;
            let dest = dir.join(ARCHIVE_NAME);
            std::fs::copy(&archive, &dest)?;
            tracing::info!("Copied {} to {}", ARCHIVE_NAME, dest.display());
            Some(dest)
        }
        _ => None,
    };

    tracing::info!("Compilation finished in {:.2} seconds", elapsed.as_secs_f32());

    Ok(CompileReport {
        elapsed,
        success: status.success(),
        deployed,
    })
}
