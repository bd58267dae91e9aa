//! External mesh tools and the compile/convert chain.
//!
//! A procedural mesh goes solid → intermediate STL → target OBJ. The first
//! step is a [`MeshCompiler`] (OpenSCAD, or vcad in process); the second is
//! always the platform's `meshconv` binary. Every external invocation is a
//! single blocking step that either produces its output file or fails.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{GenError, GenResult};
use crate::solids::Solid;

/// An external program invoked with a fixed command-line shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    name: String,
    program: PathBuf,
}

impl ExternalTool {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run to completion and require `expected` to exist afterwards.
    pub fn run<I, S>(&self, args: I, expected: &Path) -> GenResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(args);
        debug!("running {:?}", command);

        let output = command.output().map_err(|e| self.failure(format!(
            "could not start '{}': {e}",
            self.program.display()
        )))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("{} ({})", output.status, stderr.trim())));
        }
        if !expected.is_file() {
            return Err(self.failure(format!("no output at '{}'", expected.display())));
        }
        Ok(())
    }

    fn failure(&self, reason: String) -> GenError {
        GenError::ExternalTool {
            tool: self.name.clone(),
            reason,
        }
    }
}

/// `meshconv` binary name for an OS as reported by `std::env::consts::OS`.
pub fn converter_binary(os: &str) -> GenResult<&'static str> {
    match os {
        "linux" => Ok("meshconv_linux"),
        "macos" => Ok("meshconv_osx"),
        "windows" => Ok("meshconv.exe"),
        other => Err(GenError::UnsupportedPlatform { os: other.to_string() }),
    }
}

/// STL → OBJ converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshConverter {
    tool: ExternalTool,
}

impl MeshConverter {
    /// Pick the converter for the host OS from `bin_dir`.
    pub fn for_host(bin_dir: &Path) -> GenResult<Self> {
        let binary = converter_binary(std::env::consts::OS)?;
        Ok(Self::with_program(bin_dir.join(binary)))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            tool: ExternalTool::new("meshconv", program),
        }
    }

    #[must_use]
    pub fn tool(&self) -> &ExternalTool {
        &self.tool
    }

    /// Convert `stl` into `<dir>/<stem>.obj`.
    pub fn convert(&self, stl: &Path, dir: &Path, stem: &str) -> GenResult<PathBuf> {
        let out_stem = dir.join(stem);
        let obj = dir.join(format!("{stem}.obj"));
        self.tool.run(
            [
                OsStr::new("-c"),
                OsStr::new("obj"),
                OsStr::new("-tri"),
                OsStr::new("-o"),
                out_stem.as_os_str(),
                stl.as_os_str(),
            ],
            &obj,
        )?;
        Ok(obj)
    }
}

/// Produces the intermediate STL for a solid.
pub trait MeshCompiler: Send + Sync {
    /// Write `<dir>/<stem>.stl` (and any scratch files) and return its path.
    fn compile(&self, solid: &Solid, dir: &Path, stem: &str) -> GenResult<PathBuf>;
}

/// Writes an OpenSCAD script and compiles it with the `openscad` binary.
#[derive(Debug, Clone)]
pub struct OpenScad {
    tool: ExternalTool,
}

impl OpenScad {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            tool: ExternalTool::new("openscad", program),
        }
    }
}

impl Default for OpenScad {
    fn default() -> Self {
        Self::new("openscad")
    }
}

impl MeshCompiler for OpenScad {
    fn compile(&self, solid: &Solid, dir: &Path, stem: &str) -> GenResult<PathBuf> {
        let scad = dir.join(format!("{stem}.scad"));
        let stl = dir.join(format!("{stem}.stl"));
        fs::write(&scad, solid.script()).map_err(GenError::io(&scad))?;
        self.tool
            .run([OsStr::new("-o"), stl.as_os_str(), scad.as_os_str()], &stl)?;
        Ok(stl)
    }
}

/// Builds the solid in process with vcad and writes the STL directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vcad;

impl MeshCompiler for Vcad {
    fn compile(&self, solid: &Solid, dir: &Path, stem: &str) -> GenResult<PathBuf> {
        let stl = dir.join(format!("{stem}.stl"));
        let part = solid.build(stem);
        debug!("vcad: writing {} to {}", solid.kind().name(), stl.display());
        part.write_stl(&stl).map_err(|e| GenError::ExternalTool {
            tool: "vcad".to_string(),
            reason: e.to_string(),
        })?;
        if !stl.is_file() {
            return Err(GenError::ExternalTool {
                tool: "vcad".to_string(),
                reason: format!("no output at '{}'", stl.display()),
            });
        }
        Ok(stl)
    }
}
