//! Mesh providers: where a link's geometry file comes from.
//!
//! A link either gets a procedurally generated mesh ([`ProceduralMesh`]) or
//! a copy of a pre-made one ([`LibraryMesh`]). The choice is made once, when
//! the link generator is built, by [`provider_for`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::error::{GenError, GenResult};
use crate::link::{LinkRecord, LinkSpec};
use crate::solids::SolidKind;
use crate::toolchain::{MeshCompiler, MeshConverter, OpenScad, Vcad};

/// How a provider interprets the sampled per-axis extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentMode {
    /// The extent scales an existing mesh.
    Scale,
    /// The extent sizes a generated solid; the mesh is used at unit scale.
    Size,
}

/// Yields a mesh file for a link.
pub trait MeshProvider: Send + Sync {
    fn extent_mode(&self) -> ExtentMode;

    /// Produce the mesh for `record` inside `output_dir` and return its path.
    fn generate(
        &self,
        record: &LinkRecord,
        output_dir: &Path,
        rng: &mut dyn RngCore,
    ) -> GenResult<PathBuf>;
}

/// Canonical mesh filename for a link.
#[must_use]
pub fn mesh_filename(link: &str) -> String {
    format!("{link}.obj")
}

/// Copies a randomly chosen mesh from a pool.
///
/// Candidates must already have their centre of mass at the local origin;
/// no recentering happens.
#[derive(Debug, Clone)]
pub struct LibraryMesh {
    link: String,
    pool: Vec<PathBuf>,
}

impl LibraryMesh {
    pub fn new(link: impl Into<String>, pool: Vec<PathBuf>) -> GenResult<Self> {
        let link = link.into();
        if pool.is_empty() {
            return Err(GenError::EmptyMeshPool { link });
        }
        Ok(Self { link, pool })
    }
}

impl MeshProvider for LibraryMesh {
    fn extent_mode(&self) -> ExtentMode {
        ExtentMode::Scale
    }

    fn generate(
        &self,
        record: &LinkRecord,
        output_dir: &Path,
        rng: &mut dyn RngCore,
    ) -> GenResult<PathBuf> {
        let source = self.pool.choose(rng).ok_or_else(|| GenError::EmptyMeshPool {
            link: self.link.clone(),
        })?;
        let dest = output_dir.join(mesh_filename(&record.name));
        debug!("copying {} -> {}", source.display(), dest.display());
        fs::copy(source, &dest).map_err(|e| {
            // source present: the write side failed
            let path = if source.is_file() { dest.as_path() } else { source.as_path() };
            GenError::io(path)(e)
        })?;
        Ok(dest)
    }
}

/// Which compiler produces the intermediate STL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// External `openscad` binary.
    #[default]
    OpenScad,
    /// In-process vcad CSG kernel.
    Vcad,
}

impl FromStr for Backend {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openscad" => Ok(Self::OpenScad),
            "vcad" => Ok(Self::Vcad),
            other => Err(GenError::Config {
                source_name: "backend".to_string(),
                message: format!("unknown mesh backend '{other}' (expected openscad or vcad)"),
            }),
        }
    }
}

/// Synthesizes a mesh from the sampled size.
pub struct ProceduralMesh {
    solid: SolidKind,
    compiler: Box<dyn MeshCompiler>,
    converter: MeshConverter,
}

impl ProceduralMesh {
    pub fn new(solid: SolidKind, compiler: Box<dyn MeshCompiler>, converter: MeshConverter) -> Self {
        Self {
            solid,
            compiler,
            converter,
        }
    }
}

impl fmt::Debug for ProceduralMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProceduralMesh")
            .field("solid", &self.solid)
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}

impl MeshProvider for ProceduralMesh {
    fn extent_mode(&self) -> ExtentMode {
        ExtentMode::Size
    }

    fn generate(
        &self,
        record: &LinkRecord,
        output_dir: &Path,
        _rng: &mut dyn RngCore,
    ) -> GenResult<PathBuf> {
        let solid = self.solid.with_size(record.extent());
        let stl = self.compiler.compile(&solid, output_dir, &record.name)?;
        self.converter.convert(&stl, output_dir, &record.name)
    }
}

/// Settings for the procedural toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainSettings {
    pub backend: Backend,
    /// Directory holding the `meshconv` binaries.
    pub bin_dir: PathBuf,
    /// The `openscad` executable.
    pub openscad: PathBuf,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            bin_dir: PathBuf::from("bin"),
            openscad: PathBuf::from("openscad"),
        }
    }
}

/// Library provider when the link has a mesh pool, procedural otherwise.
pub fn provider_for(spec: &LinkSpec, settings: &ToolchainSettings) -> GenResult<Box<dyn MeshProvider>> {
    if let Some(pool) = &spec.mesh_pool {
        return Ok(Box::new(LibraryMesh::new(spec.name.clone(), pool.clone())?));
    }
    let solid = SolidKind::named(&spec.solid)?;
    let converter = MeshConverter::for_host(&settings.bin_dir)?;
    let compiler: Box<dyn MeshCompiler> = match settings.backend {
        Backend::OpenScad => Box::new(OpenScad::new(settings.openscad.clone())),
        Backend::Vcad => Box::new(Vcad),
    };
    Ok(Box::new(ProceduralMesh::new(solid, compiler, converter)))
}
