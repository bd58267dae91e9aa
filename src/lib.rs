//! Procedural articulated rigid-body generator.
//!
//! Samples per-link physical and geometric attributes, obtains a mesh for
//! every link (generated from a primitive solid or copied from a mesh
//! library), places dependent links relative to a reference link, and writes
//! the result as a URDF body description next to its meshes.

pub mod batch;
pub mod bodies;
pub mod body;
pub mod config;
pub mod error;
pub mod link;
pub mod mesh;
pub mod sampler;
pub mod solids;
pub mod template;
pub mod toolchain;
pub mod transform;

pub use batch::{run_batch, BatchOptions, BatchReport, BodyOutcome};
pub use bodies::{build_composer, composer_for, BodyKind, GeneratorOptions};
pub use body::{BodyComposer, BodySpec, FixedPlacement, PlacementPolicy, ReferenceEndPlacement, BODY_FILENAME};
pub use config::{load_catalog, Catalog, TemplateSource};
pub use error::{ErrorKind, GenError, GenResult};
pub use link::{LinkGenerator, LinkRecord, LinkSpec};
pub use mesh::{Backend, LibraryMesh, MeshProvider, ProceduralMesh, ToolchainSettings};
pub use sampler::{Range, Range3};
pub use template::Template;
pub use transform::{rotation_matrix, transform_point, Transform};
