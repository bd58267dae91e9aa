//! Primitive solids for procedurally generated links.
//!
//! Each solid kind is one row in [`EMITTERS`]: a name, a function that
//! writes the OpenSCAD description, and a function that builds the same
//! solid with vcad. Compilation and conversion only ever see a [`Solid`],
//! so adding a primitive means adding a module and a row here.

mod cube;
mod cylinder;

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::error::{GenError, GenResult};

type ScriptFn = fn(&Vector3<f64>) -> String;
type BuildFn = fn(&str, &Vector3<f64>) -> vcad::Part;

struct Emitter {
    name: &'static str,
    script: ScriptFn,
    build: BuildFn,
}

static EMITTERS: &[Emitter] = &[
    Emitter {
        name: "cube",
        script: cube::script,
        build: cube::build,
    },
    Emitter {
        name: "cylinder",
        script: cylinder::script,
        build: cylinder::build,
    },
];

/// Selector for a row of the emitter table.
#[derive(Clone, Copy)]
pub struct SolidKind(&'static Emitter);

impl SolidKind {
    /// Look up a solid kind by name.
    pub fn named(name: &str) -> GenResult<Self> {
        EMITTERS
            .iter()
            .find(|e| e.name == name)
            .map(SolidKind)
            .ok_or_else(|| GenError::UnknownSolidKind(name.to_string()))
    }

    #[must_use]
    pub fn cube() -> Self {
        SolidKind(&EMITTERS[0])
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Names of every available kind.
    pub fn available() -> impl Iterator<Item = &'static str> {
        EMITTERS.iter().map(|e| e.name)
    }

    /// Bind sampled dimensions to this kind.
    #[must_use]
    pub fn with_size(self, size: Vector3<f64>) -> Solid {
        Solid { kind: self, size }
    }
}

impl fmt::Debug for SolidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SolidKind").field(&self.0.name).finish()
    }
}

impl PartialEq for SolidKind {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl FromStr for SolidKind {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::named(s)
    }
}

/// A solid kind with concrete dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    kind: SolidKind,
    size: Vector3<f64>,
}

impl Solid {
    #[must_use]
    pub fn kind(&self) -> SolidKind {
        self.kind
    }

    #[must_use]
    pub fn size(&self) -> &Vector3<f64> {
        &self.size
    }

    /// OpenSCAD description of this solid.
    #[must_use]
    pub fn script(&self) -> String {
        (self.kind.0.script)(&self.size)
    }

    /// Build this solid with the vcad CSG kernel.
    #[must_use]
    pub fn build(&self, name: &str) -> vcad::Part {
        (self.kind.0.build)(name, &self.size)
    }
}
