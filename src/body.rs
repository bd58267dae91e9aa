//! Composite bodies: link placement and the body description file.
//!
//! A [`BodyComposer`] always runs the same sequence: generate every link at
//! the origin, place each dependent link relative to the reference link,
//! render the link fragments, merge them into the body template and write
//! [`BODY_FILENAME`]. Body shapes differ only in their links and in their
//! [`PlacementPolicy`] values.

use std::f64::consts::PI;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::Vector3;
use rand::{Rng, RngCore};

use crate::error::{GenError, GenResult};
use crate::link::{LinkGenerator, LinkRecord, LinkSpec};
use crate::mesh::{provider_for, ToolchainSettings};
use crate::template::{Bindings, Template};
use crate::transform::Transform;

/// Name of the body description written into each output directory.
pub const BODY_FILENAME: &str = "body.urdf";

/// Computes where a dependent link sits in its reference link's frame.
pub trait PlacementPolicy: Send + Sync {
    fn place(&self, reference: &LinkRecord, dependent: &LinkRecord, rng: &mut dyn RngCore) -> Transform;
}

impl<F> PlacementPolicy for F
where
    F: Fn(&LinkRecord, &LinkRecord, &mut dyn RngCore) -> Transform + Send + Sync,
{
    fn place(&self, reference: &LinkRecord, dependent: &LinkRecord, rng: &mut dyn RngCore) -> Transform {
        self(reference, dependent, rng)
    }
}

/// Constant rotation and offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPlacement(pub Transform);

impl PlacementPolicy for FixedPlacement {
    fn place(&self, _: &LinkRecord, _: &LinkRecord, _: &mut dyn RngCore) -> Transform {
        self.0
    }
}

/// Offset along the reference link's z axis proportional to its z extent.
///
/// With `factor = 0.5` a centered dependent lands on the end of the
/// reference link. That holds for procedural links, whose extent is a size.
/// A library link's extent is a dimensionless mesh scale, so the offset is
/// `factor` times that scale and only reaches the end of meshes one unit
/// long along z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceEndPlacement {
    pub rotation: Vector3<f64>,
    pub factor: f64,
}

impl PlacementPolicy for ReferenceEndPlacement {
    fn place(&self, reference: &LinkRecord, _: &LinkRecord, _: &mut dyn RngCore) -> Transform {
        Transform::new(self.rotation, Vector3::new(0.0, 0.0, self.factor * reference.extent().z))
    }
}

/// Rotation axis for [`Flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Turns the wrapped placement half a revolution about `axis` with the
/// given probability.
pub struct Flip {
    pub inner: Box<dyn PlacementPolicy>,
    pub axis: Axis,
    pub probability: f64,
}

impl fmt::Debug for Flip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flip")
            .field("axis", &self.axis)
            .field("probability", &self.probability)
            .finish_non_exhaustive()
    }
}

impl PlacementPolicy for Flip {
    fn place(&self, reference: &LinkRecord, dependent: &LinkRecord, rng: &mut dyn RngCore) -> Transform {
        let mut t = self.inner.place(reference, dependent, rng);
        if rng.gen_bool(self.probability.clamp(0.0, 1.0)) {
            t.rotation[self.axis.index()] += PI;
        }
        t
    }
}

/// Static description of a composite body.
#[derive(Debug, Clone)]
pub struct BodySpec {
    pub name: String,
    /// Links in render order.
    pub links: Vec<LinkSpec>,
    /// The link every other link is placed relative to.
    pub reference: String,
    pub template: Template,
}

struct Placement {
    link: usize,
    policy: Box<dyn PlacementPolicy>,
}

/// Generates, places, renders and writes one composite body.
pub struct BodyComposer {
    name: String,
    links: Vec<LinkGenerator>,
    reference: usize,
    placements: Vec<Placement>,
    template: Template,
}

impl BodyComposer {
    /// Assemble a composer from per-link generators and per-dependent
    /// placements, keyed by link name.
    ///
    /// Every link except the reference needs exactly one placement, and the
    /// body template may only use `name`, `<link>_link` and `<link>_name`.
    pub fn new(
        name: impl Into<String>,
        links: Vec<LinkGenerator>,
        reference: &str,
        placements: Vec<(String, Box<dyn PlacementPolicy>)>,
        template: Template,
    ) -> GenResult<Self> {
        let name = name.into();
        let index_of = |link: &str| {
            links.iter().position(|g| g.name() == link).ok_or_else(|| GenError::UnknownLink {
                body: name.clone(),
                link: link.to_string(),
            })
        };

        let reference = index_of(reference)?;
        let mut resolved = Vec::with_capacity(placements.len());
        for (link, policy) in placements {
            resolved.push(Placement {
                link: index_of(&link)?,
                policy,
            });
        }
        for (i, generator) in links.iter().enumerate() {
            let placed = resolved.iter().filter(|p| p.link == i).count();
            if i != reference && placed != 1 {
                return Err(GenError::MissingPlacement {
                    body: name.clone(),
                    link: generator.name().to_string(),
                });
            }
        }
        if resolved.iter().any(|p| p.link == reference) {
            return Err(GenError::Config {
                source_name: format!("body '{name}'"),
                message: "the reference link cannot have a placement".to_string(),
            });
        }

        template.check_slots(&format!("body '{name}'"), |slot| {
            slot == "name"
                || links.iter().any(|g| {
                    slot.strip_prefix(g.name())
                        .is_some_and(|rest| rest == "_link" || rest == "_name")
                })
        })?;

        Ok(Self {
            name,
            links,
            reference,
            placements: resolved,
            template,
        })
    }

    /// Build link generators for every spec in `spec`, choosing each
    /// link's mesh provider from its spec.
    pub fn from_spec(
        spec: BodySpec,
        link_template: &Template,
        toolchain: &ToolchainSettings,
        placements: Vec<(String, Box<dyn PlacementPolicy>)>,
    ) -> GenResult<Self> {
        let links = spec
            .links
            .into_iter()
            .map(|link| {
                let provider = provider_for(&link, toolchain)?;
                LinkGenerator::new(link, provider, link_template.clone())
            })
            .collect::<GenResult<Vec<_>>>()?;
        Self::new(spec.name, links, &spec.reference, placements, spec.template)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn links(&self) -> &[LinkGenerator] {
        &self.links
    }

    /// Generate and place every link; meshes land in `output_dir`.
    pub fn generate_links(&self, output_dir: &Path, rng: &mut dyn RngCore) -> GenResult<Vec<LinkRecord>> {
        let mut records = self
            .links
            .iter()
            .map(|g| g.generate(output_dir, rng))
            .collect::<GenResult<Vec<_>>>()?;

        let reference = records[self.reference].clone();
        for placement in &self.placements {
            let dependent = &mut records[placement.link];
            let t = placement.policy.place(&reference, dependent, rng);
            dependent.position = t.apply(&dependent.position);
            dependent.orientation = t.rotation;
            debug!(
                "placed '{}' at {:?} rpy {:?}",
                dependent.name, dependent.position, dependent.orientation
            );
        }
        Ok(records)
    }

    /// Render placed records into the body description text.
    pub fn render(&self, records: &[LinkRecord]) -> GenResult<String> {
        let mut bindings = Bindings::new();
        bindings.insert("name".to_string(), self.name.clone());
        for (generator, record) in self.links.iter().zip(records) {
            bindings.insert(format!("{}_link", generator.name()), generator.render(record)?);
            bindings.insert(format!("{}_name", generator.name()), record.name.clone());
        }
        self.template.render(&bindings)
    }

    /// Generate one body into `output_dir` and return the description path.
    pub fn generate(&self, output_dir: &Path, rng: &mut dyn RngCore) -> GenResult<PathBuf> {
        let records = self.generate_links(output_dir, rng)?;
        let text = self.render(&records)?;
        let path = output_dir.join(BODY_FILENAME);
        fs::write(&path, text).map_err(GenError::io(&path))?;
        Ok(path)
    }
}
