//! Link specs, sampled link records, and the link generator.

use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::{Point3, Vector3};
use rand::RngCore;
use serde::Deserialize;

use crate::error::GenResult;
use crate::mesh::{ExtentMode, MeshProvider};
use crate::sampler::{Range, Range3};
use crate::template::{Bindings, Template};

/// Every slot a link template may use.
pub const LINK_SLOTS: &[&str] = &[
    "name",
    "mass",
    "lateral_friction",
    "spinning_friction",
    "inertia_scaling",
    "x",
    "y",
    "z",
    "roll",
    "pitch",
    "yaw",
    "scale_x",
    "scale_y",
    "scale_z",
    "size_x",
    "size_y",
    "size_z",
    "filename",
];

fn default_solid() -> String {
    "cube".to_string()
}

/// Sampling ranges and mesh source for one link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkSpec {
    pub name: String,
    pub mass: Range,
    pub lateral_friction: Range,
    pub spinning_friction: Range,
    pub inertia_scaling: Range,
    /// Per-axis scale (library meshes) or size (procedural solids).
    pub extent: Range3,
    /// Solid kind for procedural meshes.
    #[serde(default = "default_solid")]
    pub solid: String,
    /// Candidate meshes; present only for the library variant.
    #[serde(default)]
    pub mesh_pool: Option<Vec<PathBuf>>,
}

/// One generated link instance.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub name: String,
    pub mass: f64,
    pub lateral_friction: f64,
    pub spinning_friction: f64,
    pub inertia_scaling: f64,
    pub position: Point3<f64>,
    /// Roll, pitch, yaw.
    pub orientation: Vector3<f64>,
    pub scale: Vector3<f64>,
    /// Solid dimensions; only procedurally generated links have them.
    pub size: Option<Vector3<f64>>,
    /// Filled in by the mesh provider.
    pub mesh: Option<PathBuf>,
}

impl LinkRecord {
    /// Sampled extent: the size when present, the scale otherwise.
    #[must_use]
    pub fn extent(&self) -> Vector3<f64> {
        self.size.unwrap_or(self.scale)
    }

    /// Template bindings for every field that has a value.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        let mut b = Bindings::new();
        let mut put = |k: &str, v: f64| {
            b.insert(k.to_string(), v.to_string());
        };
        put("mass", self.mass);
        put("lateral_friction", self.lateral_friction);
        put("spinning_friction", self.spinning_friction);
        put("inertia_scaling", self.inertia_scaling);
        put("x", self.position.x);
        put("y", self.position.y);
        put("z", self.position.z);
        put("roll", self.orientation.x);
        put("pitch", self.orientation.y);
        put("yaw", self.orientation.z);
        put("scale_x", self.scale.x);
        put("scale_y", self.scale.y);
        put("scale_z", self.scale.z);
        if let Some(size) = &self.size {
            put("size_x", size.x);
            put("size_y", size.y);
            put("size_z", size.z);
        }
        b.insert("name".to_string(), self.name.clone());
        // relative to the body directory
        if let Some(file) = self.mesh.as_deref().and_then(Path::file_name) {
            b.insert("filename".to_string(), file.to_string_lossy().into_owned());
        }
        b
    }
}

/// Samples link attributes and obtains the link's mesh.
pub struct LinkGenerator {
    spec: LinkSpec,
    provider: Box<dyn MeshProvider>,
    template: Template,
}

impl LinkGenerator {
    /// Fails if the template uses a slot no link record provides.
    pub fn new(spec: LinkSpec, provider: Box<dyn MeshProvider>, template: Template) -> GenResult<Self> {
        template.check_slots(&format!("link '{}'", spec.name), |slot| LINK_SLOTS.contains(&slot))?;
        Ok(Self {
            spec,
            provider,
            template,
        })
    }

    #[must_use]
    pub fn spec(&self) -> &LinkSpec {
        &self.spec
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Sample a record and fetch its mesh into `output_dir`.
    ///
    /// The pose is left at the origin with zero orientation; placement is
    /// the body composer's job.
    pub fn generate(&self, output_dir: &Path, rng: &mut dyn RngCore) -> GenResult<LinkRecord> {
        let spec = &self.spec;
        let mass = spec.mass.sample(rng);
        let lateral_friction = spec.lateral_friction.sample(rng);
        let spinning_friction = spec.spinning_friction.sample(rng);
        let inertia_scaling = spec.inertia_scaling.sample(rng);
        let extent = spec.extent.sample(rng);

        let (scale, size) = match self.provider.extent_mode() {
            ExtentMode::Scale => (extent, None),
            ExtentMode::Size => (Vector3::repeat(1.0), Some(extent)),
        };

        let mut record = LinkRecord {
            name: spec.name.clone(),
            mass,
            lateral_friction,
            spinning_friction,
            inertia_scaling,
            position: Point3::origin(),
            orientation: Vector3::zeros(),
            scale,
            size,
            mesh: None,
        };
        record.mesh = Some(self.provider.generate(&record, output_dir, rng)?);
        debug!("generated link '{}' (mass {:.3})", record.name, record.mass);
        Ok(record)
    }

    /// Render the link fragment.
    pub fn render(&self, record: &LinkRecord) -> GenResult<String> {
        self.template.render(&record.bindings())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::mesh::LibraryMesh;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    use std::fs;

    pub(crate) fn spec_named(name: &str) -> LinkSpec {
        LinkSpec {
            name: name.to_string(),
            mass: Range::new("mass", 0.5, 1.0).unwrap(),
            lateral_friction: Range::new("lateral_friction", 0.2, 1.0).unwrap(),
            spinning_friction: Range::new("spinning_friction", 0.2, 1.0).unwrap(),
            inertia_scaling: Range::new("inertia_scaling", 0.2, 1.0).unwrap(),
            extent: Range3::new(
                Range::constant(0.1),
                Range::constant(0.1),
                Range::new("z", 0.8, 1.2).unwrap(),
            ),
            solid: default_solid(),
            mesh_pool: None,
        }
    }

    pub(crate) fn record_named(name: &str) -> LinkRecord {
        LinkRecord {
            name: name.to_string(),
            mass: 0.75,
            lateral_friction: 0.5,
            spinning_friction: 0.5,
            inertia_scaling: 0.5,
            position: Point3::origin(),
            orientation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
            size: None,
            mesh: None,
        }
    }

    /// Shell scripts standing in for `openscad` and `meshconv`.
    #[cfg(unix)]
    pub(crate) fn fake_toolchain(dir: &Path) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let write = |name: &str, body: &str| {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        // openscad -o <stl> <scad>
        let openscad = write("openscad", r#"cp "$3" "$2""#);
        // meshconv -c obj -tri -o <stem> <stl>
        let meshconv = write("meshconv", r#"cp "$6" "$5.obj""#);
        (openscad, meshconv)
    }

    pub(crate) const TEST_LINK_TEMPLATE: &str = concat!(
        r#"<link name="{name}"><mass value="{mass}"/>"#,
        r#"<origin rpy="{roll} {pitch} {yaw}" xyz="{x} {y} {z}"/>"#,
        r#"<mesh filename="{filename}" scale="{scale_x} {scale_y} {scale_z}"/>"#,
        r#"<contact lateral="{lateral_friction}" spinning="{spinning_friction}" inertia="{inertia_scaling}"/></link>"#,
    );

    pub(crate) fn library_generator(name: &str, pool: Vec<PathBuf>) -> LinkGenerator {
        let provider = LibraryMesh::new(name, pool).unwrap();
        LinkGenerator::new(
            spec_named(name),
            Box::new(provider),
            Template::parse(TEST_LINK_TEMPLATE).unwrap(),
        )
        .unwrap()
    }

    pub(crate) fn write_pool(dir: &Path) -> Vec<PathBuf> {
        ["a", "b", "c"]
            .iter()
            .map(|n| {
                let p = dir.join(format!("{n}.obj"));
                fs::write(&p, format!("o {n}\n")).unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn generate_within_ranges_at_origin() {
        let pool_dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator = library_generator("handle", write_pool(pool_dir.path()));
        let spec = generator.spec().clone();
        let mut rng = Xoshiro256StarStar::seed_from_u64(5);

        for _ in 0..200 {
            let r = generator.generate(out.path(), &mut rng).unwrap();
            assert!(spec.mass.contains(r.mass));
            assert!(spec.lateral_friction.contains(r.lateral_friction));
            assert!(spec.spinning_friction.contains(r.spinning_friction));
            assert!(spec.inertia_scaling.contains(r.inertia_scaling));
            assert!(spec.extent.contains(&r.scale));
            assert_eq!(r.size, None);
            assert_eq!(r.position, Point3::origin());
            assert_eq!(r.orientation, Vector3::zeros());
            let mesh = r.mesh.as_ref().unwrap();
            assert!(mesh.starts_with(out.path()));
            assert!(mesh.is_file());
        }
    }

    #[test]
    fn render_fills_every_field() {
        let pool_dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator = library_generator("head", write_pool(pool_dir.path()));
        let mut rng = Xoshiro256StarStar::seed_from_u64(9);
        let record = generator.generate(out.path(), &mut rng).unwrap();

        let text = generator.render(&record).unwrap();
        assert!(text.contains(r#"<link name="head">"#));
        assert!(text.contains(r#"filename="head.obj""#));
        assert!(text.contains(&format!(r#"<mass value="{}"/>"#, record.mass)));
        assert!(text.contains(r#"xyz="0 0 0""#));
        assert!(!text.contains('{'));
    }

    #[test]
    fn size_slot_unbound_for_library_mesh() {
        let pool_dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let provider = LibraryMesh::new("head", write_pool(pool_dir.path())).unwrap();
        let generator = LinkGenerator::new(
            spec_named("head"),
            Box::new(provider),
            Template::parse("{name} {size_x}").unwrap(),
        )
        .unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(1);
        let record = generator.generate(out.path(), &mut rng).unwrap();
        let err = generator.render(&record).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateBinding);
    }

    #[test]
    fn unknown_slot_rejected_at_construction() {
        let provider = LibraryMesh::new("head", vec![PathBuf::from("a.obj")]).unwrap();
        let err = LinkGenerator::new(
            spec_named("head"),
            Box::new(provider),
            Template::parse("{name} {colour}").unwrap(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::TemplateBinding);
    }

    #[test]
    fn missing_mesh_leaves_filename_unbound() {
        let record = record_named("head");
        let t = Template::parse("{filename}").unwrap();
        assert!(t.render(&record.bindings()).is_err());
    }

    #[test]
    fn seeded_generation_reproducible() {
        let pool_dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let generator = library_generator("head", write_pool(pool_dir.path()));
        let a = generator
            .generate(out.path(), &mut Xoshiro256StarStar::seed_from_u64(77))
            .unwrap();
        let b = generator
            .generate(out.path(), &mut Xoshiro256StarStar::seed_from_u64(77))
            .unwrap();
        assert_eq!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn procedural_link_has_size_and_unit_scale() {
        use crate::mesh::ProceduralMesh;
        use crate::solids::SolidKind;
        use crate::toolchain::{MeshConverter, OpenScad};

        let tools = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let (openscad, meshconv) = fake_toolchain(tools.path());
        let provider = ProceduralMesh::new(
            SolidKind::cube(),
            Box::new(OpenScad::new(openscad)),
            MeshConverter::with_program(meshconv),
        );
        let generator = LinkGenerator::new(
            spec_named("handle"),
            Box::new(provider),
            Template::parse("{name} {size_x} {size_y} {size_z} {scale_x} {filename}").unwrap(),
        )
        .unwrap();
        let mut rng = Xoshiro256StarStar::seed_from_u64(2);
        let record = generator.generate(out.path(), &mut rng).unwrap();

        assert_eq!(record.scale, Vector3::repeat(1.0));
        let size = record.size.unwrap();
        assert!(generator.spec().extent.contains(&size));
        assert!(out.path().join("handle.obj").is_file());
        let text = generator.render(&record).unwrap();
        assert!(text.starts_with("handle 0.1 0.1 "));
        assert!(text.ends_with(" 1 handle.obj"));
    }
}
