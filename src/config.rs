//! Configuration loader: body catalog and templates.
//!
//! The catalog (`config/bodies.toml`) and the URDF templates (`templates/`)
//! are compiled in; both can be replaced at run time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::body::{Axis, FixedPlacement, Flip, PlacementPolicy, ReferenceEndPlacement};
use crate::error::{GenError, GenResult};
use crate::link::LinkSpec;
use crate::template::Template;
use crate::transform::Transform;

/// Environment variable naming an alternative catalog file.
pub const CONFIG_ENV: &str = "BODYGEN_CONFIG";

const EMBEDDED_CATALOG: &str = include_str!("../config/bodies.toml");

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("link.urdf", include_str!("../templates/link.urdf")),
    ("hammer.urdf", include_str!("../templates/hammer.urdf")),
    ("t_shape.urdf", include_str!("../templates/t_shape.urdf")),
];

fn default_body_name() -> String {
    "body".to_string()
}

fn default_link_template() -> String {
    "link.urdf".to_string()
}

/// One body kind from the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyConfig {
    /// Name written into the body description.
    #[serde(default = "default_body_name")]
    pub name: String,
    /// Body-level template file.
    pub template: String,
    /// Link-level template file.
    #[serde(default = "default_link_template")]
    pub link_template: String,
    /// Link every other link is placed relative to.
    pub reference: String,
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub placements: Vec<PlacementConfig>,
}

/// Placement of one dependent link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlacementConfig {
    pub link: String,
    #[serde(flatten)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub flip: Option<FlipConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Constant rotation and translation.
    Fixed {
        rotation: [f64; 3],
        translation: [f64; 3],
    },
    /// Offset by `factor` times the reference link's z extent.
    ReferenceEnd { rotation: [f64; 3], factor: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
}

/// Optional half-turn flip; off unless configured.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlipConfig {
    pub axis: AxisName,
    pub probability: f64,
}

impl PlacementConfig {
    /// Build the placement policy this entry describes.
    pub fn policy(&self) -> GenResult<Box<dyn PlacementPolicy>> {
        let base: Box<dyn PlacementPolicy> = match &self.policy {
            PolicyConfig::Fixed { rotation, translation } => Box::new(FixedPlacement(Transform::new(
                (*rotation).into(),
                (*translation).into(),
            ))),
            PolicyConfig::ReferenceEnd { rotation, factor } => Box::new(ReferenceEndPlacement {
                rotation: (*rotation).into(),
                factor: *factor,
            }),
        };
        let Some(flip) = &self.flip else {
            return Ok(base);
        };
        if !(0.0..=1.0).contains(&flip.probability) {
            return Err(GenError::Config {
                source_name: format!("placement of '{}'", self.link),
                message: format!("flip probability {} outside [0, 1]", flip.probability),
            });
        }
        let axis = match flip.axis {
            AxisName::X => Axis::X,
            AxisName::Y => Axis::Y,
            AxisName::Z => Axis::Z,
        };
        Ok(Box::new(Flip {
            inner: base,
            axis,
            probability: flip.probability,
        }))
    }
}

/// All configured body kinds, keyed by kind name.
#[derive(Debug, Clone)]
pub struct Catalog {
    bodies: BTreeMap<String, BodyConfig>,
}

impl Catalog {
    /// Parse catalog text; `source_name` is used in error messages.
    pub fn parse(text: &str, source_name: &str) -> GenResult<Self> {
        let bodies = toml::from_str(text).map_err(|e| GenError::Config {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { bodies })
    }

    /// The compiled-in catalog.
    pub fn embedded() -> GenResult<Self> {
        Self::parse(EMBEDDED_CATALOG, "embedded bodies.toml")
    }

    /// Read a catalog file.
    pub fn from_file(path: &Path) -> GenResult<Self> {
        let text = std::fs::read_to_string(path).map_err(GenError::io(path))?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Body configuration for `kind`.
    pub fn body(&self, kind: &str) -> GenResult<&BodyConfig> {
        self.bodies
            .get(kind)
            .ok_or_else(|| GenError::UnknownBodyKind(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.bodies.keys().map(String::as_str)
    }
}

/// Resolve which catalog file to use.
///
/// Tries in order:
/// 1. the explicitly given path
/// 2. the `BODYGEN_CONFIG` environment variable
///
/// `None` means the embedded catalog.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = explicit {
        return Some(p.to_path_buf());
    }
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}

/// Load the catalog from the resolved location.
pub fn load_catalog(explicit: Option<&Path>) -> GenResult<Catalog> {
    match resolve_config_path(explicit) {
        Some(path) => Catalog::from_file(&path),
        None => Catalog::embedded(),
    }
}

/// Where templates are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// Compiled-in templates.
    #[default]
    Embedded,
    /// Files in a directory.
    Directory(PathBuf),
    /// In-memory templates, keyed by file name.
    Inline(BTreeMap<String, String>),
}

impl TemplateSource {
    /// Load and parse the template named `name`.
    pub fn load(&self, name: &str) -> GenResult<Template> {
        let missing = || GenError::Config {
            source_name: "templates".to_string(),
            message: format!("no template named '{name}'"),
        };
        match self {
            Self::Embedded => EMBEDDED_TEMPLATES
                .iter()
                .find(|(n, _)| *n == name)
                .ok_or_else(missing)
                .and_then(|(_, text)| Template::parse(text)),
            Self::Directory(dir) => {
                let path = dir.join(name);
                let text = std::fs::read_to_string(&path).map_err(GenError::io(&path))?;
                Template::parse(&text)
            }
            Self::Inline(map) => map.get(name).ok_or_else(missing).and_then(|t| Template::parse(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn embedded_catalog_parses() {
        let catalog = Catalog::embedded().unwrap();
        let kinds: Vec<_> = catalog.kinds().collect();
        assert_eq!(kinds, ["hammer", "t_shape"]);

        let hammer = catalog.body("hammer").unwrap();
        assert_eq!(hammer.name, "body");
        assert_eq!(hammer.reference, "handle");
        let names: Vec<_> = hammer.links.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["handle", "head"]);
        assert_eq!(hammer.links[0].mass.lo(), 0.5);
        assert_eq!(hammer.links[0].mass.hi(), 1.0);
        assert_eq!(
            hammer.placements[0].policy,
            PolicyConfig::Fixed {
                rotation: [FRAC_PI_2, 0.0, 0.0],
                translation: [0.0, 0.0, 0.5],
            }
        );
    }

    #[test]
    fn unknown_kind_is_config_error() {
        let err = Catalog::embedded().unwrap().body("anvil").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn inverted_range_in_file_rejected() {
        let text = r#"
[broken]
template = "hammer.urdf"
reference = "a"

[[broken.links]]
name = "a"
mass = [1.0, 0.5]
lateral_friction = [0.2, 1.0]
spinning_friction = [0.2, 1.0]
inertia_scaling = [0.2, 1.0]
extent = [[0.1, 0.1], [0.1, 0.1], [1.0, 1.0]]
"#;
        let err = Catalog::parse(text, "test.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("test.toml"));
    }

    #[test]
    fn catalog_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodies.toml");
        std::fs::write(&path, EMBEDDED_CATALOG).unwrap();
        assert_eq!(resolve_config_path(Some(&path)), Some(path.clone()));
        let catalog = load_catalog(Some(&path)).unwrap();
        assert!(catalog.body("t_shape").is_ok());

        let err = load_catalog(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    // the only test touching BODYGEN_CONFIG, so nothing races on it
    #[test]
    fn explicit_path_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let from_env = dir.path().join("env.toml");
        let explicit = dir.path().join("explicit.toml");

        std::env::set_var(CONFIG_ENV, &from_env);
        assert_eq!(resolve_config_path(None), Some(from_env));
        assert_eq!(resolve_config_path(Some(&explicit)), Some(explicit));

        std::env::remove_var(CONFIG_ENV);
        assert_eq!(resolve_config_path(None), None);
    }

    #[test]
    fn flip_probability_validated() {
        let placement = PlacementConfig {
            link: "head".to_string(),
            policy: PolicyConfig::ReferenceEnd {
                rotation: [0.0; 3],
                factor: 0.5,
            },
            flip: Some(FlipConfig {
                axis: AxisName::Z,
                probability: 1.5,
            }),
        };
        assert!(placement.policy().is_err());
    }

    #[test]
    fn flip_parses_from_toml() {
        let p: PlacementConfig = toml::from_str(
            "link = \"head\"\npolicy = \"fixed\"\nrotation = [0.0, 0.0, 0.0]\ntranslation = [0.0, 0.0, 1.0]\nflip = { axis = \"y\", probability = 0.25 }\n",
        )
        .unwrap();
        assert_eq!(
            p.flip,
            Some(FlipConfig {
                axis: AxisName::Y,
                probability: 0.25
            })
        );
        assert!(p.policy().is_ok());
    }

    #[test]
    fn template_sources() {
        for (name, _) in EMBEDDED_TEMPLATES {
            TemplateSource::Embedded.load(name).unwrap();
        }
        assert!(TemplateSource::Embedded.load("anvil.urdf").is_err());

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mine.urdf"), "<robot name=\"{name}\"/>").unwrap();
        let t = TemplateSource::Directory(dir.path().to_path_buf()).load("mine.urdf").unwrap();
        assert!(t.slots().contains("name"));

        let inline = TemplateSource::Inline(BTreeMap::from([("x".to_string(), "{name}".to_string())]));
        assert!(inline.load("x").is_ok());
        assert!(inline.load("y").is_err());
    }
}
