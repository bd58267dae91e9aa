//! Enumerated body kinds and their assembly from the catalog.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::body::{BodyComposer, BodySpec};
use crate::config::{BodyConfig, Catalog, TemplateSource};
use crate::error::{GenError, GenResult};
use crate::mesh::ToolchainSettings;

/// The body kinds the generator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Handle plus a head across its top.
    Hammer,
    /// Stem plus a bar laid across its end.
    TShape,
}

impl BodyKind {
    pub const ALL: [BodyKind; 2] = [BodyKind::Hammer, BodyKind::TShape];

    /// Catalog key.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            BodyKind::Hammer => "hammer",
            BodyKind::TShape => "t_shape",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BodyKind {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hammer" => Ok(BodyKind::Hammer),
            "t_shape" | "t" => Ok(BodyKind::TShape),
            other => Err(GenError::UnknownBodyKind(other.to_string())),
        }
    }
}

/// Run-time choices shared by every link of a body.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Library meshes for every link; `None` generates meshes procedurally.
    pub mesh_pool: Option<Vec<PathBuf>>,
    pub toolchain: ToolchainSettings,
}

/// Build the composer for one catalog entry.
pub fn build_composer(
    config: &BodyConfig,
    templates: &TemplateSource,
    options: &GeneratorOptions,
) -> GenResult<BodyComposer> {
    let link_template = templates.load(&config.link_template)?;
    let spec = BodySpec {
        name: config.name.clone(),
        links: config
            .links
            .iter()
            .cloned()
            .map(|mut link| {
                if let Some(pool) = &options.mesh_pool {
                    link.mesh_pool = Some(pool.clone());
                }
                link
            })
            .collect(),
        reference: config.reference.clone(),
        template: templates.load(&config.template)?,
    };
    let placements = config
        .placements
        .iter()
        .map(|p| p.policy().map(|policy| (p.link.clone(), policy)))
        .collect::<GenResult<Vec<_>>>()?;
    BodyComposer::from_spec(spec, &link_template, &options.toolchain, placements)
}

/// Build the composer for `kind`.
pub fn composer_for(
    kind: BodyKind,
    catalog: &Catalog,
    templates: &TemplateSource,
    options: &GeneratorOptions,
) -> GenResult<BodyComposer> {
    build_composer(catalog.body(kind.key())?, templates, options)
}
