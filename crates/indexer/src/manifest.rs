use crate::error::{IndexerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-project files worth a textual look during semantic fallback
pub(crate) const PROJECT_DOC_FILES: &[&str] = &["README.rst", "README.md", "zephyr/module.yml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestProject {
    pub name: String,
    pub path: String,
    pub revision: Option<String>,
}

/// The `projects` sequence of a west-style workspace manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub projects: Vec<ManifestProject>,
}

#[derive(Deserialize)]
struct RawFile {
    manifest: Option<RawManifest>,
    projects: Option<Vec<RawProject>>,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    projects: Vec<RawProject>,
}

#[derive(Deserialize)]
struct RawProject {
    name: String,
    path: Option<String>,
    revision: Option<String>,
}

impl Manifest {
    pub fn parse(raw: &str) -> Result<Self> {
        let file: RawFile =
            serde_yaml::from_str(raw).map_err(|err| IndexerError::Manifest(err.to_string()))?;
        let projects = file
            .manifest
            .map(|m| m.projects)
            .or(file.projects)
            .unwrap_or_default()
            .into_iter()
            .map(|p| ManifestProject {
                path: p.path.unwrap_or_else(|| p.name.clone()),
                name: p.name,
                revision: p.revision,
            })
            .collect();
        Ok(Self { projects })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| IndexerError::Manifest(format!("{}: {err}", path.display())))?;
        Self::parse(&raw)
    }

    /// Workspace-relative documentation paths contributed by the listed projects
    pub fn doc_paths(&self) -> Vec<String> {
        self.projects
            .iter()
            .flat_map(|project| {
                let base = project.path.trim_end_matches('/').to_string();
                PROJECT_DOC_FILES
                    .iter()
                    .map(move |file| format!("{base}/{file}"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WEST: &str = r#"
manifest:
  remotes:
    - name: ncs
      url-base: https://github.com/nrfconnect
  projects:
    - name: zephyr
      repo-path: sdk-zephyr
      revision: v3.5.99-ncs1
    - name: mcuboot
      path: bootloader/mcuboot
  self:
    path: nrf
"#;

    #[test]
    fn parses_west_projects_with_default_paths() {
        let manifest = Manifest::parse(WEST).unwrap();
        assert_eq!(
            manifest.projects,
            vec![
                ManifestProject {
                    name: "zephyr".into(),
                    path: "zephyr".into(),
                    revision: Some("v3.5.99-ncs1".into()),
                },
                ManifestProject {
                    name: "mcuboot".into(),
                    path: "bootloader/mcuboot".into(),
                    revision: None,
                },
            ]
        );
        assert!(manifest
            .doc_paths()
            .contains(&"bootloader/mcuboot/README.md".to_string()));
    }

    #[test]
    fn rejects_invalid_yaml() {
        assert!(matches!(
            Manifest::parse("manifest: [unclosed"),
            Err(IndexerError::Manifest(_))
        ));
    }
}
