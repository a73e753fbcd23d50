//! Reading `info.yaml` and deriving a project's canonical name.
//!
//! Every Tiny Tapeout project carries an `info.yaml` at its root with a
//! `project` mapping. The name a project is stored under depends on how it
//! was authored:
//!
//! ```yaml
//! project:
//!   language: "Wokwi"       # -> tt_um_wokwi_<wokwi_id>
//!   wokwi_id: 339800239192932947
//! ```
//!
//! ```yaml
//! project:
//!   language: "Verilog"     # -> <top_module>
//!   top_module: "tt_um_example"
//! ```

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use thiserror::Error;

use crate::models::{Language, ProjectInfo, ProjectKind};

/// File name of the project metadata document.
pub const INFO_YAML: &str = "info.yaml";

/// Errors reading or validating project metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("info.yaml not found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error reading info.yaml: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error parsing YAML file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("project section not found in info.yaml")]
    MissingProjectSection,

    #[error("project language is missing or empty in info.yaml")]
    MissingLanguage,

    #[error("Unsupported project language '{0}'. Supported languages: wokwi, verilog")]
    UnsupportedLanguage(String),

    #[error("{field} not found in info.yaml for {language} project")]
    MissingField {
        language: Language,
        field: &'static str,
    },

    #[error("invalid {field} '{value}' in info.yaml for {language} project")]
    InvalidField {
        language: Language,
        field: &'static str,
        value: String,
    },
}

/// Parse the text of an `info.yaml` document.
///
/// Only structural problems are reported here; use [`ProjectInfo::kind`] to
/// validate the language and naming field.
pub fn parse_info_yaml(text: &str) -> Result<ProjectInfo, MetadataError> {
    let doc: Value = serde_yaml::from_str(text)?;
    let project = doc
        .get("project")
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or(MetadataError::MissingProjectSection)?;
    Ok(serde_yaml::from_value(project)?)
}

/// Read `<dir>/info.yaml`.
pub fn read_info_yaml(dir: &Path) -> Result<ProjectInfo, MetadataError> {
    let path = dir.join(INFO_YAML);
    if !path.is_file() {
        return Err(MetadataError::NotFound(dir.to_path_buf()));
    }
    let text = std::fs::read_to_string(&path)?;
    let info = parse_info_yaml(&text)?;
    tracing::debug!(
        "Read {} (title: {:?}, author: {:?})",
        path.display(),
        info.title,
        info.author
    );
    Ok(info)
}

/// Read and validate `<dir>/info.yaml`, returning the derived project name.
pub fn derive_project_name(dir: &Path) -> Result<(ProjectInfo, ProjectKind), MetadataError> {
    let info = read_info_yaml(dir)?;
    let kind = info.kind()?;
    match &kind {
        ProjectKind::Wokwi { id } => {
            tracing::info!("Found wokwi project with wokwi_id: {}", id)
        }
        ProjectKind::Verilog { top_module } => {
            tracing::info!("Found verilog project with top_module: {}", top_module)
        }
    }
    Ok((info, kind))
}

const SAMPLE_WOKWI: &str = r#"
project:
  wokwi_id: 123456789
  title: "Test Wokwi Project"
  author: "Test Author"
  language: "Wokwi"
"#;

const SAMPLE_VERILOG: &str = r#"
project:
  top_module: "tt_um_test_verilog"
  title: "Test Verilog Project"
  author: "Test Author"
  language: "Verilog"
"#;

/// One fixed sample checked by [`self_test`].
#[derive(Debug)]
pub struct SampleCheck {
    pub language: Language,
    pub expected: &'static str,
    pub result: Result<String, MetadataError>,
}

impl SampleCheck {
    pub fn passed(&self) -> bool {
        matches!(&self.result, Ok(name) if name == self.expected)
    }
}

/// Parse the built-in Wokwi and Verilog samples and check their names.
///
/// Touches neither the network nor the filesystem.
pub fn self_test() -> Vec<SampleCheck> {
    [
        (Language::Wokwi, SAMPLE_WOKWI, "tt_um_wokwi_123456789"),
        (Language::Verilog, SAMPLE_VERILOG, "tt_um_test_verilog"),
    ]
    .into_iter()
    .map(|(language, text, expected)| SampleCheck {
        language,
        expected,
        result: parse_info_yaml(text)
            .and_then(|info| info.kind())
            .map(|kind| kind.directory_name()),
    })
    .collect()
}
