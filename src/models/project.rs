use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::MetadataError;

/// Prefix shared by every Tiny Tapeout user module name.
pub const USER_MODULE_PREFIX: &str = "tt_um_";

/// The authoring language declared in a project's `info.yaml`.
///
/// - `Wokwi`: designed in the Wokwi simulator, identified by a numeric id
/// - `Verilog`: HDL sources, identified by the top-level module name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Wokwi,
    Verilog,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wokwi => "wokwi",
            Self::Verilog => "verilog",
        }
    }

    /// Case-insensitive; `info.yaml` files usually spell these `Wokwi`/`Verilog`.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wokwi" => Some(Self::Wokwi),
            "verilog" => Some(Self::Verilog),
            _ => None,
        }
    }

    /// The `project` key that carries this language's naming source.
    pub fn naming_field(&self) -> &'static str {
        match self {
            Self::Wokwi => "wokwi_id",
            Self::Verilog => "top_module",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Wokwi project id. Accepts both `wokwi_id: 123` and `wokwi_id: "123"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WokwiId {
    Number(u64),
    Text(String),
}

impl WokwiId {
    fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Quoted ids must still be all digits.
    fn is_numeric(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(s) => s.trim().bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

impl fmt::Display for WokwiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// The `project` section of an `info.yaml` file.
///
/// Only `language` and the matching naming field drive any logic; `title` and
/// `author` are carried along for log output. Every other key in the section
/// is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub language: Option<String>,
    pub wokwi_id: Option<WokwiId>,
    pub top_module: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl ProjectInfo {
    /// Validate the declared language and its naming field.
    pub fn kind(&self) -> Result<ProjectKind, MetadataError> {
        let raw = self
            .language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(MetadataError::MissingLanguage)?;

        let language = Language::from_str(raw)
            .ok_or_else(|| MetadataError::UnsupportedLanguage(raw.to_string()))?;

        let missing = || MetadataError::MissingField {
            language,
            field: language.naming_field(),
        };
        let invalid = |value: &str| MetadataError::InvalidField {
            language,
            field: language.naming_field(),
            value: value.to_string(),
        };

        match language {
            Language::Wokwi => {
                let id = self
                    .wokwi_id
                    .as_ref()
                    .filter(|id| !id.is_blank())
                    .ok_or_else(missing)?;
                if !id.is_numeric() {
                    return Err(invalid(&id.to_string()));
                }
                Ok(ProjectKind::Wokwi { id: id.to_string() })
            }
            Language::Verilog => {
                let top_module = self
                    .top_module
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(missing)?;
                if top_module.trim() != top_module {
                    return Err(invalid(top_module));
                }
                Ok(ProjectKind::Verilog {
                    top_module: top_module.to_string(),
                })
            }
        }
    }
}

/// A validated project identity, ready to be turned into a directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKind {
    Wokwi { id: String },
    Verilog { top_module: String },
}

impl ProjectKind {
    pub fn language(&self) -> Language {
        match self {
            Self::Wokwi { .. } => Language::Wokwi,
            Self::Verilog { .. } => Language::Verilog,
        }
    }

    /// `tt_um_wokwi_{id}` for Wokwi designs, the top module for Verilog ones.
    pub fn directory_name(&self) -> String {
        match self {
            Self::Wokwi { id } => format!("{}wokwi_{}", USER_MODULE_PREFIX, id),
            Self::Verilog { top_module } => top_module.clone(),
        }
    }
}
