use berth_manifest::BuildDescriptor;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("no berth.toml, berth.json, berth.yaml or berth.yml in {}", dir.display())]
    NotFound { dir: PathBuf },
    #[error("{}: expected a .toml, .json, .yaml or .yml descriptor", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {format} descriptor: {message}")]
    Syntax {
        format: DescriptorFormat,
        message: String,
    },
    #[error("cannot write descriptor as {format}: {message}")]
    Serialize {
        format: DescriptorFormat,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
    Toml,
}

impl DescriptorFormat {
    /// File names looked up in a project directory, highest priority first.
    pub const DISCOVERY: [(&'static str, DescriptorFormat); 4] = [
        ("berth.toml", DescriptorFormat::Toml),
        ("berth.json", DescriptorFormat::Json),
        ("berth.yaml", DescriptorFormat::Yaml),
        ("berth.yml", DescriptorFormat::Yaml),
    ];

    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(DescriptorError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl fmt::Display for DescriptorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        })
    }
}

/// A parsed descriptor with its location and the text it was parsed from.
/// The text is kept so diagnostics can point into it.
#[derive(Debug, Clone)]
pub struct LoadedDescriptor {
    pub path: PathBuf,
    pub format: DescriptorFormat,
    pub text: String,
    pub descriptor: BuildDescriptor,
}

pub struct DescriptorParser;

impl DescriptorParser {
    /// First descriptor in `dir` by [`DescriptorFormat::DISCOVERY`] order.
    pub fn locate(dir: &Path) -> Option<PathBuf> {
        DescriptorFormat::DISCOVERY
            .iter()
            .map(|(name, _)| dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn discover(dir: &Path) -> Result<LoadedDescriptor, DescriptorError> {
        let path = Self::locate(dir).ok_or_else(|| DescriptorError::NotFound {
            dir: dir.to_path_buf(),
        })?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<LoadedDescriptor, DescriptorError> {
        let format = DescriptorFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let descriptor = Self::parse(&text, format)?;

        Ok(LoadedDescriptor {
            path: path.to_path_buf(),
            format,
            text,
            descriptor,
        })
    }

    pub fn parse(content: &str, format: DescriptorFormat) -> Result<BuildDescriptor, DescriptorError> {
        let parsed = match format {
            DescriptorFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DescriptorFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DescriptorFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| DescriptorError::Syntax { format, message })
    }

    pub fn serialize(
        descriptor: &BuildDescriptor,
        format: DescriptorFormat,
    ) -> Result<String, DescriptorError> {
        let written = match format {
            DescriptorFormat::Json => {
                serde_json::to_string_pretty(descriptor).map_err(|e| e.to_string())
            }
            DescriptorFormat::Yaml => serde_yaml::to_string(descriptor).map_err(|e| e.to_string()),
            DescriptorFormat::Toml => {
                toml::to_string_pretty(descriptor).map_err(|e| e.to_string())
            }
        };
        written.map_err(|message| DescriptorError::Serialize { format, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_manifest::EntryCommand;

    #[test]
    fn test_parse_toml_complete() {
        let toml_str = r#"
base = "python:3.10-slim"
workdir = "/srv"
manifest = "requirements.txt"
expose = 8000
entrypoint = ["python", "manage.py", "runserver", "0.0.0.0:8000"]
system-packages = ["gcc", "libffi-dev"]

[runtime]
disable-bytecode-cache = true
force-unbuffered-output = false
        "#;

        let descriptor = DescriptorParser::parse(toml_str, DescriptorFormat::Toml).unwrap();

        assert_eq!(descriptor.base.to_string(), "python:3.10-slim");
        assert_eq!(descriptor.workdir, PathBuf::from("/srv"));
        assert_eq!(descriptor.system_packages, vec!["gcc", "libffi-dev"]);
        assert!(!descriptor.runtime.force_unbuffered_output);
        assert_eq!(descriptor.entrypoint, EntryCommand::default());
    }

    #[test]
    fn test_parse_json_minimal_uses_defaults() {
        let json = r#"{ "base": "python:3.12-slim" }"#;

        let descriptor = DescriptorParser::parse(json, DescriptorFormat::Json).unwrap();
        assert_eq!(descriptor.expose, 8000);
        assert_eq!(descriptor.workdir, PathBuf::from("/app"));
        assert_eq!(descriptor.system_packages.len(), 6);
    }

    #[test]
    fn test_parse_yaml_minimal() {
        let yaml = r#"
base: python:3.11-slim
expose: 9000
entrypoint: [gunicorn, app.wsgi, --bind, "0.0.0.0:9000"]
        "#;

        let descriptor = DescriptorParser::parse(yaml, DescriptorFormat::Yaml).unwrap();
        assert_eq!(descriptor.expose, 9000);
        assert_eq!(descriptor.checked_bind().unwrap().port, 9000);
    }

    #[test]
    fn test_invalid_base_rejected_at_parse() {
        let toml_str = r#"base = "python:""#;
        assert!(DescriptorParser::parse(toml_str, DescriptorFormat::Toml).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            DescriptorFormat::from_path(Path::new("berth.YML")).unwrap(),
            DescriptorFormat::Yaml
        );
        assert!(matches!(
            DescriptorFormat::from_path(Path::new("Dockerfile")),
            Err(DescriptorError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_syntax_error_names_format() {
        let err = DescriptorParser::parse("base = ", DescriptorFormat::Toml).unwrap_err();
        assert!(err.to_string().starts_with("invalid TOML descriptor:"));
    }

    #[test]
    fn test_load_keeps_source_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("berth.json");
        let text = r#"{ "base": "python:3.12-slim", "expose": 8000 }"#;
        std::fs::write(&path, text).unwrap();

        let loaded = DescriptorParser::discover(dir.path()).unwrap();
        assert_eq!(loaded.path, path);
        assert_eq!(loaded.format, DescriptorFormat::Json);
        assert_eq!(loaded.text, text);
        assert_eq!(loaded.descriptor.base.to_string(), "python:3.12-slim");
    }

    #[test]
    fn test_roundtrip_toml() {
        let descriptor = BuildDescriptor::default();

        let toml_str = DescriptorParser::serialize(&descriptor, DescriptorFormat::Toml).unwrap();
        let parsed = DescriptorParser::parse(&toml_str, DescriptorFormat::Toml).unwrap();

        assert_eq!(descriptor, parsed);
    }
}
