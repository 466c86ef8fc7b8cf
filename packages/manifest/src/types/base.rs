use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tags that move over time and therefore cannot pin a build.
const FLOATING_TAGS: &[&str] = &["latest", "stable", "edge"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaseParseError {
    #[error("base environment is empty")]
    Empty,
    #[error("base environment '{0}' has an empty name")]
    EmptyName(String),
    #[error("base environment '{0}' has an empty tag")]
    EmptyTag(String),
    #[error("base environment '{0}' contains whitespace")]
    Whitespace(String),
}

/// The starting runtime image, written `name:tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseEnvironment {
    pub name: String,
    pub tag: Option<String>,
}

impl BaseEnvironment {
    pub fn new(name: &str, tag: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.map(|t| t.to_string()),
        }
    }

    /// Runtime name without any registry or namespace prefix (`python`).
    pub fn runtime(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Runtime version: the tag up to its first `-` (`3.10` for `3.10-slim`).
    pub fn version(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .and_then(|t| t.split('-').next())
            .filter(|v| !v.is_empty())
    }

    /// Image variant: the tag after its first `-` (`slim` for `3.10-slim`).
    pub fn variant(&self) -> Option<&str> {
        self.tag
            .as_deref()
            .and_then(|t| t.split_once('-'))
            .map(|(_, variant)| variant)
    }

    /// True when the tag is missing or names a moving target.
    pub fn is_floating(&self) -> bool {
        match self.tag.as_deref() {
            None => true,
            Some(tag) => FLOATING_TAGS.contains(&tag.to_ascii_lowercase().as_str()),
        }
    }
}

impl FromStr for BaseEnvironment {
    type Err = BaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BaseParseError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(BaseParseError::Whitespace(s.to_string()));
        }

        // A ':' before the last '/' belongs to a registry host (`host:5000/python`).
        let last_segment_start = s.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match s[last_segment_start..].rfind(':') {
            Some(i) => {
                let split = last_segment_start + i;
                (&s[..split], Some(&s[split + 1..]))
            }
            None => (s, None),
        };

        if name.is_empty() || name.ends_with('/') {
            return Err(BaseParseError::EmptyName(s.to_string()));
        }
        if tag == Some("") {
            return Err(BaseParseError::EmptyTag(s.to_string()));
        }

        Ok(Self::new(name, tag))
    }
}

impl TryFrom<String> for BaseEnvironment {
    type Error = BaseParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BaseEnvironment> for String {
    fn from(base: BaseEnvironment) -> Self {
        base.to_string()
    }
}

impl fmt::Display for BaseEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.name, tag),
            None => write!(f, "{}", self.name),
        }
    }
}
