use berth_manifest::BaseEnvironment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A base environment bound to a concrete interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEnvironment {
    #[serde(with = "base_as_string")]
    pub base: BaseEnvironment,
    pub interpreter: PathBuf,
    /// Full version reported by the interpreter, e.g. `3.10.14`.
    pub version: String,
}

impl ResolvedEnvironment {
    pub fn new(base: BaseEnvironment, interpreter: impl Into<PathBuf>, version: &str) -> Self {
        Self {
            base,
            interpreter: interpreter.into(),
            version: version.to_string(),
        }
    }

    /// `3.10.14` satisfies a `3.10` pin; `3.1` does not match `3.10`.
    pub fn satisfies(pin: &str, version: &str) -> bool {
        let pin_parts: Vec<&str> = pin.split('.').collect();
        let version_parts: Vec<&str> = version.split('.').collect();
        pin_parts.len() <= version_parts.len()
            && pin_parts.iter().zip(&version_parts).all(|(p, v)| p == v)
    }
}

mod base_as_string {
    use berth_manifest::BaseEnvironment;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(base: &BaseEnvironment, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BaseEnvironment, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_pin_matching() {
        assert!(ResolvedEnvironment::satisfies("3.10", "3.10.14"));
        assert!(ResolvedEnvironment::satisfies("3.10.14", "3.10.14"));
        assert!(!ResolvedEnvironment::satisfies("3.10", "3.1.4"));
        assert!(!ResolvedEnvironment::satisfies("3.10", "3.11.2"));
        assert!(!ResolvedEnvironment::satisfies("3.10.1", "3.10"));
    }
}
