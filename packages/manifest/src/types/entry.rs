use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("entry command is empty")]
    EmptyCommand,
    #[error("entry command has no `host:port` bind argument")]
    Missing,
    #[error("bind address '{0}' is not a wildcard address; external traffic cannot reach it")]
    NotWildcard(String),
    #[error("exposed port {exposed} does not match bind port {bound}")]
    PortMismatch { exposed: u16, bound: u16 },
}

/// A `host:port` argument found in the entry command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindAddress {
    pub host: String,
    pub port: u16,
}

impl BindAddress {
    /// Parse `0.0.0.0:8000`, `[::]:8000` or `localhost:8000`.
    pub fn parse(arg: &str) -> Option<Self> {
        let (host, port) = arg.rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;

        let valid_host = if let Some(inner) = host.strip_prefix('[') {
            inner.ends_with(']') && inner.len() > 1
        } else {
            !host.is_empty()
                && host
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        };

        valid_host.then(|| Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.host.as_str(), "0.0.0.0" | "::" | "[::]")
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Argument vector that starts the served process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(transparent)]
pub struct EntryCommand(pub Vec<String>);

impl EntryCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last argument that looks like `host:port`.
    pub fn bind_address(&self) -> Result<BindAddress, BindError> {
        if self.0.is_empty() {
            return Err(BindError::EmptyCommand);
        }
        self.args()
            .iter()
            .rev()
            .find_map(|arg| BindAddress::parse(arg))
            .ok_or(BindError::Missing)
    }
}

impl Default for EntryCommand {
    fn default() -> Self {
        Self::new(["python", "manage.py", "runserver", "0.0.0.0:8000"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bind_address_forms() {
        assert_eq!(
            BindAddress::parse("0.0.0.0:8000"),
            Some(BindAddress {
                host: "0.0.0.0".into(),
                port: 8000
            })
        );
        assert!(BindAddress::parse("[::]:8080").unwrap().is_wildcard());
        assert!(!BindAddress::parse("localhost:8000").unwrap().is_wildcard());
    }

    #[test]
    fn test_non_bind_arguments_ignored() {
        assert_eq!(BindAddress::parse("manage.py"), None);
        assert_eq!(BindAddress::parse("http://example.com"), None);
        assert_eq!(BindAddress::parse(":8000"), None);
        assert_eq!(BindAddress::parse("0.0.0.0:99999"), None);
    }

    #[test]
    fn test_missing_bind_argument() {
        let cmd = EntryCommand::new(["python", "manage.py", "runserver"]);
        assert_eq!(cmd.bind_address(), Err(BindError::Missing));
        assert_eq!(EntryCommand::new(Vec::<String>::new()).bind_address(), Err(BindError::EmptyCommand));
    }

    #[test]
    fn test_program_and_args() {
        let cmd = EntryCommand::default();
        assert_eq!(cmd.program(), Some("python"));
        assert_eq!(cmd.args().len(), 3);
    }
}
