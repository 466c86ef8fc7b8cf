use crate::{BindError, BuildDescriptor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, JsonSchema, Serialize, Deserialize)]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, JsonSchema, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, JsonSchema, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.issues.push(ValidationIssue {
            level: ValidationLevel::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            level: ValidationLevel::Warning,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_info(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            level: ValidationLevel::Info,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.level == ValidationLevel::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.level == ValidationLevel::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.level == ValidationLevel::Error)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DescriptorValidator;

impl DescriptorValidator {
    pub fn validate(descriptor: &BuildDescriptor) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_base(descriptor, &mut result);
        Self::validate_runtime(descriptor, &mut result);
        Self::validate_paths(descriptor, &mut result);
        Self::validate_system_packages(descriptor, &mut result);
        Self::validate_network_contract(descriptor, &mut result);

        result
    }

    fn validate_base(descriptor: &BuildDescriptor, result: &mut ValidationResult) {
        let base = &descriptor.base;
        if base.is_floating() {
            result.add_error(
                "base",
                format!(
                    "Base environment '{}' is not pinned; use an exact version tag (e.g. '{}:3.10-slim')",
                    base,
                    base.name
                ),
            );
        } else if base.version().is_none() {
            result.add_error(
                "base",
                format!("Base environment '{}' has no runtime version in its tag", base),
            );
        }
    }

    fn validate_runtime(descriptor: &BuildDescriptor, result: &mut ValidationResult) {
        if !descriptor.runtime.force_unbuffered_output {
            result.add_warning(
                "runtime.force-unbuffered-output",
                "Buffered output delays log lines until the buffer flushes",
            );
        }
        if !descriptor.runtime.disable_bytecode_cache {
            result.add_info(
                "runtime.disable-bytecode-cache",
                "Bytecode files will be written into the working directory",
            );
        }
    }

    fn validate_paths(descriptor: &BuildDescriptor, result: &mut ValidationResult) {
        if !descriptor.workdir.is_absolute() {
            result.add_error(
                "workdir",
                format!(
                    "Working directory '{}' must be an absolute path",
                    descriptor.workdir.display()
                ),
            );
        }

        if descriptor.manifest.as_os_str().is_empty() {
            result.add_error("manifest", "Dependency manifest path is empty");
        } else if descriptor.manifest.is_absolute() {
            result.add_error(
                "manifest",
                "Dependency manifest must be relative to the source tree",
            );
        } else if descriptor
            .ignore
            .iter()
            .any(|name| descriptor.manifest.starts_with(name))
        {
            result.add_warning(
                "ignore",
                format!(
                    "'{}' is ignored by the source copy; it is still installed from the source tree",
                    descriptor.manifest.display()
                ),
            );
        }
    }

    fn validate_system_packages(descriptor: &BuildDescriptor, result: &mut ValidationResult) {
        let mut seen = HashSet::new();
        for (idx, package) in descriptor.system_packages.iter().enumerate() {
            let field = format!("system-packages[{}]", idx);
            if package.trim().is_empty() {
                result.add_error(field, "System package name is empty");
            } else if package.chars().any(char::is_whitespace) || package.starts_with('-') {
                result.add_error(
                    field,
                    format!("'{}' is not a valid package name", package),
                );
            } else if !seen.insert(package.as_str()) {
                result.add_error(field, format!("System package '{}' is listed twice", package));
            }
        }

        if descriptor.system_packages.is_empty() {
            result.add_info(
                "system-packages",
                "No native packages declared; dependencies with compiled extensions may fail to build",
            );
        }
    }

    fn validate_network_contract(descriptor: &BuildDescriptor, result: &mut ValidationResult) {
        if descriptor.expose == 0 {
            result.add_error("expose", "Exposed port must be between 1 and 65535");
            return;
        }

        match descriptor.checked_bind() {
            Ok(_) => {}
            Err(e @ BindError::PortMismatch { .. }) => result.add_error("expose", e.to_string()),
            Err(e) => result.add_error("entrypoint", e.to_string()),
        }
    }
}
