use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DONT_WRITE_BYTECODE_VAR: &str = "PYTHONDONTWRITEBYTECODE";
pub const UNBUFFERED_VAR: &str = "PYTHONUNBUFFERED";

/// Interpreter behaviour flags. Both are on unless explicitly disabled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RuntimeFlags {
    /// Do not persist compiled bytecode next to the sources.
    #[serde(default = "default_true")]
    pub disable_bytecode_cache: bool,

    /// Unbuffered stdout/stderr so a supervisor sees log lines immediately.
    #[serde(default = "default_true")]
    pub force_unbuffered_output: bool,
}

impl RuntimeFlags {
    /// Environment variables for the enabled flags, in a fixed order.
    pub fn env_vars(&self) -> Vec<(&'static str, &'static str)> {
        let mut vars = Vec::with_capacity(2);
        if self.disable_bytecode_cache {
            vars.push((DONT_WRITE_BYTECODE_VAR, "1"));
        }
        if self.force_unbuffered_output {
            vars.push((UNBUFFERED_VAR, "1"));
        }
        vars
    }
}

impl Default for RuntimeFlags {
    fn default() -> Self {
        Self {
            disable_bytecode_cache: true,
            force_unbuffered_output: true,
        }
    }
}

fn default_true() -> bool {
    true
}
