use std::process::Command;

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `cmd` to completion, capturing both streams.
pub fn run(cmd: &mut Command) -> std::io::Result<CommandOutput> {
    tracing::debug!(command = ?cmd, "running");
    let output = cmd.output()?;
    let result = CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    tracing::debug!(code = ?result.code, "finished");
    Ok(result)
}

/// Last `n` non-empty lines of `text`, for error messages.
pub fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_skips_blank_lines() {
        let text = "one\n\ntwo\nthree\n\n";
        assert_eq!(tail(text, 2), "two\nthree");
        assert_eq!(tail(text, 10), "one\ntwo\nthree");
        assert_eq!(tail("", 3), "");
    }
}
