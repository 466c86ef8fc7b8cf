use anyhow::Result;
use clap::Parser;

use berth::domain::entities::{DescriptorValidator, ValidationLevel, ValidationResult};

use crate::core::error::CliError;
use crate::core::project::{Project, ProjectArgs};
use crate::ui::{self, diagnostic, Theme};

#[derive(Parser, Debug, Clone)]
pub struct CheckCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub async fn execute(self) -> Result<()> {
        let project = Project::load(&self.project)?;
        let result = validate(&project);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_issues(&project, &result);
            if !result.has_errors() {
                ui::success(format!(
                    "{} is valid {}",
                    project.display_name(),
                    Theme::muted(format!("({} note(s))", result.issues.len()))
                ));
            }
        }

        let errors = result.errors().count();
        if errors > 0 {
            return Err(CliError::InvalidDescriptor(errors).into());
        }
        Ok(())
    }
}

/// Descriptor rules plus the files it names in the source tree.
pub fn validate(project: &Project) -> ValidationResult {
    let mut result = DescriptorValidator::validate(&project.descriptor);
    let descriptor = &project.descriptor;

    if !descriptor.manifest.as_os_str().is_empty()
        && !descriptor.manifest.is_absolute()
        && !project.source_dir.join(&descriptor.manifest).is_file()
    {
        result.add_error(
            "manifest",
            format!(
                "Dependency manifest '{}' not found in {}",
                descriptor.manifest.display(),
                project.source_dir.display()
            ),
        );
    }

    if let Some(env_file) = &descriptor.env_file {
        if !project.source_dir.join(env_file).is_file() {
            result.add_error(
                "env-file",
                format!("Env file '{}' not found", env_file.display()),
            );
        }
    }

    result
}

pub fn print_issues(project: &Project, result: &ValidationResult) {
    let name = project.display_name();
    for issue in &result.issues {
        match issue.level {
            ValidationLevel::Info => ui::info(format!("{}: {}", issue.field, issue.message)),
            _ => diagnostic::report_issue(&name, &project.text, issue),
        }
    }
}
