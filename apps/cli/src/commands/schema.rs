use anyhow::Result;
use clap::Parser;
use schemars::schema_for;

use berth::domain::manifest::BuildDescriptor;

/// Prints the JSON Schema of the build descriptor.
#[derive(Parser, Debug, Clone)]
pub struct SchemaCommand {}

impl SchemaCommand {
    pub async fn execute(self) -> Result<()> {
        let schema = schema_for!(BuildDescriptor);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
