use berth_manifest::BuildDescriptor;
use schemars::schema_for;

fn main() -> anyhow::Result<()> {
    let schema = schema_for!(BuildDescriptor);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
