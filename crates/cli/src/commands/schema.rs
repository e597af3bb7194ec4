use anyhow::Result;
use torte_core::manager::PipelineManager;

pub fn execute() -> Result<()> {
    let schema = PipelineManager::config_schema()
        .map_err(|e| anyhow::anyhow!("Failed to generate schema: {}", e))?;
    println!("{}", schema);
    Ok(())
}
