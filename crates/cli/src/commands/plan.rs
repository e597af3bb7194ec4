use anyhow::Result;
use colored::*;
use torte_core::manager::PipelineManager;

pub fn execute(manager: &PipelineManager, target: &str) -> Result<()> {
    println!("{} {}", "Execution plan for".bold(), target.cyan());

    let plan = manager
        .plan(target)
        .map_err(|e| anyhow::anyhow!("Failed to resolve execution plan: {}", e))?;

    println!("\n{}:", "Execution order".bold());
    for (i, task) in plan.order.iter().enumerate() {
        println!("  {}. {}", i + 1, task);
    }

    Ok(())
}
