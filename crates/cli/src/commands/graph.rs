use anyhow::Result;
use colored::*;
use torte_core::manager::PipelineManager;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    println!("{}", "Task Dependency Graph:".bold().underline());

    let view = manager.dependency_graph();
    if view.tasks.is_empty() {
        println!("No tasks found");
        return Ok(());
    }

    if !view.cycles.is_empty() {
        let cycles_description = view
            .cycles
            .iter()
            .map(|cycle| {
                let mut path = cycle.clone();
                if let Some(first) = path.first().cloned() {
                    path.push(first);
                }
                path.join(" -> ")
            })
            .collect::<Vec<_>>()
            .join("; ");

        println!(
            "{} {}",
            "Warning:".yellow().bold(),
            format!("Circular dependencies detected: {}", cycles_description).yellow()
        );
    }

    for task in &view.tasks {
        println!("{}", task.name.blue().bold());

        if !task.dependencies.is_empty() {
            println!(
                "  {} {}",
                "depends on:".dimmed(),
                task.dependencies.join(", ")
            );
        } else {
            println!("  {}", "no dependencies".dimmed());
        }
        println!();
    }

    Ok(())
}
