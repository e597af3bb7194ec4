use anyhow::Result;
use colored::*;
use torte_core::manager::PipelineManager;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    let heading = match manager.name() {
        Some(name) => format!("Tasks ({})", name),
        None => "Tasks".to_string(),
    };
    println!("{}", heading.bold().underline());

    let view = manager.dependency_graph();
    if view.tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }

    let mut tasks: Vec<_> = view.tasks.iter().collect();
    tasks.sort_by(|a, b| a.name.cmp(&b.name));

    for task in tasks {
        match &task.description {
            Some(description) => {
                println!("{} {}", task.name.blue().bold(), description.dimmed());
            }
            None => println!("{}", task.name.blue().bold()),
        }
    }

    Ok(())
}
