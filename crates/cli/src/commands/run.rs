use anyhow::Result;
use colored::*;
use torte_core::manager::PipelineManager;
use torte_core::results::RunReport;
use torte_core::task::Outcome;
use torte_core::SystemEnvironment;

pub fn execute(manager: &PipelineManager, target: Option<&str>) -> Result<()> {
    let shown = target.unwrap_or_else(|| manager.default_target());
    println!("{} {}", "Running target".bold(), shown.cyan());
    println!();

    let environment = SystemEnvironment::new(".");
    let report = manager
        .run_task(target, &environment)
        .map_err(|e| anyhow::anyhow!("Failed to run target: {}", e))?;

    print_summary(&report);

    report
        .into_result()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!();
    println!(
        "{} {}",
        "✓".green().bold(),
        "All tasks completed!".green().bold()
    );

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Task results".bold().underline());
    for task in &report.outcomes {
        let label = match task.outcome {
            Outcome::Succeeded => "succeeded".green(),
            Outcome::Skipped => "skipped".yellow(),
            Outcome::Failed => "failed".red().bold(),
            Outcome::NotRun => "not run".dimmed(),
        };
        println!("  {} {}", format!("{:<24}", task.name).blue(), label);
    }

    if !report.handled_failures.is_empty() {
        println!();
        for failure in &report.handled_failures {
            println!(
                "{} {}",
                "Warning:".yellow().bold(),
                format!("task '{}' failed but was handled: {:#}", failure.task, failure.error)
                    .yellow()
            );
        }
    }
}
