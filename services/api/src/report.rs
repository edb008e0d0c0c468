use clap::Args;
use project_insights::config::AppConfig;
use project_insights::dashboard::{
    build_dashboard, AiStatus, DashboardRequest, DashboardResponse, InsightFetcher,
};
use project_insights::error::AppError;
use project_insights::telemetry;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

#[derive(Args, Debug)]
pub(crate) struct InsightsArgs {
    /// Dashboard request JSON file, or `-` to read from stdin
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Print the response on a single line instead of pretty JSON
    #[arg(long)]
    pub(crate) compact: bool,
}

pub(crate) async fn run_insights_report(args: InsightsArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let raw = read_input(&args.input).await?;
    let request = DashboardRequest::from_value(serde_json::from_str(&raw)?)?;

    let fetcher = InsightFetcher::new(config.ai)?;
    let response = build_dashboard(&fetcher, request).await?;

    eprintln!("{}", render_overview(&response));
    let output = if args.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    println!("{output}");

    Ok(())
}

async fn read_input(path: &Path) -> Result<String, AppError> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        Ok(buffer)
    } else {
        Ok(tokio::fs::read_to_string(path).await?)
    }
}

fn render_overview(response: &DashboardResponse) -> String {
    let summary = &response.summary;
    let mut lines = Vec::new();

    lines.push(format!(
        "Project: {}",
        summary.project.as_deref().unwrap_or("(unnamed)")
    ));
    match summary.deadline {
        Some(deadline) => lines.push(format!("Deadline: {deadline}")),
        None => lines.push("Deadline: not set".to_string()),
    }
    lines.push(format!(
        "Progress: {}/{} tasks ({:.0}%)",
        summary.completed_tasks,
        summary.total_tasks,
        summary.completion_ratio() * 100.0
    ));
    lines.push(format!(
        "Team: {} members, {} hours",
        summary.workload_by_person.len(),
        summary.total_hours()
    ));

    let source = match response.insights.ai_status() {
        AiStatus::Full => "model",
        AiStatus::Partial => "fallback",
    };
    lines.push(format!("Insights source: {source}"));

    lines.join("\n")
}
