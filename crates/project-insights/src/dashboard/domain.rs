use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Raw dashboard payload as posted by the browser form.
///
/// Numeric fields are kept as raw JSON so numbers and numeric strings can
/// both be accepted during validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub completed_tasks: Option<Value>,
    #[serde(default)]
    pub total_tasks: Option<Value>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub team_members: Option<Value>,
}

/// One row of the team table.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberInput {
    pub name: String,
    #[serde(default)]
    pub hours: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Normalized project record handed to the insight fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub workload_by_person: BTreeMap<String, f64>,
    pub member_status: BTreeMap<String, String>,
}

impl ProjectSummary {
    /// Share of tasks completed. Zero when there are no tasks; may exceed 1.0
    /// when the form reports more completed tasks than total.
    pub fn completion_ratio(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.workload_by_person.values().sum()
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DashboardInputError {
    #[error("Invalid project data: {0}")]
    Malformed(String),
    #[error("Invalid teamMembers")]
    InvalidTeamMembers,
    #[error("Invalid team member at index {index}: {reason}")]
    InvalidMember { index: usize, reason: String },
    #[error("Invalid hours for {name}")]
    InvalidHours { name: String },
    #[error("{field} must be a non-negative integer")]
    InvalidTaskCount { field: &'static str },
    #[error("deadline '{0}' must be formatted as YYYY-MM-DD")]
    InvalidDeadline(String),
}

impl DashboardRequest {
    pub fn from_value(value: Value) -> Result<Self, DashboardInputError> {
        if !value.is_object() {
            return Err(DashboardInputError::Malformed(
                "request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|err| DashboardInputError::Malformed(err.to_string()))
    }

    /// Validates the payload and aggregates the team table into a summary.
    pub fn summarize(&self) -> Result<ProjectSummary, DashboardInputError> {
        let members = self.team_members()?;

        let total_tasks = parse_task_count(self.total_tasks.as_ref(), "totalTasks")?;
        let completed_tasks = parse_task_count(self.completed_tasks.as_ref(), "completedTasks")?;
        if completed_tasks > total_tasks {
            warn!(completed_tasks, total_tasks, "completed tasks exceed total tasks");
        }

        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| DashboardInputError::InvalidDeadline(raw.to_string()))?,
            ),
        };

        let mut workload_by_person = BTreeMap::new();
        let mut member_status = BTreeMap::new();

        for member in members {
            let name = member.name.trim();
            if name.is_empty() {
                continue;
            }

            let invalid_hours = || DashboardInputError::InvalidHours {
                name: name.to_string(),
            };
            let hours = parse_hours(member.hours.as_ref()).ok_or_else(invalid_hours)?;
            let total = workload_by_person.entry(name.to_string()).or_insert(0.0);
            *total += hours;
            if !total.is_finite() {
                return Err(invalid_hours());
            }

            if let Some(status) = member.status {
                member_status.insert(name.to_string(), status);
            }
        }

        let project = self
            .project
            .as_ref()
            .or(self.project_name.as_ref())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Ok(ProjectSummary {
            project,
            deadline,
            total_tasks,
            completed_tasks,
            workload_by_person,
            member_status,
        })
    }

    fn team_members(&self) -> Result<Vec<TeamMemberInput>, DashboardInputError> {
        let Some(Value::Array(rows)) = &self.team_members else {
            return Err(DashboardInputError::InvalidTeamMembers);
        };

        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                TeamMemberInput::deserialize(row).map_err(|err| {
                    DashboardInputError::InvalidMember {
                        index,
                        reason: err.to_string(),
                    }
                })
            })
            .collect()
    }
}

fn parse_task_count(
    value: Option<&Value>,
    field: &'static str,
) -> Result<u64, DashboardInputError> {
    let invalid = || DashboardInputError::InvalidTaskCount { field };
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(count) => Ok(count),
            None => number
                .as_f64()
                .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
                .filter(|value| *value <= u64::MAX as f64)
                .map(|value| value as u64)
                .ok_or_else(invalid),
        },
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            if raw.is_empty() {
                Ok(0)
            } else {
                raw.parse::<u64>().map_err(|_| invalid())
            }
        }
        Some(_) => Err(invalid()),
    }
}

fn parse_hours(value: Option<&Value>) -> Option<f64> {
    let hours = match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(number)) => number.as_f64()?,
        Some(Value::String(raw)) if raw.trim().is_empty() => 0.0,
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok()?,
        Some(_) => return None,
    };

    (hours.is_finite() && hours >= 0.0).then_some(hours)
}
