// libs/task-cell/src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// ==============================================================================
// CORE TASK MODELS
// ==============================================================================

/// A therapy/medication task in the shape the projection produces. `date`
/// is normalized to `YYYY-MM-DD`; `time` falls back to the `"N/A"` sentinel
/// when the remarks heuristic finds no time component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub kind: TaskType,
    pub name: String,
    pub therapy_for: String,
    pub ref_file: Option<String>,
    pub date: String,
    pub time: String,
    pub completed: bool,
    pub dose: String,
    pub remarks: String,
}

impl Task {
    pub fn is_media(&self) -> bool {
        matches!(self.kind, TaskType::Audio | TaskType::Video)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Audio,
    Video,
    Medicine,
    Default,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskType::Audio => write!(f, "audio"),
            TaskType::Video => write!(f, "video"),
            TaskType::Medicine => write!(f, "medicine"),
            TaskType::Default => write!(f, "default"),
        }
    }
}

/// Date-relative tab a task lands in. Membership is recomputed from the
/// task date on every projection, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTab {
    Today,
    Tomorrow,
    NextThree,
    Past,
}

/// Tasks partitioned into the four tabs. Tasks more than three days out are
/// excluded entirely.
#[derive(Debug, Clone, Default)]
pub struct TaskBuckets {
    pub today: Vec<Task>,
    pub tomorrow: Vec<Task>,
    pub next3: Vec<Task>,
    pub past: Vec<Task>,
}

impl TaskBuckets {
    pub fn total(&self) -> usize {
        self.today.len() + self.tomorrow.len() + self.next3.len() + self.past.len()
    }
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

/// Task row as the remote service returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "de_string_or_number")]
    pub id: String,
    pub task_name: String,
    #[serde(default)]
    pub therapy_for: String,
    #[serde(default)]
    pub task_category_name: Option<String>,
    #[serde(default)]
    pub task_sub_category_name: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub ref_file: Option<String>,
    pub task_date: String,
    #[serde(default)]
    pub task_status: Option<String>,
}

fn de_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Remote service error: {0}")]
    RemoteError(String),

    #[error("Network error: {0}")]
    Network(String),
}
