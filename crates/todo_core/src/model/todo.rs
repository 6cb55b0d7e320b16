//! Todo domain model.
//!
//! # Responsibility
//! - Define the stored `Todo` record and its JSON shape.
//! - Define the base record returned by the remote service.
//! - Provide merge and validation helpers for write flows.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - JSON field names are camelCase to match the persisted collection blob.
//! - `priority` defaults to `Medium` whenever a caller leaves it unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque identifier of one todo in the local collection.
pub type TodoId = String;

/// Generates a fresh collision-resistant todo identifier.
pub fn new_todo_id() -> TodoId {
    Uuid::new_v4().to_string()
}

/// Urgency bucket shown as a colored badge by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Uppercase badge text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Badge background color as `#RRGGBB`.
    pub fn color_hex(self) -> &'static str {
        match self {
            Self::Low => "#4CAF50",
            Self::Medium => "#FFC107",
            Self::High => "#F44336",
        }
    }

    /// Parses a case-insensitive priority name (`low|medium|high`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Canonical todo record as persisted in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Serialized as explicit `null` when unset.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Set once at creation; the sort key for list views.
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a not-yet-completed todo with a generated ID.
    pub fn new(title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: new_todo_id(),
            title: title.into(),
            completed: false,
            priority: Priority::Medium,
            due_date: None,
            created_at,
        }
    }

    /// Applies every field present in `patch` over this record.
    ///
    /// `id` and `created_at` are never touched, even when the patch targets a
    /// different ID; callers are expected to match IDs beforehand.
    pub fn apply_patch(&mut self, patch: &TodoPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

/// Caller-supplied fields for an explicit add.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    pub title: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TodoInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Partial update keyed by `id`.
///
/// `due_date` is tri-state: `None` keeps the stored value, `Some(None)` clears
/// it, `Some(Some(ts))` replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub id: TodoId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    pub fn new(id: impl Into<TodoId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Base record shape served by the remote todo endpoint.
///
/// Remote IDs may be JSON numbers or strings; both are carried as strings.
/// Timestamps are optional because most remotes never send them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTodo {
    #[serde(deserialize_with = "deserialize_remote_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTodoRequest {
    pub title: String,
    pub completed: bool,
}

fn deserialize_remote_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Number(value) => value.to_string(),
    })
}

/// Validation error raised at the presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoValidationError {
    BlankTitle,
}

impl Display for TodoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title cannot be blank"),
        }
    }
}

impl Error for TodoValidationError {}

/// Trims `title` and rejects blank or whitespace-only input.
pub fn normalize_title(title: &str) -> Result<String, TodoValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Priority, RemoteTodo, Todo, TodoPatch, TodoValidationError};
    use chrono::{TimeZone, Utc};

    #[test]
    fn priority_serializes_lowercase_and_defaults_to_medium() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::parse(" LOW "), Some(Priority::Low));
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn badge_metadata_matches_palette() {
        assert_eq!(Priority::Low.label(), "LOW");
        assert_eq!(Priority::Medium.color_hex(), "#FFC107");
        assert_eq!(Priority::High.color_hex(), "#F44336");
    }

    #[test]
    fn todo_json_uses_camel_case_and_explicit_null_due_date() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let todo = Todo::new("write report", created_at);
        let value = serde_json::to_value(&todo).unwrap();

        assert_eq!(value["createdAt"], "2024-05-01T08:30:00Z");
        assert!(value["dueDate"].is_null());
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn remote_todo_accepts_numeric_ids_and_ignores_extra_fields() {
        let raw = r#"{"userId": 1, "id": 7, "title": "delectus aut autem", "completed": true}"#;
        let remote: RemoteTodo = serde_json::from_str(raw).unwrap();

        assert_eq!(remote.id, "7");
        assert!(remote.completed);
        assert_eq!(remote.priority, None);
        assert_eq!(remote.created_at, None);
    }

    #[test]
    fn apply_patch_only_touches_present_fields() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut todo = Todo::new("draft", created_at);
        let original = todo.clone();

        todo.apply_patch(&TodoPatch::new(todo.id.clone()).title("final"));

        assert_eq!(todo.title, "final");
        assert_eq!(todo.completed, original.completed);
        assert_eq!(todo.priority, original.priority);
        assert_eq!(todo.due_date, original.due_date);
        assert_eq!(todo.created_at, original.created_at);
    }

    #[test]
    fn apply_patch_can_clear_due_date() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let mut todo = Todo::new("draft", created_at);
        todo.due_date = Some(created_at);

        todo.apply_patch(&TodoPatch::new(todo.id.clone()).due_date(None));
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn patch_serialization_omits_absent_fields() {
        let patch = TodoPatch::new("abc").completed(true);
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({"id": "abc", "completed": true}));
    }

    #[test]
    fn normalize_title_rejects_whitespace() {
        assert_eq!(
            normalize_title("  \t "),
            Err(TodoValidationError::BlankTitle)
        );
        assert_eq!(normalize_title("  milk ").unwrap(), "milk");
    }
}
