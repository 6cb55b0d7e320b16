//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the todo use-cases to Dart as blocking calls on FRB workers.
//! - Flatten core results into plain string/bool envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Input validation (blank title, unknown priority, bad timestamp) happens
//!   before any storage or network work.
//! - The service, its cache and its runtime are created once per process from
//!   environment configuration.

use once_cell::sync::OnceCell;
use std::future::Future;
use todo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, normalize_title,
    ping as ping_inner, LogLevel, MirroredTodoRepository, Priority, ServiceResult, Todo, TodoConfig,
    TodoInput, TodoPatch, TodoQueryCache, TodoService,
};
use tokio::runtime::Runtime;

type FfiService = TodoService<MirroredTodoRepository>;

static RUNTIME: OnceCell<Runtime> = OnceCell::new();
static SERVICE: OnceCell<FfiService> = OnceCell::new();

/// Health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// A blank `level` selects the build default (`debug` or `info`).
/// Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(effective_level(&level), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

fn effective_level(level: &str) -> &str {
    if level.trim().is_empty() {
        LogLevel::build_default().as_str()
    } else {
        level
    }
}

/// Todo row as rendered by list and detail screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// `low|medium|high`.
    pub priority: String,
    /// Uppercase badge text.
    pub priority_label: String,
    /// Badge color as `#RRGGBB`.
    pub priority_color: String,
    /// RFC 3339, absent when unset.
    pub due_date: Option<String>,
    /// RFC 3339.
    pub created_at: String,
}

/// Envelope for list-returning calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    pub message: String,
}

/// Envelope for single-item calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    /// Resulting record; `None` for deletes and lookups that found nothing.
    pub item: Option<TodoItem>,
    /// Set when the target todo does not exist.
    pub not_found: bool,
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, item: Option<TodoItem>) -> Self {
        Self {
            ok: true,
            item,
            not_found: false,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            item: None,
            not_found: false,
            message: message.into(),
        }
    }

    fn from_result(action: &str, result: Result<Todo, String>, not_found: bool) -> Self {
        match result {
            Ok(todo) => Self::success(format!("{action} ok."), Some(to_item(&todo))),
            Err(message) => Self {
                not_found,
                ..Self::failure(format!("{action} failed: {message}"))
            },
        }
    }
}

/// Seeds local storage on first launch and returns the stored todos.
pub fn todos_initialize() -> TodoListResponse {
    list_response("todos_initialize", run(|service| service.initialize()))
}

/// Returns every todo, newest first.
pub fn todos_list() -> TodoListResponse {
    list_response("todos_list", run(|service| service.todos()))
}

/// Looks up one todo by ID.
pub fn todo_get(id: String) -> TodoActionResponse {
    match run(|service| service.todo(&id)) {
        Ok(Ok(Some(todo))) => TodoActionResponse::success("Todo found.", Some(to_item(&todo))),
        Ok(Ok(None)) => TodoActionResponse {
            not_found: true,
            ..TodoActionResponse::failure("Todo not found.")
        },
        Ok(Err(err)) => TodoActionResponse::failure(format!("todo_get failed: {err}")),
        Err(message) => TodoActionResponse::failure(format!("todo_get failed: {message}")),
    }
}

/// Creates a todo from the add form.
///
/// `priority` accepts `low|medium|high` (case-insensitive) and defaults to
/// medium; `due_date` is RFC 3339.
pub fn todo_add(
    title: String,
    priority: Option<String>,
    due_date: Option<String>,
) -> TodoActionResponse {
    let input = match parse_add_input(&title, priority.as_deref(), due_date.as_deref()) {
        Ok(input) => input,
        Err(message) => {
            return TodoActionResponse::failure(format!("todo_add failed: {message}"))
        }
    };
    mutation_response("todo_add", run(|service| service.create(input)))
}

/// Applies an edit form. An empty `due_date` string clears the due date.
pub fn todo_update(
    id: String,
    title: Option<String>,
    completed: Option<bool>,
    priority: Option<String>,
    due_date: Option<String>,
) -> TodoActionResponse {
    let patch = match parse_patch(id, title, completed, priority, due_date) {
        Ok(patch) => patch,
        Err(message) => {
            return TodoActionResponse::failure(format!("todo_update failed: {message}"))
        }
    };
    mutation_response("todo_update", run(|service| service.edit(patch)))
}

/// Flips the completed flag.
pub fn todo_toggle(id: String) -> TodoActionResponse {
    mutation_response("todo_toggle", run(|service| service.toggle(&id)))
}

/// Deletes a todo; deleting an unknown ID succeeds.
pub fn todo_remove(id: String) -> TodoActionResponse {
    match run(|service| service.delete(&id)) {
        Ok(Ok(())) => TodoActionResponse::success("Todo deleted.", None),
        Ok(Err(err)) => TodoActionResponse::failure(format!("todo_remove failed: {err}")),
        Err(message) => TodoActionResponse::failure(format!("todo_remove failed: {message}")),
    }
}

/// Debug helper wiping local storage. Returns an empty string on success.
pub fn todos_reset() -> String {
    match run(|service| service.reset()) {
        Ok(()) => String::new(),
        Err(message) => format!("todos_reset failed: {message}"),
    }
}

fn parse_add_input(
    title: &str,
    priority: Option<&str>,
    due_date: Option<&str>,
) -> Result<TodoInput, String> {
    Ok(TodoInput {
        title: normalize_title(title).map_err(|err| err.to_string())?,
        priority: priority.map(parse_priority).transpose()?,
        due_date: due_date
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_timestamp)
            .transpose()?,
    })
}

fn parse_patch(
    id: String,
    title: Option<String>,
    completed: Option<bool>,
    priority: Option<String>,
    due_date: Option<String>,
) -> Result<TodoPatch, String> {
    let title = title
        .map(|title| normalize_title(&title).map_err(|err| err.to_string()))
        .transpose()?;
    let due_date = match due_date {
        Some(raw) if raw.trim().is_empty() => Some(None),
        Some(raw) => Some(Some(parse_timestamp(&raw)?)),
        None => None,
    };
    Ok(TodoPatch {
        id,
        title,
        completed,
        priority: priority.as_deref().map(parse_priority).transpose()?,
        due_date,
    })
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    Priority::parse(raw).ok_or_else(|| format!("unknown priority `{}`", raw.trim()))
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, String> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&chrono::Utc))
        .map_err(|err| format!("invalid timestamp `{}`: {err}", raw.trim()))
}

fn to_item(todo: &Todo) -> TodoItem {
    TodoItem {
        id: todo.id.clone(),
        title: todo.title.clone(),
        completed: todo.completed,
        priority: todo.priority.as_str().to_string(),
        priority_label: todo.priority.label().to_string(),
        priority_color: todo.priority.color_hex().to_string(),
        due_date: todo.due_date.map(|due| due.to_rfc3339()),
        created_at: todo.created_at.to_rfc3339(),
    }
}

fn list_response(
    action: &str,
    result: Result<ServiceResult<Vec<Todo>>, String>,
) -> TodoListResponse {
    let flattened = result.and_then(|inner| inner.map_err(|err| err.to_string()));
    match flattened {
        Ok(todos) => TodoListResponse {
            ok: true,
            message: format!("Loaded {} todo(s).", todos.len()),
            items: todos.iter().map(to_item).collect(),
        },
        Err(message) => TodoListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("{action} failed: {message}"),
        },
    }
}

fn mutation_response(
    action: &str,
    result: Result<ServiceResult<Todo>, String>,
) -> TodoActionResponse {
    match result {
        Ok(Ok(todo)) => TodoActionResponse::from_result(action, Ok(todo), false),
        Ok(Err(err)) => {
            let not_found = err.is_not_found();
            TodoActionResponse::from_result(action, Err(err.to_string()), not_found)
        }
        Err(message) => TodoActionResponse::from_result(action, Err(message), false),
    }
}

/// Drives one service future to completion on the shared runtime.
fn run<'a, F, Fut, T>(f: F) -> Result<T, String>
where
    F: FnOnce(&'a FfiService) -> Fut,
    Fut: Future<Output = T> + 'a,
{
    let runtime = RUNTIME
        .get_or_try_init(Runtime::new)
        .map_err(|err| format!("runtime init failed: {err}"))?;
    let service = resolve_service()?;
    Ok(runtime.block_on(f(service)))
}

fn resolve_service() -> Result<&'static FfiService, String> {
    SERVICE.get_or_try_init(|| {
        let config = TodoConfig::from_env().map_err(|err| format!("config error: {err}"))?;
        let repo = config
            .open_repository()
            .map_err(|err| format!("repository init failed: {err}"))?;
        log::info!(
            "event=ffi_service_init module=ffi status=ok policy={} seed_limit={}",
            config.read_failure_policy.as_str(),
            config.seed_limit
        );
        Ok(TodoService::new(repo, TodoQueryCache::new()))
    })
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, effective_level, init_logging, parse_patch, ping, to_item, todo_add,
        todo_update,
    };
    use chrono::{TimeZone, Utc};
    use todo_core::{LogLevel, Priority, Todo};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn blank_log_level_falls_back_to_build_default() {
        assert_eq!(effective_level("  "), LogLevel::build_default().as_str());
        assert_eq!(effective_level("warn"), "warn");
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn todo_add_rejects_blank_title_before_any_io() {
        let response = todo_add("   ".to_string(), None, None);
        assert!(!response.ok);
        assert!(response.message.contains("blank"));
    }

    #[test]
    fn todo_add_rejects_unknown_priority() {
        let response = todo_add("milk".to_string(), Some("urgent".to_string()), None);
        assert!(!response.ok);
        assert!(response.message.contains("urgent"));
    }

    #[test]
    fn todo_update_rejects_malformed_due_date() {
        let response = todo_update(
            "id".to_string(),
            None,
            None,
            None,
            Some("next tuesday".to_string()),
        );
        assert!(!response.ok);
        assert!(response.message.contains("invalid timestamp"));
    }

    #[test]
    fn empty_due_date_clears_it() {
        let patch = parse_patch("id".to_string(), None, Some(true), None, Some(String::new()))
            .unwrap();
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.completed, Some(true));
    }

    #[test]
    fn item_carries_badge_metadata() {
        let created = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let mut todo = Todo::new("badge", created);
        todo.priority = Priority::High;

        let item = to_item(&todo);
        assert_eq!(item.priority, "high");
        assert_eq!(item.priority_label, "HIGH");
        assert_eq!(item.priority_color, "#F44336");
        assert_eq!(item.due_date, None);
        assert_eq!(item.created_at, "2024-02-03T04:05:06+00:00");
    }
}
