//! Todo and category workflows driven through modal dialogs.
//!
//! Each flow is an async function that opens one or more dialogs, waits for
//! the user, then applies the result to the store. Store borrows are never
//! held across an await.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::Config;
use crate::fields::{FieldDescriptor, SelectOption};
use crate::modals::Modals;
use crate::request::ModalRequest;
use crate::todos::{CategoryId, SharedStore, TodoDraft, TodoId};
use crate::validators::{DATE_FORMAT, parse_date};

/// Key bindings listed by the help dialog.
pub const HELP_TEXT: &str = "a add todo, e edit todo, d delete todo, space toggle done\n\
c add category, x delete category\n\
Tab switch pane, j/k move, ? help, q quit";

/// Parts of the configuration the flows care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    pub confirm_delete: bool,
    pub textarea_rows: u16,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            confirm_delete: true,
            textarea_rows: crate::fields::DEFAULT_TEXTAREA_ROWS,
        }
    }
}

impl From<&Config> for FlowSettings {
    fn from(config: &Config) -> Self {
        Self {
            confirm_delete: config.todos.confirm_delete,
            textarea_rows: config.modal.textarea_rows,
        }
    }
}

/// Everything a flow needs. Cheap to clone into a spawned task.
#[derive(Debug, Clone)]
pub struct Flows {
    modals: Modals,
    store: SharedStore,
    settings: FlowSettings,
}

impl Flows {
    pub fn new(modals: Modals, store: SharedStore, settings: FlowSettings) -> Self {
        Self {
            modals,
            store,
            settings,
        }
    }

    /// Fields of the add/edit todo form, prefilled from `draft`.
    fn todo_fields(&self, draft: &TodoDraft) -> Vec<FieldDescriptor> {
        let mut options = vec![SelectOption::new("None", "")];
        options.extend(
            self.store
                .borrow()
                .categories()
                .iter()
                .map(|c| SelectOption::new(c.name.clone(), c.id.to_string())),
        );
        let category = draft.category.map(|id| id.to_string()).unwrap_or_default();
        let due = draft
            .due
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();

        vec![
            FieldDescriptor::text("name", "Name")
                .required()
                .placeholder("What needs doing?")
                .initial_value(draft.name.clone()),
            FieldDescriptor::textarea("description", "Description")
                .rows(self.settings.textarea_rows)
                .initial_value(draft.description.clone()),
            FieldDescriptor::date("dueDate", "Due date")
                .required()
                .initial_value(due),
            FieldDescriptor::select("category", "Category", options).initial_value(category),
        ]
    }

    /// Turn submitted form values into a draft. Fails with a displayable
    /// message when the due date does not parse.
    fn draft_from_values(&self, values: &HashMap<String, String>) -> Result<TodoDraft, String> {
        let get = |name: &str| values.get(name).map(String::as_str).unwrap_or("");
        let due = parse_date(get("dueDate"))?;
        let store = self.store.borrow();
        // The category may have been deleted while the form was open
        let category = get("category")
            .parse::<CategoryId>()
            .ok()
            .filter(|id| store.category(*id).is_some());
        Ok(TodoDraft {
            name: get("name").trim().to_string(),
            description: get("description").trim_end().to_string(),
            due,
            category,
        })
    }

    async fn invalid_date(&self, message: String) {
        debug!(error = %message, "todo_due_date_invalid");
        self.modals
            .alert(ModalRequest::new("Invalid due date").message(message))
            .await;
    }

    async fn todo_not_found(&self, todo_id: TodoId) {
        debug!(todo_id, "todo_not_found");
        self.modals
            .alert(ModalRequest::new("Todo not found").message("It may have been deleted."))
            .await;
    }

    /// Ask for a new todo and add it. Returns its id, or `None` if nothing was added.
    pub async fn add_todo(&self, today: NaiveDate) -> Result<Option<TodoId>> {
        let draft = TodoDraft {
            due: Some(today),
            ..Default::default()
        };
        let request = ModalRequest::new("Add todo")
            .confirm_label("Add")
            .with_fields(self.todo_fields(&draft))?;

        let Some(values) = self.modals.form(request).await else {
            debug!("add_todo_cancelled");
            return Ok(None);
        };
        let draft = match self.draft_from_values(&values) {
            Ok(draft) => draft,
            Err(message) => {
                self.invalid_date(message).await;
                return Ok(None);
            }
        };
        let id = self.store.borrow_mut().add(draft);
        info!(todo_id = id, "todo_created");
        Ok(Some(id))
    }

    /// Edit an existing todo. Returns true if it was changed.
    pub async fn edit_todo(&self, todo_id: TodoId) -> Result<bool> {
        let existing = self.store.borrow().get(todo_id).cloned();
        let Some(todo) = existing else {
            self.todo_not_found(todo_id).await;
            return Ok(false);
        };
        let draft = TodoDraft {
            name: todo.name,
            description: todo.description,
            due: todo.due,
            category: todo.category,
        };
        let request = ModalRequest::new("Edit todo").with_fields(self.todo_fields(&draft))?;

        let Some(values) = self.modals.form(request).await else {
            debug!(todo_id, "edit_todo_cancelled");
            return Ok(false);
        };
        let draft = match self.draft_from_values(&values) {
            Ok(draft) => draft,
            Err(message) => {
                self.invalid_date(message).await;
                return Ok(false);
            }
        };
        let updated = self.store.borrow_mut().update(todo_id, draft);
        if !updated {
            self.todo_not_found(todo_id).await;
            return Ok(false);
        }
        info!(todo_id, "todo_edited");
        Ok(true)
    }

    /// Delete a todo, asking first unless confirmation is turned off.
    pub async fn delete_todo(&self, todo_id: TodoId) -> Result<bool> {
        let name = self.store.borrow().get(todo_id).map(|t| t.name.clone());
        let Some(name) = name else {
            self.todo_not_found(todo_id).await;
            return Ok(false);
        };

        if self.settings.confirm_delete {
            let confirmed = self
                .modals
                .confirm(
                    ModalRequest::new("Delete todo")
                        .message(format!("Are you sure? \"{}\" will be removed.", name))
                        .confirm_label("Delete")
                        .danger(),
                )
                .await;
            if !confirmed {
                debug!(todo_id, "delete_todo_cancelled");
                return Ok(false);
            }
        }

        let removed = self.store.borrow_mut().remove(todo_id).is_some();
        if removed {
            info!(todo_id, "todo_deleted");
        }
        Ok(removed)
    }

    /// Ask for a category name and add it. Duplicate names are reported in an alert.
    pub async fn add_category(&self) -> Result<Option<CategoryId>> {
        let request = ModalRequest::new("Add category")
            .confirm_label("Add")
            .with_fields(vec![
                FieldDescriptor::text("name", "Name")
                    .required()
                    .description("Names must be unique"),
            ])?;

        let Some(values) = self.modals.form(request).await else {
            return Ok(None);
        };
        let name = values.get("name").map(String::as_str).unwrap_or("");
        let added = self.store.borrow_mut().add_category(name);
        match added {
            Ok(id) => {
                info!(category_id = id, "category_created");
                Ok(Some(id))
            }
            Err(message) => {
                debug!(error = %message, "category_rejected");
                self.modals
                    .alert(ModalRequest::new("Could not add category").message(message))
                    .await;
                Ok(None)
            }
        }
    }

    /// Delete a category after a danger confirmation. Its todos are kept.
    pub async fn delete_category(&self, category_id: CategoryId) -> Result<bool> {
        let name = self
            .store
            .borrow()
            .category(category_id)
            .map(|c| c.name.clone());
        let Some(name) = name else {
            self.modals
                .alert(ModalRequest::new("Category not found"))
                .await;
            return Ok(false);
        };

        let confirmed = self
            .modals
            .confirm(
                ModalRequest::new("Delete category")
                    .message(format!(
                        "Delete \"{}\"? Its todos will be kept without a category.",
                        name
                    ))
                    .confirm_label("Delete")
                    .cancel_label("Keep")
                    .dismissible(false)
                    .danger(),
            )
            .await;
        if !confirmed {
            debug!(category_id, "delete_category_cancelled");
            return Ok(false);
        }

        let removed = self.store.borrow_mut().remove_category(category_id).is_some();
        if removed {
            info!(category_id, "category_deleted");
        }
        Ok(removed)
    }

    pub async fn show_help(&self) -> Result<()> {
        self.modals
            .alert(ModalRequest::new("Keyboard shortcuts").message(HELP_TEXT))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todos::TodoStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use futures::poll;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 10).unwrap()
    }

    fn setup(settings: FlowSettings) -> (Flows, Modals, SharedStore) {
        let modals = Modals::new();
        let store = Rc::new(RefCell::new(TodoStore::new()));
        let flows = Flows::new(modals.clone(), store.clone(), settings);
        (flows, modals, store)
    }

    fn press(modals: &Modals, code: KeyCode) {
        modals.handle_key(&KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(modals: &Modals, s: &str) {
        for c in s.chars() {
            press(modals, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_add_todo_creates_todo() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let task = flows.add_todo(today());
        tokio::pin!(task);

        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Add todo"));

        type_str(&modals, "Buy milk");
        press(&modals, KeyCode::Enter);

        let id = task.await.unwrap().unwrap();
        let store = store.borrow();
        let todo = store.get(id).unwrap();
        assert_eq!(todo.name, "Buy milk");
        assert_eq!(todo.due, Some(today()));
        assert_eq!(todo.category, None);
        assert!(!modals.is_active());
    }

    #[tokio::test]
    async fn test_add_todo_blank_name_keeps_form_open() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let task = flows.add_todo(today());
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        press(&modals, KeyCode::Enter);
        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Add todo"));

        press(&modals, KeyCode::Esc);
        assert_eq!(task.await.unwrap(), None);
        assert!(store.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_add_todo_invalid_date_shows_alert() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let task = flows.add_todo(today());
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        type_str(&modals, "Buy milk");
        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Tab);
        for _ in 0..10 {
            press(&modals, KeyCode::Backspace);
        }
        type_str(&modals, "2025-13-45");
        press(&modals, KeyCode::Enter);

        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Invalid due date"));

        press(&modals, KeyCode::Enter);
        assert_eq!(task.await.unwrap(), None);
        assert!(store.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_add_todo_with_category() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let work = store.borrow_mut().add_category("Work").unwrap();
        let task = flows.add_todo(today());
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        type_str(&modals, "Report");
        for _ in 0..3 {
            press(&modals, KeyCode::Tab);
        }
        press(&modals, KeyCode::Right);
        // Back to the name field, where Enter submits
        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Enter);

        let id = task.await.unwrap().unwrap();
        assert_eq!(store.borrow().get(id).unwrap().category, Some(work));
    }

    #[tokio::test]
    async fn test_edit_missing_todo_alerts() {
        let (flows, modals, _store) = setup(FlowSettings::default());
        let task = flows.edit_todo(999);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Todo not found"));

        press(&modals, KeyCode::Enter);
        assert!(!task.await.unwrap());
    }

    #[tokio::test]
    async fn test_edit_todo_prefills_and_updates() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let id = store.borrow_mut().add(TodoDraft {
            name: "Old".to_string(),
            due: Some(today()),
            ..Default::default()
        });
        let task = flows.edit_todo(id);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        for _ in 0..3 {
            press(&modals, KeyCode::Backspace);
        }
        type_str(&modals, "New");
        press(&modals, KeyCode::Enter);

        assert!(task.await.unwrap());
        let store = store.borrow();
        let todo = store.get(id).unwrap();
        assert_eq!(todo.name, "New");
        assert_eq!(todo.due, Some(today()));
    }

    #[tokio::test]
    async fn test_delete_todo_confirmed() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let id = store.borrow_mut().add(TodoDraft {
            name: "Old".to_string(),
            ..Default::default()
        });
        let task = flows.delete_todo(id);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Delete todo"));

        // Focus starts on Cancel; move to Delete
        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Enter);
        assert!(task.await.unwrap());
        assert!(store.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_delete_todo_cancelled_keeps_todo() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let id = store.borrow_mut().add(TodoDraft::default());
        let task = flows.delete_todo(id);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        press(&modals, KeyCode::Esc);
        assert!(!task.await.unwrap());
        assert_eq!(store.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_todo_without_confirmation() {
        let (flows, modals, store) = setup(FlowSettings {
            confirm_delete: false,
            ..Default::default()
        });
        let id = store.borrow_mut().add(TodoDraft::default());
        assert!(flows.delete_todo(id).await.unwrap());
        assert!(!modals.is_active());
        assert!(store.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_add_duplicate_category_alerts() {
        let (flows, modals, store) = setup(FlowSettings::default());
        store.borrow_mut().add_category("Work").unwrap();
        let task = flows.add_category();
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        type_str(&modals, "work");
        press(&modals, KeyCode::Enter);
        assert!(poll!(&mut task).is_pending());
        assert_eq!(
            modals.active_title().as_deref(),
            Some("Could not add category")
        );

        press(&modals, KeyCode::Enter);
        assert_eq!(task.await.unwrap(), None);
        assert_eq!(store.borrow().categories().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_category_keeps_todos() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let work = store.borrow_mut().add_category("Work").unwrap();
        let id = store.borrow_mut().add(TodoDraft {
            category: Some(work),
            ..Default::default()
        });
        let task = flows.delete_category(work);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        press(&modals, KeyCode::Tab);
        press(&modals, KeyCode::Enter);
        assert!(task.await.unwrap());
        assert_eq!(store.borrow().get(id).unwrap().category, None);
    }

    #[tokio::test]
    async fn test_delete_category_needs_an_explicit_choice() {
        let (flows, modals, store) = setup(FlowSettings::default());
        let work = store.borrow_mut().add_category("Work").unwrap();
        let task = flows.delete_category(work);
        tokio::pin!(task);
        assert!(poll!(&mut task).is_pending());

        press(&modals, KeyCode::Esc);
        assert!(poll!(&mut task).is_pending());
        assert_eq!(modals.active_title().as_deref(), Some("Delete category"));

        // Focus opens on Keep
        press(&modals, KeyCode::Enter);
        assert!(!task.await.unwrap());
        assert_eq!(store.borrow().categories().len(), 1);
    }

    #[tokio::test]
    async fn test_flows_queue_behind_each_other() {
        let (flows, modals, _store) = setup(FlowSettings::default());
        let help = flows.show_help();
        let add = flows.add_category();
        tokio::pin!(help);
        tokio::pin!(add);
        assert!(poll!(&mut help).is_pending());
        assert!(poll!(&mut add).is_pending());
        assert_eq!(
            modals.active_title().as_deref(),
            Some("Keyboard shortcuts")
        );
        assert_eq!(modals.queue_len(), 1);

        press(&modals, KeyCode::Enter);
        help.await.unwrap();
        assert_eq!(modals.active_title().as_deref(), Some("Add category"));
        press(&modals, KeyCode::Esc);
        assert_eq!(add.await.unwrap(), None);
    }
}
