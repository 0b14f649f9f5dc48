//! In-memory todo and category store.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use tracing::debug;

use crate::validators::validate_category_name;

pub type TodoId = u64;
pub type CategoryId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: TodoId,
    pub name: String,
    pub description: String,
    pub due: Option<NaiveDate>,
    pub category: Option<CategoryId>,
    pub done: bool,
}

/// Fields a user can set on a todo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoDraft {
    pub name: String,
    pub description: String,
    pub due: Option<NaiveDate>,
    pub category: Option<CategoryId>,
}

/// Store shared between the screen and the dialog flows.
pub type SharedStore = Rc<RefCell<TodoStore>>;

#[derive(Debug, Default)]
pub struct TodoStore {
    todos: Vec<Todo>,
    categories: Vec<Category>,
    next_todo_id: TodoId,
    next_category_id: CategoryId,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with a couple of categories and todos to look at.
    pub fn with_demo_data(today: NaiveDate) -> Self {
        let mut store = Self::new();
        let work = store.add_category("Work").ok();
        let home = store.add_category("Home").ok();
        store.add(TodoDraft {
            name: "Write release notes".to_string(),
            description: "Summarize the changes since the last tag".to_string(),
            due: today.succ_opt(),
            category: work,
        });
        store.add(TodoDraft {
            name: "Water the plants".to_string(),
            description: String::new(),
            due: Some(today),
            category: home,
        });
        store.add(TodoDraft {
            name: "Read a book".to_string(),
            description: String::new(),
            due: None,
            category: None,
        });
        store
    }

    pub fn add(&mut self, draft: TodoDraft) -> TodoId {
        self.next_todo_id += 1;
        let id = self.next_todo_id;
        debug!(todo_id = id, name = %draft.name, "todo_added");
        self.todos.push(Todo {
            id,
            name: draft.name,
            description: draft.description,
            due: draft.due,
            category: draft.category,
            done: false,
        });
        id
    }

    /// Replace a todo's editable fields. Returns false if it no longer exists.
    pub fn update(&mut self, id: TodoId, draft: TodoDraft) -> bool {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        todo.name = draft.name;
        todo.description = draft.description;
        todo.due = draft.due;
        todo.category = draft.category;
        debug!(todo_id = id, "todo_updated");
        true
    }

    pub fn remove(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        debug!(todo_id = id, "todo_removed");
        Some(self.todos.remove(index))
    }

    /// Flip a todo's done flag, returning the new state.
    pub fn toggle(&mut self, id: TodoId) -> Option<bool> {
        let todo = self.todos.iter_mut().find(|t| t.id == id)?;
        todo.done = !todo.done;
        Some(todo.done)
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Todos in insertion order, optionally only those in one category.
    pub fn list(&self, category: Option<CategoryId>) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|t| category.is_none() || t.category == category)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn done_count(&self) -> usize {
        self.todos.iter().filter(|t| t.done).count()
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_name(&self, id: Option<CategoryId>) -> Option<&str> {
        id.and_then(|id| self.category(id)).map(|c| c.name.as_str())
    }

    /// Add a category. The name is trimmed; duplicates (ignoring case) are rejected
    /// with a message suitable for display.
    pub fn add_category(&mut self, name: &str) -> Result<CategoryId, String> {
        let name = name.trim();
        if let Some(err) =
            validate_category_name(name, self.categories.iter().map(|c| c.name.as_str()))
        {
            return Err(err);
        }
        self.next_category_id += 1;
        let id = self.next_category_id;
        debug!(category_id = id, name, "category_added");
        self.categories.push(Category {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Remove a category. Its todos stay but lose the category.
    pub fn remove_category(&mut self, id: CategoryId) -> Option<Category> {
        let index = self.categories.iter().position(|c| c.id == id)?;
        let mut orphaned = 0;
        for todo in self.todos.iter_mut().filter(|t| t.category == Some(id)) {
            todo.category = None;
            orphaned += 1;
        }
        debug!(category_id = id, orphaned, "category_removed");
        Some(self.categories.remove(index))
    }
}
