//! Application state and event routing.

use std::cell::RefCell;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;

use chrono::{Local, NaiveDate};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::{debug, info, warn};

use crate::config::{ConfigLoadStatus, LoadedConfig};
use crate::flows::{FlowSettings, Flows};
use crate::modals::{FocusId, Modals};
use crate::todos::{CategoryId, SharedStore, Todo, TodoId, TodoStore};

/// Page panes that can hold focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    Categories,
    #[default]
    Todos,
}

impl Pane {
    /// Toggle between the two panes.
    pub fn toggle(self) -> Self {
        match self {
            Self::Categories => Self::Todos,
            Self::Todos => Self::Categories,
        }
    }

    pub fn focus_id(self) -> FocusId {
        match self {
            Self::Categories => FocusId::new("categories"),
            Self::Todos => FocusId::new("todos"),
        }
    }

    pub fn from_focus(id: &FocusId) -> Option<Self> {
        match id.as_str() {
            "categories" => Some(Self::Categories),
            "todos" => Some(Self::Todos),
            _ => None,
        }
    }
}

pub struct App {
    pub modals: Modals,
    pub store: SharedStore,
    flows: Flows,
    pub config_path: PathBuf,
    pub config_status: ConfigLoadStatus,
    pub session_id: Option<String>,
    pub log_directory: Option<PathBuf>,
    pub logging_error: Option<String>,
    /// Index into the category list, where 0 is "All".
    pub selected_category: usize,
    /// Index into the visible todos.
    pub selected_todo: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        loaded_config: LoadedConfig,
        session_id: Option<String>,
        log_directory: Option<PathBuf>,
        logging_error: Option<String>,
        seed_demo: bool,
    ) -> Self {
        let store = if seed_demo {
            TodoStore::with_demo_data(today())
        } else {
            TodoStore::new()
        };
        let store = Rc::new(RefCell::new(store));
        let modals = Modals::new();
        modals.focus_page(Pane::default().focus_id());
        let settings = FlowSettings::from(&loaded_config.config);
        let flows = Flows::new(modals.clone(), store.clone(), settings);

        Self {
            modals,
            store,
            flows,
            config_path: loaded_config.config_path,
            config_status: loaded_config.status,
            session_id,
            log_directory,
            logging_error,
            selected_category: 0,
            selected_todo: 0,
            should_quit: false,
        }
    }

    /// Pane that owns page focus. While a modal is open no pane does.
    pub fn focused_pane(&self) -> Option<Pane> {
        self.modals.page_focus().as_ref().and_then(Pane::from_focus)
    }

    /// Category filter for the todo list, `None` meaning all.
    pub fn category_filter(&self) -> Option<CategoryId> {
        let index = self.selected_category.checked_sub(1)?;
        self.store.borrow().categories().get(index).map(|c| c.id)
    }

    pub fn visible_todos(&self) -> Vec<Todo> {
        self.store
            .borrow()
            .list(self.category_filter())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn selected_todo_id(&self) -> Option<TodoId> {
        let filter = self.category_filter();
        self.store
            .borrow()
            .list(filter)
            .get(self.selected_todo)
            .map(|t| t.id)
    }

    /// Keep both selections inside their lists after the store changed.
    pub fn clamp_selection(&mut self) {
        let categories = self.store.borrow().categories().len();
        self.selected_category = self.selected_category.min(categories);
        let todos = self.store.borrow().list(self.category_filter()).len();
        self.selected_todo = self.selected_todo.min(todos.saturating_sub(1));
    }

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        self.clamp_selection();
    }

    pub fn handle_key(&mut self, key: &KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            info!("quit_requested");
            self.should_quit = true;
            return;
        }
        if self.modals.handle_key(key) {
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                info!("quit_requested");
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                let pane = self.focused_pane().unwrap_or_default().toggle();
                debug!(pane = ?pane, "pane_focused");
                self.modals.focus_page(pane.focus_id());
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll(-1),
            KeyCode::Char('a') => {
                let flows = self.flows.clone();
                spawn_flow("add_todo", async move { flows.add_todo(today()).await });
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_todo_id() {
                    let flows = self.flows.clone();
                    spawn_flow("edit_todo", async move { flows.edit_todo(id).await });
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_todo_id() {
                    let flows = self.flows.clone();
                    spawn_flow("delete_todo", async move { flows.delete_todo(id).await });
                }
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.selected_todo_id() {
                    let done = self.store.borrow_mut().toggle(id);
                    debug!(todo_id = id, done = ?done, "todo_toggled");
                }
            }
            KeyCode::Char('c') => {
                let flows = self.flows.clone();
                spawn_flow("add_category", async move { flows.add_category().await });
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.category_filter() {
                    let flows = self.flows.clone();
                    spawn_flow("delete_category", async move {
                        flows.delete_category(id).await
                    });
                }
            }
            KeyCode::Char('?') => {
                let flows = self.flows.clone();
                spawn_flow("help", async move { flows.show_help().await });
            }
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: &MouseEvent) {
        if self.modals.handle_mouse(mouse) {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll(1),
            MouseEventKind::ScrollUp => self.scroll(-1),
            _ => {}
        }
    }

    /// Move the selection in the focused pane. Ignored while scrolling is locked.
    fn scroll(&mut self, delta: isize) {
        if self.modals.is_scroll_locked() {
            return;
        }
        match self.focused_pane().unwrap_or_default() {
            Pane::Categories => {
                let max = self.store.borrow().categories().len();
                self.selected_category = step(self.selected_category, delta, max);
                self.selected_todo = 0;
            }
            Pane::Todos => {
                let len = self.store.borrow().list(self.category_filter()).len();
                self.selected_todo = step(self.selected_todo, delta, len.saturating_sub(1));
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Move `current` by `delta`, staying within `0..=max`.
fn step(current: usize, delta: isize, max: usize) -> usize {
    current.saturating_add_signed(delta).min(max)
}

/// Run a dialog flow on the local task set, logging failures.
fn spawn_flow<T, F>(name: &'static str, flow: F)
where
    T: 'static,
    F: Future<Output = anyhow::Result<T>> + 'static,
{
    debug!(flow = name, "flow_started");
    tokio::task::spawn_local(async move {
        if let Err(e) = flow.await {
            warn!(flow = name, error = %e, "flow_failed");
        }
    });
}
