//! Focus trapping for modal panels.
//!
//! A [`FocusTrap`] snapshots the panel's focusable targets when it is activated
//! and keeps Tab / Shift+Tab cycling inside that list. Escape asks the owner to
//! dismiss the panel, but only when the panel is dismissible.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A focusable element inside a modal panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    /// Form control at this index of the panel's field list.
    Field(usize),
    CancelButton,
    ConfirmButton,
}

/// What the trap did with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// Focus moved to this target.
    Moved(FocusTarget),
    /// Escape on a dismissible panel.
    DismissRequested,
    /// Escape on a non-dismissible panel: consumed, nothing happens.
    Suppressed,
    /// Not a trap key; the panel should handle it.
    Ignored,
}

/// Keeps keyboard focus cycling within one panel.
#[derive(Debug, Clone)]
pub struct FocusTrap {
    targets: Vec<FocusTarget>,
    dismissible: bool,
    active: bool,
}

impl FocusTrap {
    /// Activate a trap over `targets`. Returns `None` when there is nothing to
    /// focus, in which case the panel itself holds focus.
    pub fn activate(targets: &[FocusTarget], dismissible: bool) -> Option<Self> {
        if targets.is_empty() {
            return None;
        }
        Some(Self {
            targets: targets.to_vec(),
            dismissible,
            active: true,
        })
    }

    /// Where focus lands when the trap activates.
    pub fn first(&self) -> FocusTarget {
        self.targets[0]
    }

    pub fn last(&self) -> FocusTarget {
        self.targets[self.targets.len() - 1]
    }

    pub fn contains(&self, target: FocusTarget) -> bool {
        self.targets.contains(&target)
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Deactivate. A released trap ignores every key.
    pub fn release(&mut self) {
        self.active = false;
    }

    /// Handle a key given the currently focused target (`None` = the panel itself).
    pub fn handle_key(&self, current: Option<FocusTarget>, key: &KeyEvent) -> TrapAction {
        if !self.active {
            return TrapAction::Ignored;
        }
        match key.code {
            KeyCode::BackTab => TrapAction::Moved(self.prev(current)),
            KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => {
                TrapAction::Moved(self.prev(current))
            }
            KeyCode::Tab => TrapAction::Moved(self.next(current)),
            KeyCode::Esc if self.dismissible => TrapAction::DismissRequested,
            KeyCode::Esc => TrapAction::Suppressed,
            _ => TrapAction::Ignored,
        }
    }

    fn position(&self, current: Option<FocusTarget>) -> Option<usize> {
        current.and_then(|t| self.targets.iter().position(|&x| x == t))
    }

    fn next(&self, current: Option<FocusTarget>) -> FocusTarget {
        match self.position(current) {
            Some(i) if i + 1 < self.targets.len() => self.targets[i + 1],
            _ => self.first(),
        }
    }

    fn prev(&self, current: Option<FocusTarget>) -> FocusTarget {
        match self.position(current) {
            Some(i) if i > 0 => self.targets[i - 1],
            _ => self.last(),
        }
    }
}
