//! Modal panel construction and in-panel input handling.
//!
//! The panel knows how to lay itself out and which button a key or click
//! activates. Opening, closing and queueing are the coordinator's job.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Position, Rect};

use crate::fields::{FieldControl, FieldDescriptor};
use crate::focus::FocusTarget;
use crate::request::{CancelLabel, ModalRequest, Variant};

/// A request with every label resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub title: String,
    pub message: Option<String>,
    pub variant: Variant,
    pub dismissible: bool,
    pub confirm_label: String,
    /// `None` when the cancel action is suppressed.
    pub cancel_label: Option<String>,
    /// `Some` for forms, even when empty.
    pub fields: Option<Vec<FieldDescriptor>>,
}

impl ResolvedRequest {
    /// Resolve unset labels: confirm is "Save" for forms and "OK" otherwise,
    /// cancel is "Cancel" for forms and "Close" otherwise.
    pub fn resolve(mut request: ModalRequest) -> Self {
        let fields = request.take_fields();
        let is_form = fields.is_some();
        let confirm_label = request
            .confirm_label
            .unwrap_or_else(|| (if is_form { "Save" } else { "OK" }).to_string());
        let cancel_label = match request.cancel_label {
            CancelLabel::Default => Some((if is_form { "Cancel" } else { "Close" }).to_string()),
            CancelLabel::Label(label) => Some(label),
            CancelLabel::Hidden => None,
        };
        Self {
            title: request.title,
            message: request.message,
            variant: request.variant,
            dismissible: request.dismissible,
            confirm_label,
            cancel_label,
            fields,
        }
    }
}

/// What a key or click inside the panel asks the coordinator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Submit,
    Cancel,
    None,
}

/// Result of hit-testing a mouse position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Outside the panel.
    Backdrop,
    /// Inside the panel but not on anything interactive.
    Panel,
    Field(usize),
    ConfirmButton,
    CancelButton,
}

/// Screen regions recorded by the last draw, used for hit-testing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelLayout {
    pub panel: Rect,
    pub confirm: Option<Rect>,
    pub cancel: Option<Rect>,
    pub fields: Vec<(usize, Rect)>,
}

/// One dialog's rendered state: labels, bound controls and focus.
#[derive(Debug, Clone)]
pub struct ModalPanel {
    title: String,
    message: Option<String>,
    variant: Variant,
    dismissible: bool,
    confirm_label: String,
    cancel_label: Option<String>,
    is_form: bool,
    controls: Vec<FieldControl>,
    /// `None` while the panel itself holds focus.
    focus: Option<FocusTarget>,
    layout: Option<PanelLayout>,
}

impl ModalPanel {
    pub fn build(resolved: ResolvedRequest) -> Self {
        let is_form = resolved.fields.is_some();
        let controls = resolved
            .fields
            .unwrap_or_default()
            .into_iter()
            .map(FieldControl::new)
            .collect();
        Self {
            title: resolved.title,
            message: resolved.message,
            variant: resolved.variant,
            dismissible: resolved.dismissible,
            confirm_label: resolved.confirm_label,
            cancel_label: resolved.cancel_label,
            is_form,
            controls,
            focus: None,
            layout: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn is_dismissible(&self) -> bool {
        self.dismissible
    }

    pub fn is_form(&self) -> bool {
        self.is_form
    }

    pub fn confirm_label(&self) -> &str {
        &self.confirm_label
    }

    pub fn cancel_label(&self) -> Option<&str> {
        self.cancel_label.as_deref()
    }

    pub fn controls(&self) -> &[FieldControl] {
        &self.controls
    }

    #[cfg(test)]
    pub fn control(&self, name: &str) -> Option<&FieldControl> {
        self.controls.iter().find(|c| c.name() == name)
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.focus
    }

    pub fn set_focus(&mut self, focus: Option<FocusTarget>) {
        self.focus = focus;
    }

    #[cfg(test)]
    pub fn layout(&self) -> Option<&PanelLayout> {
        self.layout.as_ref()
    }

    pub(crate) fn set_layout(&mut self, layout: PanelLayout) {
        self.layout = Some(layout);
    }

    /// Focusable targets in display order: fields, then cancel, then confirm.
    pub fn focusables(&self) -> Vec<FocusTarget> {
        let mut targets: Vec<FocusTarget> =
            (0..self.controls.len()).map(FocusTarget::Field).collect();
        if self.cancel_label.is_some() {
            targets.push(FocusTarget::CancelButton);
        }
        targets.push(FocusTarget::ConfirmButton);
        targets
    }

    /// Validate every field, revealing errors on all invalid ones at once.
    pub fn validate(&mut self) -> bool {
        let mut valid = true;
        for control in &mut self.controls {
            valid &= control.validate();
        }
        valid
    }

    /// Raw values keyed by field name.
    pub fn values(&self) -> HashMap<String, String> {
        self.controls
            .iter()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect()
    }

    /// Route a non-navigation key to the focused element.
    pub fn handle_key(&mut self, key: &KeyEvent) -> PanelAction {
        let activate = matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
        match self.focus {
            Some(FocusTarget::ConfirmButton) if activate => PanelAction::Submit,
            Some(FocusTarget::CancelButton) if activate && self.cancel_label.is_some() => {
                PanelAction::Cancel
            }
            Some(FocusTarget::Field(i)) => {
                let Some(control) = self.controls.get_mut(i) else {
                    return PanelAction::None;
                };
                if key.code == KeyCode::Enter && control.submits_on_enter() {
                    return PanelAction::Submit;
                }
                control.handle_key(key);
                PanelAction::None
            }
            _ => PanelAction::None,
        }
    }

    /// Hit-test a screen position against the last drawn layout.
    pub fn hit_test(&self, column: u16, row: u16) -> ClickTarget {
        let Some(layout) = &self.layout else {
            return ClickTarget::Panel;
        };
        let pos = Position::new(column, row);
        if !layout.panel.contains(pos) {
            return ClickTarget::Backdrop;
        }
        if layout.confirm.is_some_and(|r| r.contains(pos)) {
            return ClickTarget::ConfirmButton;
        }
        if layout.cancel.is_some_and(|r| r.contains(pos)) {
            return ClickTarget::CancelButton;
        }
        layout
            .fields
            .iter()
            .find(|(_, r)| r.contains(pos))
            .map(|(i, _)| ClickTarget::Field(*i))
            .unwrap_or(ClickTarget::Panel)
    }
}
