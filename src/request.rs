//! Modal requests and outcomes.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::fields::{FieldDescriptor, FieldKind};

/// Visual treatment of a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Default,
    /// Red border and confirm button, for destructive actions.
    Danger,
}

/// Cancel button label. `Hidden` removes the cancel action entirely, which is
/// not the same as leaving it unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CancelLabel {
    /// Use the default for the dialog kind.
    #[default]
    Default,
    Label(String),
    Hidden,
}

/// Which public entry point opened a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Alert,
    Confirm,
    Form,
}

impl DialogKind {
    pub fn name(self) -> &'static str {
        match self {
            DialogKind::Alert => "alert",
            DialogKind::Confirm => "confirm",
            DialogKind::Form => "form",
        }
    }
}

/// Caller misuse detected while building a form request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("duplicate field name `{0}`")]
    DuplicateField(String),
    #[error("select field `{0}` has no options")]
    EmptyOptions(String),
}

/// Parameters for one dialog invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRequest {
    pub title: String,
    pub message: Option<String>,
    pub confirm_label: Option<String>,
    pub cancel_label: CancelLabel,
    pub variant: Variant,
    /// Whether Escape and backdrop clicks cancel the dialog.
    pub dismissible: bool,
    fields: Option<Vec<FieldDescriptor>>,
}

impl ModalRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: None,
            confirm_label: None,
            cancel_label: CancelLabel::Default,
            variant: Variant::Default,
            dismissible: true,
            fields: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = CancelLabel::Label(label.into());
        self
    }

    pub fn hide_cancel(mut self) -> Self {
        self.cancel_label = CancelLabel::Hidden;
        self
    }

    pub fn danger(mut self) -> Self {
        self.variant = Variant::Danger;
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    /// Attach form fields, making this a form request.
    /// Field names must be unique and select fields need at least one option.
    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Result<Self, RequestError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(RequestError::DuplicateField(field.name.clone()));
            }
            if let FieldKind::Select { options } = &field.kind
                && options.is_empty()
            {
                return Err(RequestError::EmptyOptions(field.name.clone()));
            }
        }
        self.fields = Some(fields);
        Ok(self)
    }

    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        self.fields.as_deref()
    }

    pub fn is_form(&self) -> bool {
        self.fields.is_some()
    }

    /// Make this a form request, keeping any fields already attached.
    pub(crate) fn ensure_form(&mut self) {
        if self.fields.is_none() {
            self.fields = Some(Vec::new());
        }
    }

    pub(crate) fn take_fields(&mut self) -> Option<Vec<FieldDescriptor>> {
        self.fields.take()
    }
}

/// Result of a dialog. `values` is present only for confirmed forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOutcome {
    pub confirmed: bool,
    pub values: Option<HashMap<String, String>>,
}

impl ModalOutcome {
    pub fn confirmed(values: Option<HashMap<String, String>>) -> Self {
        Self {
            confirmed: true,
            values,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            confirmed: false,
            values: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SelectOption;

    #[test]
    fn test_new_request_defaults() {
        let request = ModalRequest::new("Delete todo");
        assert_eq!(request.title, "Delete todo");
        assert!(request.message.is_none());
        assert!(request.confirm_label.is_none());
        assert_eq!(request.cancel_label, CancelLabel::Default);
        assert_eq!(request.variant, Variant::Default);
        assert!(request.dismissible);
        assert!(!request.is_form());
    }

    #[test]
    fn test_with_fields_makes_form() {
        let request = ModalRequest::new("Add todo")
            .with_fields(vec![FieldDescriptor::text("name", "Name")])
            .unwrap();
        assert!(request.is_form());
        assert_eq!(request.fields().map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_empty_field_list_is_still_a_form() {
        let request = ModalRequest::new("Nothing to fill").with_fields(vec![]).unwrap();
        assert!(request.is_form());
    }

    #[test]
    fn test_duplicate_field_names_rejected() {
        let err = ModalRequest::new("Add todo")
            .with_fields(vec![
                FieldDescriptor::text("name", "Name"),
                FieldDescriptor::textarea("name", "Also name"),
            ])
            .unwrap_err();
        assert_eq!(err, RequestError::DuplicateField("name".to_string()));
        assert_eq!(err.to_string(), "duplicate field name `name`");
    }

    #[test]
    fn test_select_without_options_rejected() {
        let err = ModalRequest::new("Pick")
            .with_fields(vec![FieldDescriptor::select("category", "Category", vec![])])
            .unwrap_err();
        assert_eq!(err, RequestError::EmptyOptions("category".to_string()));
    }

    #[test]
    fn test_select_with_options_accepted() {
        let request = ModalRequest::new("Pick").with_fields(vec![FieldDescriptor::select(
            "category",
            "Category",
            vec![SelectOption::new("Work", "1")],
        )]);
        assert!(request.is_ok());
    }

    #[test]
    fn test_hide_cancel_differs_from_unset() {
        let hidden = ModalRequest::new("x").hide_cancel();
        assert_eq!(hidden.cancel_label, CancelLabel::Hidden);
        assert_ne!(hidden.cancel_label, CancelLabel::Default);
    }

    #[test]
    fn test_outcome_constructors() {
        assert_eq!(
            ModalOutcome::cancelled(),
            ModalOutcome {
                confirmed: false,
                values: None
            }
        );
        assert!(ModalOutcome::confirmed(None).confirmed);
    }
}
