//! Form field descriptors and the bound controls rendered inside modal forms.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::validators::validate_required;

/// Row count for textarea fields that don't ask for one.
pub const DEFAULT_TEXTAREA_ROWS: u16 = 4;

/// Maximum length of a `YYYY-MM-DD` date value.
const DATE_INPUT_LEN: usize = 10;

/// One entry of a select field: what the user sees and what the form returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The closed set of control kinds a form field can render as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line input.
    Text,
    /// Multi-line input with a fixed number of visible rows.
    Textarea { rows: u16 },
    /// Option cycler.
    Select { options: Vec<SelectOption> },
    /// `YYYY-MM-DD` input.
    Date,
}

/// Declarative description of one form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Key of this field in the returned values. Unique within a request.
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
    /// Static caption shown under the control.
    pub description: Option<String>,
    pub required: bool,
    pub initial_value: Option<String>,
}

impl FieldDescriptor {
    fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            placeholder: None,
            description: None,
            required: false,
            initial_value: None,
        }
    }

    pub fn text(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn textarea(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Textarea {
                rows: DEFAULT_TEXTAREA_ROWS,
            },
        )
    }

    pub fn select(
        name: impl Into<String>,
        label: impl Into<String>,
        options: Vec<SelectOption>,
    ) -> Self {
        Self::new(name, label, FieldKind::Select { options })
    }

    pub fn date(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn initial_value(mut self, value: impl Into<String>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Set the visible row count. Only meaningful for textareas; other kinds are left as is.
    pub fn rows(mut self, rows: u16) -> Self {
        if let FieldKind::Textarea { rows: r } = &mut self.kind {
            *r = rows.max(1);
        }
        self
    }
}

/// Byte offset of the `char_idx`-th character, or the string length past the end.
fn byte_offset(value: &str, char_idx: usize) -> usize {
    value
        .char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(value.len())
}

/// Char range of the line holding `cursor`, without its newline.
fn line_bounds(value: &str, cursor: usize) -> (usize, usize) {
    let mut start = 0;
    for line in value.split('\n') {
        let end = start + line.chars().count();
        if cursor <= end {
            return (start, end);
        }
        start = end + 1;
    }
    (start, start)
}

/// A field descriptor bound to its live value and error state.
#[derive(Debug, Clone)]
pub struct FieldControl {
    descriptor: FieldDescriptor,
    /// Current text for text-like kinds. Unused for selects.
    text: String,
    /// Cursor position in characters.
    cursor: usize,
    /// Selected option index for selects.
    selected: usize,
    /// Whether the error caption is visible. Set by a failed confirm, cleared by the next edit.
    error_visible: bool,
}

impl FieldControl {
    pub fn new(descriptor: FieldDescriptor) -> Self {
        let initial = descriptor.initial_value.clone().unwrap_or_default();
        let selected = match &descriptor.kind {
            FieldKind::Select { options } => options
                .iter()
                .position(|o| o.value == initial)
                .unwrap_or(0),
            _ => 0,
        };
        let text = match descriptor.kind {
            FieldKind::Select { .. } => String::new(),
            _ => initial,
        };
        Self {
            cursor: text.chars().count(),
            descriptor,
            text,
            selected,
            error_visible: false,
        }
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Raw current value, untrimmed.
    pub fn value(&self) -> &str {
        match &self.descriptor.kind {
            FieldKind::Select { options } => options
                .get(self.selected)
                .map(|o| o.value.as_str())
                .unwrap_or(""),
            _ => &self.text,
        }
    }

    /// Label of the selected option, for select fields.
    pub fn selected_label(&self) -> Option<&str> {
        match &self.descriptor.kind {
            FieldKind::Select { options } => options.get(self.selected).map(|o| o.label.as_str()),
            _ => None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error(&self) -> Option<String> {
        if !self.error_visible {
            return None;
        }
        self.validation_error()
    }

    #[cfg(test)]
    pub fn is_error_visible(&self) -> bool {
        self.error_visible
    }

    fn validation_error(&self) -> Option<String> {
        if self.descriptor.required {
            validate_required(self.value())
        } else {
            None
        }
    }

    /// Validate the current value, revealing the error caption when invalid.
    /// Returns true if the field is valid.
    pub fn validate(&mut self) -> bool {
        let valid = self.validation_error().is_none();
        if !valid {
            self.error_visible = true;
        }
        valid
    }

    /// Whether Enter inside this control submits the surrounding form.
    pub fn submits_on_enter(&self) -> bool {
        matches!(self.descriptor.kind, FieldKind::Text | FieldKind::Date)
    }

    /// Apply a key to the control. Returns true if the value changed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let option_count = match &self.descriptor.kind {
            FieldKind::Select { options } => Some(options.len()),
            _ => None,
        };
        let changed = match option_count {
            Some(len) => self.handle_select_key(key, len),
            None => self.handle_text_key(key),
        };
        if changed {
            self.error_visible = false;
        }
        changed
    }

    fn handle_select_key(&mut self, key: &KeyEvent, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let before = self.selected;
        match key.code {
            KeyCode::Left | KeyCode::Up => {
                self.selected = if self.selected == 0 {
                    len - 1
                } else {
                    self.selected - 1
                };
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => {
                self.selected = (self.selected + 1) % len;
            }
            _ => {}
        }
        before != self.selected
    }

    fn handle_text_key(&mut self, key: &KeyEvent) -> bool {
        let len = self.text.chars().count();
        let multiline = matches!(self.descriptor.kind, FieldKind::Textarea { .. });
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(c)
            }
            KeyCode::Enter if multiline => self.insert_char('\n'),
            KeyCode::Up if multiline => {
                self.move_line(false);
                false
            }
            KeyCode::Down if multiline => {
                self.move_line(true);
                false
            }
            KeyCode::Home if multiline => {
                self.cursor = line_bounds(&self.text, self.cursor).0;
                false
            }
            KeyCode::End if multiline => {
                self.cursor = line_bounds(&self.text, self.cursor).1;
                false
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let at = byte_offset(&self.text, self.cursor - 1);
                self.text.remove(at);
                self.cursor -= 1;
                true
            }
            KeyCode::Delete if self.cursor < len => {
                let at = byte_offset(&self.text, self.cursor);
                self.text.remove(at);
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(len);
                false
            }
            KeyCode::Home => {
                self.cursor = 0;
                false
            }
            KeyCode::End => {
                self.cursor = len;
                false
            }
            _ => false,
        }
    }

    /// Move the cursor to the same column on the line above or below.
    fn move_line(&mut self, down: bool) {
        let (start, end) = line_bounds(&self.text, self.cursor);
        let column = self.cursor - start;
        let target = if down {
            if end >= self.text.chars().count() {
                return;
            }
            end + 1
        } else {
            if start == 0 {
                return;
            }
            start - 1
        };
        let (start, end) = line_bounds(&self.text, target);
        self.cursor = (start + column).min(end);
    }

    fn insert_char(&mut self, c: char) -> bool {
        if self.descriptor.kind == FieldKind::Date
            && (!(c.is_ascii_digit() || c == '-') || self.text.len() >= DATE_INPUT_LEN)
        {
            return false;
        }
        let at = byte_offset(&self.text, self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(control: &mut FieldControl, s: &str) {
        for c in s.chars() {
            control.handle_key(&key(KeyCode::Char(c)));
        }
    }

    fn priority_options() -> Vec<SelectOption> {
        vec![
            SelectOption::new("Low", "low"),
            SelectOption::new("Medium", "medium"),
            SelectOption::new("High", "high"),
        ]
    }

    #[test]
    fn test_initial_value_prefills_text() {
        let control = FieldControl::new(FieldDescriptor::text("name", "Name").initial_value("Milk"));
        assert_eq!(control.value(), "Milk");
        assert_eq!(control.cursor(), 4);
    }

    #[test]
    fn test_untouched_field_value_is_empty() {
        let control = FieldControl::new(FieldDescriptor::text("name", "Name"));
        assert_eq!(control.value(), "");
    }

    #[test]
    fn test_select_preselects_initial_value() {
        let control = FieldControl::new(
            FieldDescriptor::select("priority", "Priority", priority_options())
                .initial_value("high"),
        );
        assert_eq!(control.value(), "high");
        assert_eq!(control.selected_label(), Some("High"));
    }

    #[test]
    fn test_select_defaults_to_first_option() {
        let control = FieldControl::new(FieldDescriptor::select(
            "priority",
            "Priority",
            priority_options(),
        ));
        assert_eq!(control.value(), "low");
    }

    #[test]
    fn test_select_cycles_with_wraparound() {
        let mut control = FieldControl::new(FieldDescriptor::select(
            "priority",
            "Priority",
            priority_options(),
        ));
        assert!(control.handle_key(&key(KeyCode::Left)));
        assert_eq!(control.value(), "high");
        assert!(control.handle_key(&key(KeyCode::Right)));
        assert_eq!(control.value(), "low");
    }

    #[test]
    fn test_required_blank_fails_and_shows_error() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name").required());
        assert!(control.error().is_none());
        assert!(!control.validate());
        assert!(control.is_error_visible());
        assert_eq!(control.error().as_deref(), Some("This field is required"));
    }

    #[test]
    fn test_required_whitespace_only_is_invalid() {
        let mut control =
            FieldControl::new(FieldDescriptor::text("name", "Name").required().initial_value("   "));
        assert!(!control.validate());
    }

    #[test]
    fn test_optional_blank_is_valid() {
        let mut control = FieldControl::new(FieldDescriptor::text("notes", "Notes"));
        assert!(control.validate());
        assert!(!control.is_error_visible());
    }

    #[test]
    fn test_error_sticky_until_input() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name").required());
        control.validate();
        // Cursor movement is not an input event
        control.handle_key(&key(KeyCode::Left));
        assert!(control.is_error_visible());
        control.handle_key(&key(KeyCode::Char('B')));
        assert!(!control.is_error_visible());
    }

    #[test]
    fn test_error_hidden_even_if_edit_leaves_value_invalid() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name").required());
        control.validate();
        control.handle_key(&key(KeyCode::Char(' ')));
        assert!(!control.is_error_visible());
    }

    #[test]
    fn test_value_is_not_trimmed() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name"));
        type_str(&mut control, "  Buy milk ");
        assert_eq!(control.value(), "  Buy milk ");
    }

    #[test]
    fn test_editing_in_the_middle_is_char_aware() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name").initial_value("café"));
        control.handle_key(&key(KeyCode::Backspace));
        assert_eq!(control.value(), "caf");
        control.handle_key(&key(KeyCode::Home));
        control.handle_key(&key(KeyCode::Delete));
        assert_eq!(control.value(), "af");
        control.handle_key(&key(KeyCode::Char('ß')));
        assert_eq!(control.value(), "ßaf");
        assert_eq!(control.cursor(), 1);
    }

    #[test]
    fn test_date_accepts_only_date_characters() {
        let mut control = FieldControl::new(FieldDescriptor::date("due", "Due"));
        type_str(&mut control, "2025-1x0-10-99");
        assert_eq!(control.value(), "2025-10-10");
    }

    #[test]
    fn test_enter_inserts_newline_only_in_textarea() {
        let mut area = FieldControl::new(FieldDescriptor::textarea("notes", "Notes"));
        type_str(&mut area, "a");
        assert!(area.handle_key(&key(KeyCode::Enter)));
        assert_eq!(area.value(), "a\n");
        assert!(!area.submits_on_enter());

        let mut text = FieldControl::new(FieldDescriptor::text("name", "Name"));
        assert!(!text.handle_key(&key(KeyCode::Enter)));
        assert!(text.submits_on_enter());
    }

    #[test]
    fn test_line_bounds() {
        let text = "first line\nab\nthird";
        assert_eq!(line_bounds(text, 0), (0, 10));
        assert_eq!(line_bounds(text, 10), (0, 10));
        assert_eq!(line_bounds(text, 11), (11, 13));
        assert_eq!(line_bounds(text, 19), (14, 19));
        assert_eq!(line_bounds("", 0), (0, 0));
    }

    #[test]
    fn test_textarea_navigates_by_line() {
        let mut area = FieldControl::new(
            FieldDescriptor::textarea("notes", "Notes").initial_value("first line\nab\nthird"),
        );
        assert_eq!(area.cursor(), 19);

        // Column is clamped to the shorter line
        area.handle_key(&key(KeyCode::Up));
        assert_eq!(area.cursor(), 13);
        area.handle_key(&key(KeyCode::Home));
        assert_eq!(area.cursor(), 11);
        area.handle_key(&key(KeyCode::End));
        assert_eq!(area.cursor(), 13);
        area.handle_key(&key(KeyCode::Up));
        assert_eq!(area.cursor(), 2);
        area.handle_key(&key(KeyCode::Up));
        assert_eq!(area.cursor(), 2);
        area.handle_key(&key(KeyCode::Down));
        area.handle_key(&key(KeyCode::Down));
        assert_eq!(area.cursor(), 16);
        area.handle_key(&key(KeyCode::Down));
        assert_eq!(area.cursor(), 16);
        assert_eq!(area.value(), "first line\nab\nthird");
    }

    #[test]
    fn test_home_end_span_whole_value_in_text_field() {
        let mut text =
            FieldControl::new(FieldDescriptor::text("name", "Name").initial_value("abc"));
        text.handle_key(&key(KeyCode::Home));
        assert_eq!(text.cursor(), 0);
        text.handle_key(&key(KeyCode::Up));
        assert_eq!(text.cursor(), 0);
        text.handle_key(&key(KeyCode::End));
        assert_eq!(text.cursor(), 3);
    }

    #[test]
    fn test_rows_only_applies_to_textarea() {
        let area = FieldDescriptor::textarea("notes", "Notes").rows(6);
        assert_eq!(area.kind, FieldKind::Textarea { rows: 6 });
        let text = FieldDescriptor::text("name", "Name").rows(6);
        assert_eq!(text.kind, FieldKind::Text);
    }

    #[test]
    fn test_control_modified_chars_are_ignored() {
        let mut control = FieldControl::new(FieldDescriptor::text("name", "Name"));
        let changed = control.handle_key(&KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL));
        assert!(!changed);
        assert_eq!(control.value(), "");
    }
}
