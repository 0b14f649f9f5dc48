//! Modal dialog coordinator.
//!
//! A [`ModalCoordinator`] serializes every dialog of a session through one host
//! layer: at most one panel is mounted at a time, later requests wait in a FIFO
//! queue, and each request's outcome is delivered exactly once over its own
//! one-shot channel. [`Modals`] is the cloneable handle the rest of the app uses.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;

use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::Frame;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::focus::{FocusTarget, FocusTrap, TrapAction};
use crate::modal_ui::draw_modal;
use crate::panel::{ClickTarget, ModalPanel, PanelAction, ResolvedRequest};
use crate::request::{CancelLabel, DialogKind, ModalOutcome, ModalRequest};

/// Identifier of the host layer.
pub const HOST_ID: &str = "modal-root";

/// Politeness of the host's announcements.
const HOST_LIVE: &str = "assertive";

/// Identifies a focusable element of the page behind the modals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FocusId(String);

impl FocusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifies one dialog invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModalId(u64);

/// Page state the coordinator touches: which element has focus and whether
/// the page may scroll.
#[derive(Debug, Default)]
pub struct Document {
    pub active_element: Option<FocusId>,
    pub scroll_locked: bool,
}

/// The single layer modal panels are mounted into.
#[derive(Debug)]
pub struct ModalHost {
    id: &'static str,
    mounted: Option<ModalPanel>,
}

impl ModalHost {
    fn new() -> Self {
        debug!(host = HOST_ID, live = HOST_LIVE, "modal_host_created");
        Self {
            id: HOST_ID,
            mounted: None,
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> &str {
        self.id
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.mounted.is_none()
    }

    pub fn panel(&self) -> Option<&ModalPanel> {
        self.mounted.as_ref()
    }

    fn mount(&mut self, panel: ModalPanel) {
        info!(host = self.id, live = HOST_LIVE, title = panel.title(), "modal_announced");
        self.mounted = Some(panel);
    }

    fn unmount(&mut self) {
        self.mounted = None;
    }
}

/// The dialog currently on screen.
#[derive(Debug)]
struct ActiveModal {
    id: ModalId,
    kind: DialogKind,
    resolver: Option<oneshot::Sender<ModalOutcome>>,
    trap: Option<FocusTrap>,
}

/// A dialog waiting for the active one to close.
#[derive(Debug)]
struct PendingModal {
    id: ModalId,
    kind: DialogKind,
    request: ModalRequest,
    resolver: oneshot::Sender<ModalOutcome>,
}

/// Apply the per-entry-point defaults before the panel resolves the rest.
fn apply_entry_defaults(kind: DialogKind, mut request: ModalRequest) -> ModalRequest {
    match kind {
        DialogKind::Alert => {
            request = request.hide_cancel();
            if request.confirm_label.is_none() {
                request.confirm_label = Some("Close".to_string());
            }
        }
        DialogKind::Confirm => {
            if request.confirm_label.is_none() {
                request.confirm_label = Some("Confirm".to_string());
            }
            if request.cancel_label == CancelLabel::Default {
                request.cancel_label = CancelLabel::Label("Cancel".to_string());
            }
        }
        DialogKind::Form => request.ensure_form(),
    }
    request
}

/// Whether closing a modal should hand focus back to the page. Focus stays
/// with the modal layer while a queued successor is about to open.
pub fn should_restore_focus(queued: usize) -> bool {
    queued == 0
}

/// Owns the active modal, the queue of pending ones and the host layer.
#[derive(Debug, Default)]
pub struct ModalCoordinator {
    active: Option<ActiveModal>,
    queue: VecDeque<PendingModal>,
    host: Option<ModalHost>,
    document: Document,
    /// Page focus captured before the first modal of the current run.
    saved_focus: Option<FocusId>,
    next_id: u64,
}

impl ModalCoordinator {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a dialog now, or queue it behind the active one.
    pub fn open(
        &mut self,
        kind: DialogKind,
        request: ModalRequest,
    ) -> (ModalId, oneshot::Receiver<ModalOutcome>) {
        let (resolver, receiver) = oneshot::channel();
        let id = ModalId(self.next_id);
        self.next_id += 1;

        let pending = PendingModal {
            id,
            kind,
            request: apply_entry_defaults(kind, request),
            resolver,
        };

        if self.active.is_some() {
            self.queue.push_back(pending);
            debug!(modal_id = id.0, queued = self.queue.len(), "modal_queued");
        } else {
            self.start(pending);
        }
        (id, receiver)
    }

    fn start(&mut self, pending: PendingModal) {
        let PendingModal {
            id,
            kind,
            request,
            resolver,
        } = pending;
        let dismissible = request.dismissible;
        let mut panel = ModalPanel::build(ResolvedRequest::resolve(request));

        if self.saved_focus.is_none() {
            self.saved_focus = self.document.active_element.take();
        }

        let trap = FocusTrap::activate(&panel.focusables(), dismissible);
        panel.set_focus(trap.as_ref().map(FocusTrap::first));

        info!(
            modal_id = id.0,
            kind = kind.name(),
            title = panel.title(),
            fields = panel.controls().len(),
            "modal_opened"
        );

        self.host.get_or_insert_with(ModalHost::new).mount(panel);
        self.document.scroll_locked = true;
        self.active = Some(ActiveModal {
            id,
            kind,
            resolver: Some(resolver),
            trap,
        });
    }

    /// Attempt to confirm the active modal. Forms are validated first; a
    /// failed validation keeps the modal open and returns false.
    pub fn submit(&mut self, id: ModalId) -> bool {
        if self.active_id() != Some(id) {
            return false;
        }
        let Some(panel) = self.panel_mut() else {
            return false;
        };
        let values = if panel.is_form() {
            if !panel.validate() {
                debug!(modal_id = id.0, "modal_validation_failed");
                return false;
            }
            Some(panel.values())
        } else {
            None
        };
        self.finish(id, ModalOutcome::confirmed(values))
    }

    /// Cancel the active modal.
    pub fn cancel(&mut self, id: ModalId) -> bool {
        self.finish(id, ModalOutcome::cancelled())
    }

    fn finish(&mut self, id: ModalId, outcome: ModalOutcome) -> bool {
        let Some(mut active) = self.active.take_if(|a| a.id == id) else {
            return false;
        };

        info!(
            modal_id = id.0,
            kind = active.kind.name(),
            confirmed = outcome.confirmed,
            "modal_resolved"
        );
        if let Some(resolver) = active.resolver.take()
            && resolver.send(outcome).is_err()
        {
            debug!(modal_id = id.0, "modal_receiver_dropped");
        }

        if let Some(trap) = &mut active.trap {
            trap.release();
        }
        self.close();
        true
    }

    /// Tear down the mounted panel and start the next queued modal, if any.
    fn close(&mut self) {
        if let Some(host) = &mut self.host {
            host.unmount();
        }
        self.document.scroll_locked = false;

        if should_restore_focus(self.queue.len())
            && let Some(focus) = self.saved_focus.take()
        {
            self.document.active_element = Some(focus);
        }

        if let Some(next) = self.queue.pop_front() {
            self.start(next);
        }
    }

    /// Handle a key while a modal is active. Returns false when no modal is
    /// active; otherwise the key is consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let Some(id) = self.active_id() else {
            return false;
        };
        let current = self.panel().and_then(ModalPanel::focus);
        let trap_action = self
            .trap()
            .map(|trap| trap.handle_key(current, key))
            .unwrap_or(TrapAction::Ignored);

        match trap_action {
            TrapAction::Moved(target) => {
                if let Some(panel) = self.panel_mut() {
                    panel.set_focus(Some(target));
                }
            }
            TrapAction::DismissRequested => {
                self.cancel(id);
            }
            TrapAction::Suppressed => {}
            TrapAction::Ignored => {
                let action = self
                    .panel_mut()
                    .map(|panel| panel.handle_key(key))
                    .unwrap_or(PanelAction::None);
                match action {
                    PanelAction::Submit => {
                        self.submit(id);
                    }
                    PanelAction::Cancel => {
                        self.cancel(id);
                    }
                    PanelAction::None => {}
                }
            }
        }
        true
    }

    /// Handle a mouse event while a modal is active. Returns false when no
    /// modal is active; otherwise the event is consumed.
    pub fn handle_mouse(&mut self, mouse: &MouseEvent) -> bool {
        let Some(id) = self.active_id() else {
            return false;
        };
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return true;
        }
        let Some(panel) = self.panel() else {
            return true;
        };
        let dismissible = panel.is_dismissible();

        match panel.hit_test(mouse.column, mouse.row) {
            ClickTarget::Backdrop if dismissible => {
                self.cancel(id);
            }
            ClickTarget::ConfirmButton => {
                self.submit(id);
            }
            ClickTarget::CancelButton => {
                self.cancel(id);
            }
            ClickTarget::Field(i) => {
                let target = FocusTarget::Field(i);
                let trapped = self.trap().is_some_and(|trap| trap.contains(target));
                if trapped && let Some(panel) = self.panel_mut() {
                    panel.set_focus(Some(target));
                }
            }
            ClickTarget::Backdrop | ClickTarget::Panel => {}
        }
        true
    }

    /// Draw the mounted panel, if any, over whatever is already in the frame.
    pub fn draw(&mut self, f: &mut Frame) {
        if let Some(panel) = self.host.as_mut().and_then(|h| h.mounted.as_mut()) {
            draw_modal(f, panel);
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<ModalId> {
        self.active.as_ref().map(|a| a.id)
    }

    #[cfg(test)]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn trap(&self) -> Option<&FocusTrap> {
        self.active.as_ref().and_then(|a| a.trap.as_ref())
    }

    /// Whether the active modal has a live focus trap.
    #[cfg(test)]
    pub fn is_trap_active(&self) -> bool {
        self.trap().is_some_and(FocusTrap::is_active)
    }

    #[cfg(test)]
    pub fn host(&self) -> Option<&ModalHost> {
        self.host.as_ref()
    }

    pub fn panel(&self) -> Option<&ModalPanel> {
        self.host.as_ref().and_then(ModalHost::panel)
    }

    fn panel_mut(&mut self) -> Option<&mut ModalPanel> {
        self.host.as_mut().and_then(|h| h.mounted.as_mut())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.document.scroll_locked
    }

    /// Focus an element of the page. Ignored while a modal holds focus.
    pub fn focus_page(&mut self, id: FocusId) {
        if self.active.is_none() {
            self.document.active_element = Some(id);
        }
    }
}

/// Cloneable handle to the session's coordinator.
///
/// `alert`, `confirm` and `form` open their dialog immediately (or queue it)
/// and return a future that resolves once the user closes that dialog.
#[derive(Debug, Clone, Default)]
pub struct Modals {
    inner: Rc<RefCell<ModalCoordinator>>,
}

impl Modals {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self, kind: DialogKind, request: ModalRequest) -> oneshot::Receiver<ModalOutcome> {
        let (_, receiver) = self.inner.borrow_mut().open(kind, request);
        receiver
    }

    /// Show a notice with a single button.
    pub fn alert(&self, request: ModalRequest) -> impl Future<Output = ()> + use<> {
        let receiver = self.open(DialogKind::Alert, request);
        async move {
            let _ = receiver.await;
        }
    }

    /// Ask a yes/no question. Resolves to true only if the user confirmed.
    pub fn confirm(&self, request: ModalRequest) -> impl Future<Output = bool> + use<> {
        let receiver = self.open(DialogKind::Confirm, request);
        async move { receiver.await.map(|o| o.confirmed).unwrap_or(false) }
    }

    /// Show a form. Resolves to the field values, or `None` if cancelled.
    pub fn form(
        &self,
        request: ModalRequest,
    ) -> impl Future<Output = Option<HashMap<String, String>>> + use<> {
        let receiver = self.open(DialogKind::Form, request);
        async move {
            receiver
                .await
                .ok()
                .filter(|o| o.confirmed)
                .and_then(|o| o.values)
        }
    }

    pub fn handle_key(&self, key: &KeyEvent) -> bool {
        self.inner.borrow_mut().handle_key(key)
    }

    pub fn handle_mouse(&self, mouse: &MouseEvent) -> bool {
        self.inner.borrow_mut().handle_mouse(mouse)
    }

    pub fn draw(&self, f: &mut Frame) {
        self.inner.borrow_mut().draw(f);
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.inner.borrow().is_active()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.inner.borrow().is_scroll_locked()
    }

    #[cfg(test)]
    pub fn queue_len(&self) -> usize {
        self.inner.borrow().queue_len()
    }

    pub fn page_focus(&self) -> Option<FocusId> {
        self.inner.borrow().document().active_element.clone()
    }

    pub fn focus_page(&self, id: FocusId) {
        self.inner.borrow_mut().focus_page(id);
    }

    /// Title of the mounted panel, if any.
    #[cfg(test)]
    pub fn active_title(&self) -> Option<String> {
        self.inner.borrow().panel().map(|p| p.title().to_string())
    }
}
