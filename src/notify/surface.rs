use std::cell::RefCell;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

use super::{NotificationSurface, PermissionState};

/// Rings the terminal bell and prints the reminder. Only usable when stdout
/// is an interactive terminal; otherwise notifications are unsupported.
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    supported: bool,
}

impl TerminalSurface {
    pub fn detect() -> Self {
        Self {
            supported: io::stdout().is_terminal(),
        }
    }
}

impl NotificationSurface for TerminalSurface {
    fn permission(&self) -> PermissionState {
        if self.supported {
            PermissionState::Granted
        } else {
            PermissionState::Unsupported
        }
    }

    fn request_permission(&mut self) -> PermissionState {
        self.permission()
    }

    fn show(&mut self, title: &str, body: &str, _icon: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "\x07{title}: {body}");
        let _ = stdout.flush();
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeliveredNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

#[derive(Debug)]
struct RecordingState {
    permission: PermissionState,
    answer: PermissionState,
    permission_requests: usize,
    delivered: Vec<DeliveredNotification>,
}

/// Captures deliveries instead of showing them. Clones share state, so a test
/// can keep one handle while the gateway owns another.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingSurface {
    pub fn granted() -> Self {
        Self::with_permission(PermissionState::Granted)
    }

    /// A surface whose permission is fixed at `permission`.
    pub fn with_permission(permission: PermissionState) -> Self {
        Self::build(permission, permission)
    }

    /// A surface that has not been asked yet and will answer `answer`.
    pub fn answering(answer: PermissionState) -> Self {
        Self::build(PermissionState::Denied, answer)
    }

    fn build(permission: PermissionState, answer: PermissionState) -> Self {
        Self {
            state: Rc::new(RefCell::new(RecordingState {
                permission,
                answer,
                permission_requests: 0,
                delivered: Vec::new(),
            })),
        }
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.state.borrow_mut().permission = permission;
    }

    pub fn delivered(&self) -> Vec<DeliveredNotification> {
        self.state.borrow().delivered.clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.state.borrow().permission_requests
    }
}

impl NotificationSurface for RecordingSurface {
    fn permission(&self) -> PermissionState {
        self.state.borrow().permission
    }

    fn request_permission(&mut self) -> PermissionState {
        let mut state = self.state.borrow_mut();
        state.permission_requests += 1;
        state.permission = state.answer;
        state.answer
    }

    fn show(&mut self, title: &str, body: &str, icon: &str) {
        self.state
            .borrow_mut()
            .delivered
            .push(DeliveredNotification {
                title: title.to_string(),
                body: body.to_string(),
                icon: icon.to_string(),
            });
    }
}
