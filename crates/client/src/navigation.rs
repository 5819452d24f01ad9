//! Navigation seam between the session core and whatever hosts the UI.

use std::sync::Mutex;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Where the user currently is, and a way to send them elsewhere.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn redirect(&self, path: &str);
}

/// Navigator that only records where it was sent.
#[derive(Debug)]
pub struct MemoryNavigator {
    inner: Mutex<NavState>,
}

#[derive(Debug)]
struct NavState {
    current: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(NavState {
                current: start.into(),
                history: Vec::new(),
            }),
        }
    }

    /// Every redirect so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|nav| nav.history.clone())
            .unwrap_or_default()
    }

    /// Simulate the user moving to `path` on their own.
    pub fn visit(&self, path: impl Into<String>) {
        if let Ok(mut nav) = self.inner.lock() {
            nav.current = path.into();
        }
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.inner
            .lock()
            .map(|nav| nav.current.clone())
            .unwrap_or_default()
    }

    fn redirect(&self, path: &str) {
        if let Ok(mut nav) = self.inner.lock() {
            nav.current = path.to_string();
            nav.history.push(path.to_string());
        }
    }
}

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, as browsers encode a
/// URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Login route carrying `current` as the return target.
///
/// Being on the login page already yields the bare login route, so repeated
/// expiries never nest `returnUrl`.
pub fn sign_in_redirect(current: &str, login_route: &str) -> String {
    let base = current.split(['?', '#']).next().unwrap_or(current);
    if current.is_empty() || base == login_route {
        return login_route.to_string();
    }
    let encoded = utf8_percent_encode(current, URI_COMPONENT);
    format!("{login_route}?returnUrl={encoded}")
}
