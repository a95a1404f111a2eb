//! Mocked authentication.
//!
//! [`MockCredentials`] is a stand-in for a real identity provider: it accepts
//! exactly one configured credential pair and fabricates the user record. A
//! real deployment replaces this module wholesale.
//!
//! [`AuthRegistry`] is an explicit observer registry for auth state changes,
//! owned by the application state. Listeners are removed through their
//! [`Subscription`] handle instead of living in a module-level singleton.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

type Listener = Box<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: HashMap<u64, Listener>,
}

pub struct AuthRegistry {
    listeners: Mutex<Listeners>,
}

impl AuthRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            listeners: Mutex::new(Listeners::default()),
        })
    }

    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&AuthEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = self.listeners.lock().unwrap();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.by_id.insert(id, Box::new(listener));
        Subscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    pub fn notify(&self, event: &AuthEvent) {
        let listeners = self.listeners.lock().unwrap();
        for listener in listeners.by_id.values() {
            listener(event);
        }
    }

    fn remove(&self, id: u64) {
        self.listeners.lock().unwrap().by_id.remove(&id);
    }
}

/// Handle for one registered listener. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the listener.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<AuthRegistry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockCredentials {
    pub email: String,
    pub password: String,
}

impl MockCredentials {
    /// Constant-shape comparison is not a goal here; this is a placeholder,
    /// not a security boundary.
    pub fn verify(&self, email: &str, password: &str) -> Option<User> {
        if email != self.email || password != self.password {
            return None;
        }
        let name = email.split('@').next().unwrap_or(email).to_string();
        Some(User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name,
            role: "admin".to_string(),
        })
    }
}
