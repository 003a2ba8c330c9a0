//! Dynamic command registry.
//!
//! Every command the shell knows about is preregistered once at startup.
//! Session events then move names between the preregistered and registered
//! states; only registered commands can run.

use std::collections::HashMap;
use std::rc::Rc;

use crate::catalog::Handler;

/// Lifecycle state of a command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistrationStatus {
    /// Never preregistered.
    NotRegistered,
    /// Known, but not runnable in the current session state.
    Preregistered,
    /// Runnable.
    Registered,
}

/// Registry of command handlers and their registration status.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Rc<Handler>>,
    statuses: HashMap<String, RegistrationStatus>,
    /// Names made available permanently at startup.
    base: Vec<String>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a handler known under its command name without registering it.
    ///
    /// Handlers without a name, or whose name is already known, are
    /// rejected and the registry is left untouched.
    pub fn preregister(&mut self, handler: Handler) {
        let name = handler.name().to_string();
        if name.is_empty() {
            log::warn!("cannot preregister a handler without a name");
            return;
        }
        if self.handlers.contains_key(&name) {
            log::warn!("cannot preregister '{name}': already known");
            return;
        }
        log::debug!("preregister '{name}'");
        self.handlers.insert(name.clone(), Rc::new(handler));
        self.statuses.insert(name, RegistrationStatus::Preregistered);
    }

    /// Move a preregistered name to registered.
    ///
    /// Names that were never preregistered are ignored.
    pub fn register(&mut self, name: &str) {
        match self.statuses.get_mut(name) {
            Some(RegistrationStatus::Registered) => {
                log::warn!("register '{name}': already registered");
            },
            Some(status) => {
                log::debug!("register '{name}'");
                *status = RegistrationStatus::Registered;
            },
            None => log::warn!("cannot register '{name}': command was never preregistered"),
        }
    }

    /// Move a registered name back to preregistered.
    ///
    /// Names that were never preregistered are ignored.
    pub fn deregister(&mut self, name: &str) {
        match self.statuses.get_mut(name) {
            Some(status) if *status == RegistrationStatus::Registered => {
                log::debug!("deregister '{name}'");
                *status = RegistrationStatus::Preregistered;
            },
            Some(_) => log::warn!("deregister '{name}': not registered"),
            None => log::warn!("cannot deregister '{name}': command was never preregistered"),
        }
    }

    /// Apply the transition into `status` to every handler.
    ///
    /// `Preregistered` preregisters each handler; `Registered` registers each
    /// handler's name, which must already be known.
    pub fn batch_registration(&mut self, handlers: Vec<Handler>, status: RegistrationStatus) {
        for handler in handlers {
            match status {
                RegistrationStatus::Preregistered => self.preregister(handler),
                RegistrationStatus::Registered => self.register(handler.name()),
                RegistrationStatus::NotRegistered => {
                    log::error!("cannot batch '{}' into the unregistered state", handler.name())
                },
            }
        }
    }

    /// Preregister and register `handlers`, remembering them as base commands.
    pub fn preregister_base(&mut self, handlers: Vec<Handler>) {
        for handler in handlers {
            let name = handler.name().to_string();
            self.preregister(handler);
            self.register(&name);
            if !self.base.contains(&name) {
                self.base.push(name);
            }
        }
    }

    /// Deregister every registered non-base name; base commands end up
    /// registered whatever their state was.
    pub fn deregister_non_base_commands(&mut self) {
        let registered: Vec<String> = self
            .statuses
            .iter()
            .filter(|(name, status)| {
                **status == RegistrationStatus::Registered && !self.is_base(name)
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in &registered {
            self.deregister(name);
        }
        for name in self.base.clone() {
            if self.status(&name) != RegistrationStatus::Registered {
                self.register(&name);
            }
        }
    }

    /// Current status of `name`.
    pub fn status(&self, name: &str) -> RegistrationStatus {
        self.statuses
            .get(name)
            .copied()
            .unwrap_or(RegistrationStatus::NotRegistered)
    }

    /// The handler for `name` paired with its status, if the name is known.
    pub fn exists(&self, name: &str) -> Option<(Rc<Handler>, RegistrationStatus)> {
        let handler = self.handlers.get(name)?;
        Some((Rc::clone(handler), self.status(name)))
    }

    fn is_base(&self, name: &str) -> bool {
        self.base.iter().any(|b| b == name)
    }

    /// Handlers sorted by priority then name.
    ///
    /// Only registered handlers unless `include_unregistered` is set.
    pub fn registered_handlers(&self, include_unregistered: bool) -> Vec<Rc<Handler>> {
        let mut handlers: Vec<Rc<Handler>> = self
            .handlers
            .iter()
            .filter(|(name, _)| {
                include_unregistered || self.status(name) == RegistrationStatus::Registered
            })
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        handlers.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });
        handlers
    }
}
