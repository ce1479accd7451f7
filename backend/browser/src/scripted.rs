//! A scripted, in-memory browser for exercising the pipeline without Chrome.
//!
//! Snapshots are served from a queue in call order. Every element is
//! considered present unless marked missing; every call is recorded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::driver::{BrowserDriver, NodeRef};
use crate::error::DriverError;
use crate::locator::Locator;

/// A call received by a [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverAction {
    Navigate(String),
    Fill(Locator, String),
    Click(Locator),
    Find(Locator),
    Wait(Locator),
    Snapshot,
    Restart,
    Close,
}

#[derive(Default)]
struct Script {
    snapshots: VecDeque<String>,
    missing: HashSet<Locator>,
    /// Remaining lookups that fail before the locator resolves.
    flaky: HashMap<Locator, usize>,
    actions: Vec<DriverAction>,
    next_node: u64,
    closed: bool,
}

#[derive(Default)]
pub struct ScriptedDriver {
    script: Mutex<Script>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue markup returned by successive snapshot calls.
    pub fn with_snapshots<I, S>(self, snapshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .snapshots
            .extend(snapshots.into_iter().map(Into::into));
        self
    }

    /// Make `locator` never resolve.
    pub fn with_missing(self, locator: Locator) -> Self {
        self.lock().missing.insert(locator);
        self
    }

    /// Make the next `misses` lookups of `locator` fail.
    pub fn with_flaky(self, locator: Locator, misses: usize) -> Self {
        self.lock().flaky.insert(locator, misses);
        self
    }

    /// Calls received so far, in order.
    pub fn actions(&self) -> Vec<DriverAction> {
        self.lock().actions.clone()
    }

    pub fn count(&self, pred: impl Fn(&DriverAction) -> bool) -> usize {
        self.lock().actions.iter().filter(|a| pred(a)).count()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn remaining_snapshots(&self) -> usize {
        self.lock().snapshots.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A poisoned script only happens after a panicking test.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `action` and fail if the session was closed.
    fn record(&self, action: DriverAction) -> Result<MutexGuard<'_, Script>, DriverError> {
        let mut script = self.lock();
        if script.closed {
            return Err(DriverError::SessionClosed);
        }
        script.actions.push(action);
        Ok(script)
    }

    fn resolve(script: &mut Script, locator: &Locator) -> Option<NodeRef> {
        if script.missing.contains(locator) {
            return None;
        }
        if let Some(misses) = script.flaky.get_mut(locator) {
            if *misses > 0 {
                *misses -= 1;
                return None;
            }
        }
        script.next_node += 1;
        Some(NodeRef {
            id: format!("node-{}", script.next_node),
            locator: locator.clone(),
        })
    }

    fn not_found(locator: &Locator) -> DriverError {
        DriverError::ElementNotFound {
            locator: locator.to_string(),
        }
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.record(DriverAction::Navigate(url.to_string()))?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<(), DriverError> {
        let mut script = self.record(DriverAction::Fill(locator.clone(), text.to_string()))?;
        Self::resolve(&mut script, locator)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(locator))
    }

    async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        let mut script = self.record(DriverAction::Click(locator.clone()))?;
        Self::resolve(&mut script, locator)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(locator))
    }

    async fn find_element(&self, locator: &Locator) -> Result<NodeRef, DriverError> {
        let mut script = self.record(DriverAction::Find(locator.clone()))?;
        Self::resolve(&mut script, locator).ok_or_else(|| Self::not_found(locator))
    }

    /// Resolves immediately; a missing element times out without sleeping.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<NodeRef, DriverError> {
        let mut script = self.record(DriverAction::Wait(locator.clone()))?;
        Self::resolve(&mut script, locator).ok_or_else(|| DriverError::WaitTimeout {
            locator: locator.to_string(),
            timeout,
        })
    }

    async fn current_markup_snapshot(&self) -> Result<String, DriverError> {
        let mut script = self.record(DriverAction::Snapshot)?;
        script.snapshots.pop_front().ok_or_else(|| DriverError::Protocol {
            detail: "no snapshot scripted".into(),
        })
    }

    async fn restart_session(&mut self) -> Result<(), DriverError> {
        self.record(DriverAction::Restart)?;
        Ok(())
    }

    async fn close_session(&mut self) -> Result<(), DriverError> {
        let mut script = self.lock();
        script.actions.push(DriverAction::Close);
        script.closed = true;
        Ok(())
    }
}
