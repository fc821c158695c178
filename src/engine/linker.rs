//! The link engine: learn protocol, lookup and dispatch

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::dispatch::{dispatch, Effect};
use super::error::LinkError;
use super::key::BindingKey;
use super::learn::LearnQueue;
use super::table::LinkTable;
use crate::focus::Linkable;
use crate::ingest::{IngestQueue, IngestSender};
use crate::midi::InboundMessage;
use crate::params::{ParamHandle, Parameter};

/// Result of processing one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Key of the control that sent the message
    pub key: BindingKey,
    /// Path of the parameter this message just bound, if it completed a learn request
    pub learned: Option<String>,
    /// What happened to the bound parameter
    pub effect: Effect,
}

/// Owns the link table, learn queue and ingestion queue
///
/// Lives entirely in the processing context; the MIDI callback only gets the
/// [`IngestSender`] returned by [`LinkEngine::new`].
#[derive(Debug)]
pub struct LinkEngine {
    queue: IngestQueue,
    links: LinkTable,
    learn: LearnQueue,
    /// Last value seen per control, for slider sweep detection
    last_values: HashMap<BindingKey, u8>,
}

impl LinkEngine {
    /// Create an engine and the sender that feeds it
    pub fn new() -> (IngestSender, Self) {
        let (tx, queue) = IngestQueue::new();
        let engine = Self {
            queue,
            links: LinkTable::new(),
            learn: LearnQueue::new(),
            last_values: HashMap::new(),
        };
        (tx, engine)
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn learn_queue(&self) -> &LearnQueue {
        &self.learn
    }

    /// Messages waiting for the next tick
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Queue `param` to be bound to the next unbound control that moves
    pub fn request_link(&mut self, param: &Arc<Parameter>) -> Result<(), LinkError> {
        let kind = param.kind();
        if !kind.is_linkable() {
            return Err(LinkError::UnsupportedParameterType {
                name: param.path().to_string(),
                kind,
            });
        }

        info!(
            "🎛️  Waiting for a control to link to '{}' ({} pending)",
            param.path(),
            self.learn.len() + 1
        );
        self.learn.push(param.handle());
        Ok(())
    }

    /// Queue whatever parameter the focused element exposes
    ///
    /// Returns `Ok(false)` when nothing linkable is focused.
    pub fn link_focused(&mut self, focused: Option<&dyn Linkable>) -> Result<bool, LinkError> {
        match focused.and_then(|f| f.as_linkable_parameter()) {
            Some(param) => {
                self.request_link(&param)?;
                Ok(true)
            }
            None => {
                debug!("Learn requested but nothing linkable is focused");
                Ok(false)
            }
        }
    }

    /// Drain the ingestion queue and process every message in arrival order
    ///
    /// Called once per tick from the processing context.
    pub fn update(&mut self) -> Vec<Processed> {
        self.queue
            .drain()
            .iter()
            .map(|message| self.process_message(message))
            .collect()
    }

    /// Learn (if a request is pending and the control is unbound), then dispatch
    pub fn process_message(&mut self, message: &InboundMessage) -> Processed {
        let key = BindingKey::from_message(message);
        let previous = self.last_values.insert(key.clone(), message.value);
        trace!(%key, "{}", message);

        let mut learned = None;
        if !self.learn.is_empty() && !self.links.contains(&key) {
            if let Some(handle) = self.learn.pop_live() {
                info!("🔗 Link: {} <=> '{}'", key, handle.path());
                learned = Some(handle.path().to_string());
                self.links.insert(key.clone(), handle);
            }
        }

        let effect = match self.links.get(&key).map(ParamHandle::get) {
            None => Effect::Unlinked,
            Some(None) => {
                debug!(%key, "Linked parameter no longer exists, skipping");
                Effect::Stale
            }
            Some(Some(param)) => dispatch(&param, message.value, previous),
        };

        Processed {
            key,
            learned,
            effect,
        }
    }

    /// Install bindings, overwriting existing links for the same keys
    pub(super) fn install_all(&mut self, staged: Vec<(BindingKey, ParamHandle)>) {
        for (key, handle) in staged {
            self.links.insert(key, handle);
        }
    }
}
