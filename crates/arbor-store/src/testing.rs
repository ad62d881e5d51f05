//! Shared fixtures for the crate's tests.

use std::cell::RefCell;
use std::rc::Rc;

use arbor_node::NodeId;

use crate::context::StoreCx;
use crate::error::{StoreError, StoreResult};
use crate::store::{Blueprint, Store};

pub(crate) type Log = Rc<RefCell<Vec<String>>>;

pub(crate) fn log() -> Log {
    Rc::default()
}

/// Position of `entry` in the log. Panics if it is missing.
pub(crate) fn pos(log: &Log, entry: &str) -> usize {
    log.borrow()
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry:?} not logged: {:?}", log.borrow()))
}

pub(crate) fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

/// A store that records its hooks.
pub(crate) struct Recorder {
    pub label: &'static str,
    pub log: Log,
    pub inits: u32,
    pub counter: u32,
    pub fail_reactive: bool,
    pub fields: Vec<(&'static str, NodeId)>,
}

impl Recorder {
    pub fn new(label: &'static str, log: Log) -> Self {
        Self {
            label,
            log,
            inits: 0,
            counter: 0,
            fail_reactive: false,
            fields: Vec::new(),
        }
    }

    fn record(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{hook} {}", self.label));
    }
}

impl Store for Recorder {
    fn on_store_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        self.inits += 1;
        self.counter = 0;
        self.record("init");
        Ok(())
    }

    fn on_store_make_reactive(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        self.record("reactive");
        if self.fail_reactive {
            return Err(StoreError::hook(self.label, "no observers"));
        }
        Ok(())
    }

    fn on_store_relations_init(&mut self, _cx: &mut StoreCx<'_>) -> StoreResult<()> {
        self.record("relations");
        Ok(())
    }

    fn store_fields(&self) -> Vec<(&'static str, NodeId)> {
        self.fields.clone()
    }
}

pub(crate) fn recorder(label: &'static str, log: &Log) -> Blueprint {
    let log = log.clone();
    Blueprint::new(move |_| Ok(Recorder::new(label, log)))
}
