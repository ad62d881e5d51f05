//! The four-phase initialization sweep.
//!
//! [`init_hierarchy`] walks a subtree four times, parents before children:
//!
//! 1. [`Phase::Init`] runs [`Store::on_store_init`](crate::Store::on_store_init)
//! 2. [`Phase::MakeReactive`] runs the make-reactive hook; failures are
//!    reported and the sweep goes on
//! 3. [`Phase::RelationsInit`] runs the relations hook
//! 4. [`Phase::RegisterNameless`] names pending dynamic stores after the
//!    fields holding them
//!
//! A final children-first walk clears the pending lists. The walk includes
//! public children, private children and pending dynamic stores.

use std::fmt;

use arbor_node::{NodeId, Order, Walker};
use tracing::{debug, debug_span};

use crate::diagnostics::Diagnostic;
use crate::error::StoreResult;
use crate::meta::StoreMeta;
use crate::registry;
use crate::resolver;
use crate::tree::StoreTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    MakeReactive,
    RelationsInit,
    RegisterNameless,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Init => "init",
            Phase::MakeReactive => "make_reactive",
            Phase::RelationsInit => "relations_init",
            Phase::RegisterNameless => "register_nameless",
        })
    }
}

const SWEEP: Walker<fn(&StoreMeta) -> Vec<NodeId>> = Walker::new(StoreMeta::all_children);

/// Run the four phases over the subtree rooted at `top`.
pub fn init_hierarchy(tree: &mut StoreTree, top: NodeId) -> StoreResult<()> {
    let span = debug_span!("init_hierarchy", top = %top);
    let _enter = span.enter();

    enter(tree, Phase::Init, top);
    SWEEP.try_for_each(tree, top, Order::ParentFirst, |tree, node| {
        tree.with_store(node, |store, cx| store.on_store_init(cx))
    })?;

    enter(tree, Phase::MakeReactive, top);
    SWEEP.try_for_each(tree, top, Order::ParentFirst, make_reactive)?;

    enter(tree, Phase::RelationsInit, top);
    SWEEP.try_for_each(tree, top, Order::ParentFirst, |tree, node| {
        tree.with_store(node, |store, cx| store.on_store_relations_init(cx))
    })?;

    enter(tree, Phase::RegisterNameless, top);
    SWEEP.try_for_each(tree, top, Order::ParentFirst, registry::register_nameless_stores)?;

    SWEEP.for_each(tree, top, Order::ChildrenFirst, |tree, node| {
        if let Ok(meta) = tree.meta_mut(node) {
            meta.nameless_uninitialized = None;
        }
    });
    Ok(())
}

/// Register names on the root, then sweep the whole tree.
pub(crate) fn init_root_hierarchy(tree: &mut StoreTree, root: NodeId) -> StoreResult<()> {
    resolver::register_children_on_root(tree, root)?;
    init_hierarchy(tree, root)
}

fn make_reactive(tree: &mut StoreTree, node: NodeId) -> StoreResult<()> {
    let (store, outcome) = tree.with_store(node, |store, cx| {
        Ok((store.type_name(), store.on_store_make_reactive(cx)))
    })?;
    if let Err(error) = outcome {
        tree.report(Diagnostic::ReactivityActivationFailed {
            node,
            store,
            message: error.to_string(),
        });
    }
    Ok(())
}

fn enter(tree: &StoreTree, phase: Phase, top: NodeId) {
    if tree.config().trace_phases {
        debug!(%phase, top = %top, "lifecycle phase");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::diagnostics::CollectingSink;
    use crate::store::Blueprint;
    use crate::testing::{count, log, pos, recorder, Recorder};

    #[test]
    fn parents_init_before_children_and_relations_last() {
        let log = log();
        let mut tree = StoreTree::default();
        tree.create_root({
            let log = log.clone();
            move |cx| {
                let inner = log.clone();
                cx.children([
                    (
                        "A",
                        Blueprint::new(move |cx| {
                            cx.children([("A1", recorder("A1", &inner))])?;
                            cx.private_children([("A2", recorder("A2", &inner))])?;
                            Ok(Recorder::new("A", inner))
                        }),
                    ),
                    ("B", recorder("B", &log)),
                ])?;
                Ok(Recorder::new("R", log))
            }
        })
        .unwrap();

        let inits = ["init R", "init A", "init A1", "init A2", "init B"];
        for pair in inits.windows(2) {
            assert!(pos(&log, pair[0]) < pos(&log, pair[1]), "{pair:?}");
        }
        let last_reactive = pos(&log, "reactive B");
        for label in ["R", "A", "A1", "A2", "B"] {
            assert!(pos(&log, &format!("init {label}")) < last_reactive);
            assert!(pos(&log, &format!("relations {label}")) > last_reactive);
            assert_eq!(count(&log, &format!("init {label}")), 1);
        }
    }

    #[test]
    fn reactivity_failure_does_not_stop_the_sweep() {
        let log = log();
        let sink = CollectingSink::new();
        let mut tree = StoreTree::with_sink(TreeConfig::default(), sink.clone()).unwrap();
        tree.create_root({
            let log = log.clone();
            move |cx| {
                let broken_log = log.clone();
                cx.children([
                    (
                        "broken",
                        Blueprint::new(move |_| {
                            let mut recorder = Recorder::new("broken", broken_log);
                            recorder.fail_reactive = true;
                            Ok(recorder)
                        }),
                    ),
                    ("sibling", recorder("sibling", &log)),
                ])?;
                Ok(Recorder::new("R", log))
            }
        })
        .unwrap();

        assert_eq!(count(&log, "reactive sibling"), 1);
        assert_eq!(count(&log, "relations broken"), 1);
        assert_eq!(count(&log, "relations sibling"), 1);
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(matches!(
            &entries[0],
            Diagnostic::ReactivityActivationFailed { message, .. } if message.contains("no observers")
        ));
    }

    #[test]
    fn init_error_propagates() {
        struct Failing;
        impl crate::Store for Failing {
            fn on_store_init(&mut self, _cx: &mut crate::StoreCx<'_>) -> StoreResult<()> {
                Err(crate::StoreError::hook("Failing", "no backend"))
            }
        }

        let mut tree = StoreTree::default();
        let err = tree
            .create_root(|cx| {
                cx.children([("F", Blueprint::new(|_| Ok(Failing)))])?;
                Ok(Recorder::new("R", log()))
            })
            .unwrap_err();
        assert!(matches!(err, crate::StoreError::Hook { .. }));
        let root = tree.root().unwrap();
        assert!(tree.is_hierarchy_created(root));
        assert!(!tree.is_hierarchy_initialized(root));
    }

    #[test]
    fn phase_names() {
        assert_eq!(Phase::MakeReactive.to_string(), "make_reactive");
        assert_eq!(Phase::RegisterNameless.to_string(), "register_nameless");
    }
}
