//! Per-node event listener registry.
//!
//! Listeners are plain synchronous callbacks kept in registration order, in a
//! side table keyed by `NodeId`. Keeping them out of the node data means
//! clones start with no listeners and decomposed nodes drop theirs.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indextree::NodeId;

use crate::arena::Document;
use crate::error::Result;

/// A registered listener. Removal compares by `Rc` identity, so the same
/// callback value registered twice is two distinct entries removed together
/// only when the same `Rc` is passed back.
pub type EventCallback = Rc<dyn Fn(&[String])>;

#[derive(Clone, Default)]
pub(crate) struct EventRegistry {
    listeners: HashMap<NodeId, HashMap<String, Vec<EventCallback>>>,
}

impl EventRegistry {
    pub(crate) fn add(&mut self, node: NodeId, event: &str, callback: EventCallback) {
        self.listeners
            .entry(node)
            .or_default()
            .entry(event.to_string())
            .or_default()
            .push(callback);
    }

    pub(crate) fn remove(&mut self, node: NodeId, event: &str, callback: &EventCallback) {
        if let Some(by_event) = self.listeners.get_mut(&node)
            && let Some(list) = by_event.get_mut(event)
        {
            list.retain(|cb| !Rc::ptr_eq(cb, callback));
            if list.is_empty() {
                by_event.remove(event);
            }
        }
    }

    /// Clone the current listener list so in-flight dispatch is unaffected
    /// by registrations or removals made meanwhile.
    pub(crate) fn snapshot(&self, node: NodeId, event: &str) -> Vec<EventCallback> {
        self.listeners
            .get(&node)
            .and_then(|by_event| by_event.get(event))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn drop_node(&mut self, node: NodeId) {
        self.listeners.remove(&node);
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("nodes", &self.listeners.len())
            .finish()
    }
}

impl Document {
    /// Register a listener for `event` on `node`; duplicates are allowed and
    /// fire once per registration.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        callback: EventCallback,
    ) -> Result<()> {
        self.node(node)?;
        self.events.add(node, event, callback);
        Ok(())
    }

    /// Remove every registration of `callback` for `event` on `node`,
    /// compared by identity. Unknown callbacks are a no-op.
    pub fn remove_event_listener(&mut self, node: NodeId, event: &str, callback: &EventCallback) {
        self.events.remove(node, event, callback);
    }

    /// Invoke every listener currently registered for `event` on `node`, in
    /// registration order, passing `args` through. The list is snapshotted
    /// before dispatch.
    pub fn trigger(&self, node: NodeId, event: &str, args: &[String]) {
        for callback in self.events.snapshot(node, event) {
            callback(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn listeners_fire_in_registration_order() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let log = Rc::new(RefCell::new(Vec::new()));

        let first: EventCallback = {
            let log = log.clone();
            Rc::new(move |_args| log.borrow_mut().push("first"))
        };
        let second: EventCallback = {
            let log = log.clone();
            Rc::new(move |_args| log.borrow_mut().push("second"))
        };
        doc.add_event_listener(div, "click", first).unwrap();
        doc.add_event_listener(div, "click", second).unwrap();

        doc.trigger(div, "click", &[]);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn args_pass_through() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let cb: EventCallback = {
            let seen = seen.clone();
            Rc::new(move |args| seen.borrow_mut().extend(args.to_vec()))
        };
        doc.add_event_listener(div, "input", cb).unwrap();
        doc.trigger(div, "input", &["a".to_string(), "b".to_string()]);
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn remove_drops_every_identical_registration() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let count = Rc::new(RefCell::new(0));
        let cb: EventCallback = {
            let count = count.clone();
            Rc::new(move |_| *count.borrow_mut() += 1)
        };
        doc.add_event_listener(div, "click", cb.clone()).unwrap();
        doc.add_event_listener(div, "click", cb.clone()).unwrap();
        doc.trigger(div, "click", &[]);
        assert_eq!(*count.borrow(), 2);

        doc.remove_event_listener(div, "click", &cb);
        doc.trigger(div, "click", &[]);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn other_events_are_untouched() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let count = Rc::new(RefCell::new(0));
        let cb: EventCallback = {
            let count = count.clone();
            Rc::new(move |_| *count.borrow_mut() += 1)
        };
        doc.add_event_listener(div, "click", cb).unwrap();
        doc.trigger(div, "hover", &[]);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn decompose_drops_listeners() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.insert_at(doc.root(), 0, div).unwrap();
        let count = Rc::new(RefCell::new(0));
        let cb: EventCallback = {
            let count = count.clone();
            Rc::new(move |_| *count.borrow_mut() += 1)
        };
        doc.add_event_listener(div, "click", cb).unwrap();
        doc.decompose(div).unwrap();
        doc.trigger(div, "click", &[]);
        assert_eq!(*count.borrow(), 0);
    }
}
