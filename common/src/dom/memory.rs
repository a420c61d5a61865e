use std::cell::{Cell, RefCell};

use anyhow::{Result, bail};

use crate::dom::{Document, Hook, ObserverOptions, Watch};
use crate::selector::{ElementView, Selector};

// in-memory document
//
// a small arena-backed element tree that implements Document well enough to drive every
// behavior on the page without a browser.  nodes are never freed; removing one just detaches
// it, which also matches what a script holding a reference to a removed element sees.
//
// besides the tree it records everything the page asks of the environment (listeners,
// observed nodes, scroll calls) so tests can assert on the wiring
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const TEXT: &str = "#text";

#[derive(Debug)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    value: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        NodeData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            classes: Vec::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn is_text(&self) -> bool {
        self.tag == TEXT
    }

    fn is_control(&self) -> bool {
        self.tag == "input" || self.tag == "textarea"
    }
}

impl ElementView for NodeData {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenTarget {
    Node(NodeId),
    Document,
    Window,
}

#[derive(Debug)]
pub struct MemoryDocument {
    nodes: RefCell<Vec<NodeData>>,
    root: NodeId,
    body: NodeId,
    listeners: RefCell<Vec<(ListenTarget, Hook)>>,
    observed: RefCell<Vec<(NodeId, Watch, ObserverOptions)>>,
    scrolled_into_view: RefCell<Vec<NodeId>>,
    scrolls_to_top: Cell<usize>,
    offset: Cell<f64>,
    intersection: Cell<bool>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    // an empty <html><body></body></html>
    pub fn new() -> Self {
        let mut nodes = vec![NodeData::new("html"), NodeData::new("body")];
        nodes[0].children.push(NodeId(1));
        nodes[1].parent = Some(NodeId(0));

        MemoryDocument {
            nodes: RefCell::new(nodes),
            root: NodeId(0),
            body: NodeId(1),
            listeners: RefCell::new(Vec::new()),
            observed: RefCell::new(Vec::new()),
            scrolled_into_view: RefCell::new(Vec::new()),
            scrolls_to_top: Cell::new(0),
            offset: Cell::new(0.0),
            intersection: Cell::new(true),
        }
    }

    // pretend to be a browser without IntersectionObserver
    pub fn without_intersection(self) -> Self {
        self.intersection.set(false);
        self
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // append a new element under parent; `class` attributes populate the class list
    pub fn element(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.alloc(NodeData::new(tag));
        for (name, value) in attrs {
            self.set_attribute(&id, name, value);
        }
        self.attach(parent, id, None);
        id
    }

    pub fn text(&self, parent: NodeId, text: &str) -> NodeId {
        let mut data = NodeData::new(TEXT);
        data.text = text.to_owned();
        let id = self.alloc(data);
        self.attach(parent, id, None);
        id
    }

    // what a user typing into the control would do
    pub fn set_value(&self, node: NodeId, value: &str) {
        self.nodes.borrow_mut()[node.0].value = value.to_owned();
    }

    pub fn set_scroll_offset(&self, offset: f64) {
        self.offset.set(offset);
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].tag.clone()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        nodes[node.0]
            .children
            .iter()
            .copied()
            .filter(|c| !nodes[c.0].is_text())
            .collect()
    }

    // concatenated text of the subtree, like Node.textContent
    pub fn text_content(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let data = &nodes[id.0];
            if data.is_text() {
                out.push_str(&data.text);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(&self.root, &node)
    }

    pub fn listeners(&self, hook: Hook) -> Vec<ListenTarget> {
        self.listeners
            .borrow()
            .iter()
            .filter(|(_, h)| *h == hook)
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn is_listening(&self, node: NodeId, hook: Hook) -> bool {
        self.listeners
            .borrow()
            .contains(&(ListenTarget::Node(node), hook))
    }

    pub fn observed(&self, watch: Watch) -> Vec<NodeId> {
        self.observed
            .borrow()
            .iter()
            .filter(|(_, w, _)| *w == watch)
            .map(|(n, _, _)| *n)
            .collect()
    }

    pub fn observer_options(&self, node: NodeId, watch: Watch) -> Option<ObserverOptions> {
        self.observed
            .borrow()
            .iter()
            .find(|(n, w, _)| *n == node && *w == watch)
            .map(|(_, _, o)| o.clone())
    }

    pub fn scrolled_into_view(&self) -> Vec<NodeId> {
        self.scrolled_into_view.borrow().clone()
    }

    pub fn scrolls_to_top(&self) -> usize {
        self.scrolls_to_top.get()
    }

    fn alloc(&self, data: NodeData) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(data);
        NodeId(nodes.len() - 1)
    }

    fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn attach(&self, parent: NodeId, node: NodeId, at: Option<usize>) {
        self.detach(node);

        let mut nodes = self.nodes.borrow_mut();
        let children = &mut nodes[parent.0].children;
        match at {
            Some(i) => children.insert(i.min(children.len()), node),
            None => children.push(node),
        }
        nodes[node.0].parent = Some(parent);
    }

    // preorder walk of the element descendants of scope
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let data = &nodes[id.0];
            if data.is_text() {
                continue;
            }
            out.push(id);
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    fn matching(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let candidates = self.descendants(scope);
        let nodes = self.nodes.borrow();
        candidates
            .into_iter()
            .filter(|id| selector.matches(&nodes[id.0]))
            .collect()
    }

    fn in_tree(&self, node: NodeId) -> bool {
        node.0 < self.nodes.borrow().len()
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn by_id(&self, id: &str) -> Option<NodeId> {
        let candidates = self.descendants(self.root);
        let nodes = self.nodes.borrow();
        candidates
            .into_iter()
            .find(|n| nodes[n.0].attribute("id") == Some(id))
    }

    fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        // the root itself can match too, as with document.querySelectorAll
        let mut out = Vec::new();
        if selector.matches(&self.nodes.borrow()[self.root.0]) {
            out.push(self.root);
        }
        out.extend(self.matching(self.root, selector));
        out
    }

    fn query_within(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        self.matching(*scope, selector)
    }

    fn closest(&self, node: &NodeId, selector: &Selector) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let mut current = Some(*node);
        while let Some(id) = current {
            if selector.matches(&nodes[id.0]) {
                return Some(id);
            }
            current = nodes[id.0].parent;
        }
        None
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attribute(name).map(str::to_owned)
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let data = &mut nodes[node.0];
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_owned).collect();
            return;
        }
        match data.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => data.attrs.push((name.to_owned(), value.to_owned())),
        }
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let data = &mut nodes[node.0];
        if name == "class" {
            data.classes.clear();
        } else {
            data.attrs.retain(|(k, _)| k != name);
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.nodes.borrow()[node.0].has_class(class)
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_owned());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.nodes.borrow_mut()[node.0]
            .classes
            .retain(|c| c != class);
    }

    fn value(&self, node: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        let data = &nodes[node.0];
        if data.is_control() {
            data.value.clone()
        } else {
            String::new()
        }
    }

    fn reset_form(&self, form: &NodeId) {
        let controls = self.descendants(*form);
        let mut nodes = self.nodes.borrow_mut();
        for id in controls {
            let data = &mut nodes[id.0];
            if data.is_control() {
                data.value = data.attribute("value").unwrap_or_default().to_owned();
            }
        }
    }

    fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        nodes[parent.0]
            .children
            .iter()
            .skip_while(|c| *c != node)
            .skip(1)
            .find(|c| !nodes[c.0].is_text())
            .copied()
    }

    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            current = nodes[id.0].parent;
        }
        false
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("invalid tag name {tag:?}");
        }
        Ok(self.alloc(NodeData::new(tag)))
    }

    fn append_text(&self, parent: &NodeId, text: &str) -> Result<()> {
        if !self.in_tree(*parent) {
            bail!("unknown node {parent:?}");
        }
        self.text(*parent, text);
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if self.contains(child, parent) {
            bail!("cannot append {child:?} inside itself");
        }
        self.attach(*parent, *child, None);
        Ok(())
    }

    fn prepend(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if self.contains(child, parent) {
            bail!("cannot prepend {child:?} inside itself");
        }
        self.attach(*parent, *child, Some(0));
        Ok(())
    }

    fn insert_after(&self, reference: &NodeId, node: &NodeId) -> Result<()> {
        let Some(parent) = self.nodes.borrow()[reference.0].parent else {
            bail!("{reference:?} has no parent to insert into");
        };
        if self.contains(node, &parent) {
            bail!("cannot insert {node:?} inside itself");
        }

        self.detach(*node);
        let at = self.nodes.borrow()[parent.0]
            .children
            .iter()
            .position(|c| c == reference)
            .map(|i| i + 1);
        self.attach(parent, *node, at);
        Ok(())
    }

    fn remove(&self, node: &NodeId) {
        self.detach(*node);
    }

    fn scroll_into_view(&self, node: &NodeId) {
        self.scrolled_into_view.borrow_mut().push(*node);
    }

    fn scroll_to_top(&self) {
        self.scrolls_to_top.set(self.scrolls_to_top.get() + 1);
    }

    fn scroll_offset(&self) -> f64 {
        self.offset.get()
    }

    fn supports_intersection(&self) -> bool {
        self.intersection.get()
    }

    fn observe(&self, node: &NodeId, watch: Watch, options: &ObserverOptions) {
        let mut observed = self.observed.borrow_mut();
        if !observed.iter().any(|(n, w, _)| n == node && *w == watch) {
            observed.push((*node, watch, options.clone()));
        }
    }

    fn unobserve(&self, node: &NodeId, watch: Watch) {
        self.observed
            .borrow_mut()
            .retain(|(n, w, _)| !(n == node && *w == watch));
    }

    fn listen(&self, node: &NodeId, hook: Hook) {
        self.listeners
            .borrow_mut()
            .push((ListenTarget::Node(*node), hook));
    }

    fn listen_document(&self, hook: Hook) {
        self.listeners
            .borrow_mut()
            .push((ListenTarget::Document, hook));
    }

    fn listen_window(&self, hook: Hook) {
        self.listeners.borrow_mut().push((ListenTarget::Window, hook));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_walk_in_document_order() {
        let doc = MemoryDocument::new();
        let form = doc.element(doc.body(), "form", &[("data-validate", "")]);
        let first = doc.element(form, "input", &[("name", "a")]);
        let area = doc.element(form, "textarea", &[("required", "")]);
        let second = doc.element(form, "input", &[("required", "")]);

        let fields = Selector::parse("input, textarea").unwrap();
        assert_eq!(doc.query_all(&fields), vec![first, area, second]);

        let required = Selector::parse("input[required], textarea[required]").unwrap();
        assert_eq!(doc.query_within(&form, &required), vec![area, second]);
        assert!(doc.query_within(&first, &fields).is_empty());
    }

    #[test]
    fn insert_after_and_remove_keep_siblings_straight() {
        let doc = MemoryDocument::new();
        let group = doc.element(doc.body(), "div", &[]);
        let input = doc.element(group, "input", &[]);
        let label = doc.element(group, "label", &[]);

        let span = doc.create_element("span").unwrap();
        doc.insert_after(&input, &span).unwrap();
        assert_eq!(doc.children(group), vec![input, span, label]);
        assert_eq!(doc.next_sibling(&input), Some(span));

        doc.remove(&span);
        assert_eq!(doc.children(group), vec![input, label]);
        assert!(!doc.is_attached(span));
        assert_eq!(doc.next_sibling(&input), Some(label));
    }

    #[test]
    fn class_attribute_and_class_list_agree() {
        let doc = MemoryDocument::new();
        let div = doc.element(doc.body(), "div", &[("class", "alert alert-success")]);
        assert!(doc.has_class(&div, "alert-success"));

        doc.add_class(&div, "show");
        doc.add_class(&div, "show");
        assert_eq!(
            doc.attribute(&div, "class").as_deref(),
            Some("alert alert-success show")
        );

        doc.remove_class(&div, "alert");
        assert_eq!(
            doc.attribute(&div, "class").as_deref(),
            Some("alert-success show")
        );
    }

    #[test]
    fn reset_restores_default_values() {
        let doc = MemoryDocument::new();
        let form = doc.element(doc.body(), "form", &[]);
        let name = doc.element(form, "input", &[]);
        let country = doc.element(form, "input", &[("value", "JO")]);

        doc.set_value(name, "someone");
        doc.set_value(country, "EG");
        doc.reset_form(&form);

        assert_eq!(doc.value(&name), "");
        assert_eq!(doc.value(&country), "JO");
    }

    #[test]
    fn refuses_cycles() {
        let doc = MemoryDocument::new();
        let outer = doc.element(doc.body(), "div", &[]);
        let inner = doc.element(outer, "div", &[]);
        assert!(doc.append_child(&inner, &outer).is_err());
        assert!(doc.prepend(&inner, &outer).is_err());
    }
}
