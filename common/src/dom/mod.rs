use std::fmt::Debug;

use anyhow::Result;

use crate::selector::Selector;

pub mod memory;

// document adapter
//
// page behaviors only see the document through this trait.  memory::MemoryDocument runs them
// headless, the webapp crate implements it over web_sys.
//
// attribute and class mutations do not return a Result; an implementation that hits an error
// there logs it.  structural changes (creating and moving nodes) do return one.
pub trait Document {
    type Node: Clone + Debug + PartialEq;

    // the <html> element
    fn root(&self) -> Self::Node;

    fn by_id(&self, id: &str) -> Option<Self::Node>;

    // every match in document order
    fn query_all(&self, selector: &Selector) -> Vec<Self::Node>;

    // matching descendants of scope, not including scope itself
    fn query_within(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    fn query_first(&self, selector: &Selector) -> Option<Self::Node> {
        self.query_all(selector).into_iter().next()
    }

    fn first_within(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node> {
        self.query_within(scope, selector).into_iter().next()
    }

    // nearest inclusive ancestor matching selector
    fn closest(&self, node: &Self::Node, selector: &Selector) -> Option<Self::Node>;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn remove_attribute(&self, node: &Self::Node, name: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    // current value of an input or textarea, empty for anything else
    fn value(&self, node: &Self::Node) -> String;

    // restore every control in the form to its default value
    fn reset_form(&self, form: &Self::Node);

    // next element sibling, skipping text
    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node>;

    // inclusive: a node contains itself
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    fn create_element(&self, tag: &str) -> Result<Self::Node>;

    fn append_text(&self, parent: &Self::Node, text: &str) -> Result<()>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    // insert child before the first child of parent
    fn prepend(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

    // insert node directly after reference, under the same parent
    fn insert_after(&self, reference: &Self::Node, node: &Self::Node) -> Result<()>;

    fn remove(&self, node: &Self::Node);

    // smooth scroll so that node sits at the top of the viewport
    fn scroll_into_view(&self, node: &Self::Node);

    // smooth scroll back to the origin
    fn scroll_to_top(&self);

    // vertical scroll offset in css pixels
    fn scroll_offset(&self) -> f64;

    fn supports_intersection(&self) -> bool;

    fn observe(&self, node: &Self::Node, watch: Watch, options: &ObserverOptions);

    fn unobserve(&self, node: &Self::Node, watch: Watch);

    // deliver `hook` events on node back to the page as DomEvents
    fn listen(&self, node: &Self::Node, hook: Hook);

    // document-wide listener; DomEvent::current is the root
    fn listen_document(&self, hook: Hook);

    // window listener; DomEvent::current is the root
    fn listen_window(&self, hook: Hook);
}

// hooks
//
// one per handler on the page.  the adapter only needs to know which dom event to subscribe
// to; the page uses the hook to route the event back to the component that asked for it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    ThemeToggle,
    FormSubmit,
    FieldBlur,
    FieldInput,
    FragmentLink,
    MenuToggle,
    OutsideClick,
    FaqSummary,
    ScrollTopClick,
    WindowScroll,
}

impl Hook {
    pub fn event_name(self) -> &'static str {
        match self {
            Hook::FormSubmit => "submit",
            Hook::FieldBlur => "blur",
            Hook::FieldInput => "input",
            Hook::WindowScroll => "scroll",
            Hook::ThemeToggle
            | Hook::FragmentLink
            | Hook::MenuToggle
            | Hook::OutsideClick
            | Hook::FaqSummary
            | Hook::ScrollTopClick => "click",
        }
    }
}

// which intersection observer a node is registered with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Watch {
    Reveal,
    LazyImage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        ObserverOptions {
            threshold: 0.0,
            root_margin: String::from("0px"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomEvent<N> {
    pub hook: Hook,
    // the node the listener was registered on
    pub current: N,
    // the node the event originated from
    pub target: N,
}

impl<N: Clone> DomEvent<N> {
    pub fn on(hook: Hook, node: N) -> Self {
        DomEvent {
            hook,
            current: node.clone(),
            target: node,
        }
    }
}

// what the adapter should do with the event once the page has seen it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flow {
    pub prevent_default: bool,
}

impl Flow {
    pub const PROCEED: Flow = Flow {
        prevent_default: false,
    };

    pub const PREVENT: Flow = Flow {
        prevent_default: true,
    };
}
