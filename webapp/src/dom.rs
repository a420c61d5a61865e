use std::{cell::RefCell, collections::HashMap};

use anyhow::Result;
use js_sys::{Array, Reflect};
use tracing::{error, instrument};
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use web_sys::{
    Element, Event, EventTarget, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, NodeList,
    ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition, ScrollToOptions, Window,
};

use common::{
    dom::{Document, DomEvent, Flow, Hook, ObserverOptions, Watch},
    selector::Selector,
};

pub type EventSink = fn(DomEvent<Element>) -> Flow;
pub type IntersectSink = fn(Watch, Element, bool);

type ListenerClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(Array, IntersectionObserver)>;

pub fn js_err(err: JsValue) -> anyhow::Error {
    anyhow::Error::msg(format!("{err:?}"))
}

// web_sys document adapter
//
// listeners and observers report back through plain function pointers rather than holding on
// to the page, which is only built after they have been registered.  the closures handed to
// the browser are owned here for as long as the document lives, i.e. the whole visit
pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    root: Element,
    on_event: EventSink,
    on_intersect: IntersectSink,
    listeners: RefCell<Vec<ListenerClosure>>,
    observers: RefCell<HashMap<Watch, (IntersectionObserver, ObserverClosure)>>,
}

impl WebDocument {
    pub fn new(on_event: EventSink, on_intersect: IntersectSink) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| anyhow::Error::msg("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow::Error::msg("no document"))?;
        let root = document
            .document_element()
            .ok_or_else(|| anyhow::Error::msg("document has no root element"))?;

        Ok(WebDocument {
            window,
            document,
            root,
            on_event,
            on_intersect,
            listeners: RefCell::new(Vec::new()),
            observers: RefCell::new(HashMap::new()),
        })
    }

    // text of the element with the given id, used for inline json configuration
    pub fn text_of(&self, id: &str) -> Option<String> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.text_content())
    }

    fn elements(list: NodeList) -> Vec<Element> {
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn add_listener(&self, target: &EventTarget, current: Element, hook: Hook) {
        let sink = self.on_event;

        let closure = ListenerClosure::new(move |event: Event| {
            // window and document events have no element target
            let target = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .unwrap_or_else(|| current.clone());

            let flow = sink(DomEvent {
                hook,
                current: current.clone(),
                target,
            });
            if flow.prevent_default {
                event.prevent_default();
            }
        });

        if let Err(err) = target
            .add_event_listener_with_callback(hook.event_name(), closure.as_ref().unchecked_ref())
        {
            error!("failed to listen for {hook:?}: {err:?}");
            return;
        }

        self.listeners.borrow_mut().push(closure);
    }

    // one observer per Watch, created with the options of the first node it is asked to watch
    #[instrument(skip(self))]
    fn observer(&self, watch: Watch, options: &ObserverOptions) -> Option<IntersectionObserver> {
        if let Some((observer, _)) = self.observers.borrow().get(&watch) {
            return Some(observer.clone());
        }

        let sink = self.on_intersect;
        let callback = ObserverClosure::new(move |entries: Array, _: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                sink(watch, entry.target(), entry.is_intersecting());
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);

        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                self.observers
                    .borrow_mut()
                    .insert(watch, (observer.clone(), callback));
                Some(observer)
            }
            Err(err) => {
                error!("failed to create intersection observer: {err:?}");
                None
            }
        }
    }

    fn query(&self, list: std::result::Result<NodeList, JsValue>, selector: &Selector) -> Vec<Element> {
        match list {
            Ok(list) => Self::elements(list),
            Err(err) => {
                error!("query for {selector} failed: {err:?}");
                Vec::new()
            }
        }
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn root(&self) -> Element {
        self.root.clone()
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        self.query(
            self.document.query_selector_all(&selector.to_string()),
            selector,
        )
    }

    fn query_within(&self, scope: &Element, selector: &Selector) -> Vec<Element> {
        self.query(scope.query_selector_all(&selector.to_string()), selector)
    }

    fn closest(&self, node: &Element, selector: &Selector) -> Option<Element> {
        node.closest(&selector.to_string()).unwrap_or_else(|err| {
            error!("closest({selector}) failed: {err:?}");
            None
        })
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(err) = node.set_attribute(name, value) {
            error!("failed to set {name}: {err:?}");
        }
    }

    fn remove_attribute(&self, node: &Element, name: &str) {
        if let Err(err) = node.remove_attribute(name) {
            error!("failed to remove {name}: {err:?}");
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().add_1(class) {
            error!("failed to add class {class}: {err:?}");
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().remove_1(class) {
            error!("failed to remove class {class}: {err:?}");
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn next_sibling(&self, node: &Element) -> Option<Element> {
        node.next_element_sibling()
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &web_sys::Node = node;
        ancestor.contains(Some(node))
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_err)
    }

    fn append_text(&self, parent: &Element, text: &str) -> Result<()> {
        let text = self.document.create_text_node(text);
        parent.append_child(&text).map_err(js_err)?;
        Ok(())
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<()> {
        parent.append_child(child).map_err(js_err)?;
        Ok(())
    }

    fn prepend(&self, parent: &Element, child: &Element) -> Result<()> {
        parent
            .insert_before(child, parent.first_child().as_ref())
            .map_err(js_err)?;
        Ok(())
    }

    fn insert_after(&self, reference: &Element, node: &Element) -> Result<()> {
        reference.after_with_node_1(node).map_err(js_err)
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn scroll_into_view(&self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Start);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn scroll_to_top(&self) {
        let options = ScrollToOptions::new();
        options.set_top(0.0);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn supports_intersection(&self) -> bool {
        Reflect::has(&self.window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    }

    fn observe(&self, node: &Element, watch: Watch, options: &ObserverOptions) {
        if let Some(observer) = self.observer(watch, options) {
            observer.observe(node);
        }
    }

    fn unobserve(&self, node: &Element, watch: Watch) {
        if let Some((observer, _)) = self.observers.borrow().get(&watch) {
            observer.unobserve(node);
        }
    }

    fn listen(&self, node: &Element, hook: Hook) {
        self.add_listener(node, node.clone(), hook);
    }

    fn listen_document(&self, hook: Hook) {
        self.add_listener(&self.document, self.root.clone(), hook);
    }

    fn listen_window(&self, hook: Hook) {
        self.add_listener(&self.window, self.root.clone(), hook);
    }
}
