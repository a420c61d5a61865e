use tracing::debug;

use crate::{
    Context,
    config::{MenuConfig, Messages},
    dom::{Document, Flow, Hook},
};

const OPEN_CLASS: &str = "show";

// mobile menu
//
// a toggle button and the panel it controls.  both have to be on the page, otherwise there
// is nothing to wire up
pub struct MobileMenu<N> {
    pair: Option<(N, N)>,
    open_label: String,
    close_label: String,
}

impl<N: Clone + PartialEq> MobileMenu<N> {
    pub fn init<D: Document<Node = N>>(
        cx: &Context<D>,
        config: &MenuConfig,
        messages: &Messages,
    ) -> Self {
        let pair = match (cx.doc.by_id(&config.toggle_id), cx.doc.by_id(&config.panel_id)) {
            (Some(toggle), Some(panel)) => {
                cx.doc.listen(&toggle, Hook::MenuToggle);
                cx.doc.listen_document(Hook::OutsideClick);
                Some((toggle, panel))
            }
            _ => {
                debug!("no mobile menu on this page");
                None
            }
        };

        MobileMenu {
            pair,
            open_label: messages.open_menu.clone(),
            close_label: messages.close_menu.clone(),
        }
    }

    pub fn on_toggle<D: Document<Node = N>>(&self, doc: &D) -> Flow {
        let Some((toggle, panel)) = &self.pair else {
            return Flow::PROCEED;
        };

        let was_open = doc.has_class(panel, OPEN_CLASS);
        if was_open {
            doc.remove_class(panel, OPEN_CLASS);
        } else {
            doc.add_class(panel, OPEN_CLASS);
        }

        doc.set_attribute(toggle, "aria-expanded", if was_open { "false" } else { "true" });
        // the label names what the next click does
        let label = if was_open { &self.open_label } else { &self.close_label };
        doc.set_attribute(toggle, "aria-label", label);

        Flow::PROCEED
    }

    // any click that lands outside both the panel and its toggle closes the menu
    pub fn on_document_click<D: Document<Node = N>>(&self, doc: &D, target: &N) -> Flow {
        let Some((toggle, panel)) = &self.pair else {
            return Flow::PROCEED;
        };

        if !doc.contains(panel, target) && !doc.contains(toggle, target) {
            doc.remove_class(panel, OPEN_CLASS);
            doc.set_attribute(toggle, "aria-expanded", "false");
        }

        Flow::PROCEED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dom::memory::{ListenTarget, MemoryDocument},
        schedule::VirtualTimers,
        store::MemoryStore,
    };

    #[test]
    fn toggles_and_closes_on_outside_click() {
        let doc = MemoryDocument::new();
        let toggle = doc.element(doc.body(), "button", &[("id", "mobile-menu-toggle")]);
        let icon = doc.element(toggle, "span", &[]);
        let panel = doc.element(doc.body(), "nav", &[("id", "mobile-menu")]);
        let link = doc.element(panel, "a", &[("href", "/about")]);
        let main = doc.element(doc.body(), "main", &[]);

        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&doc, &store, &timers);
        let menu = MobileMenu::init(&cx, &MenuConfig::default(), &Messages::default());

        assert!(doc.is_listening(toggle, Hook::MenuToggle));
        assert_eq!(doc.listeners(Hook::OutsideClick), vec![ListenTarget::Document]);

        menu.on_toggle(&doc);
        assert!(doc.has_class(&panel, "show"));
        assert_eq!(doc.attribute(&toggle, "aria-expanded").as_deref(), Some("true"));
        assert_eq!(doc.attribute(&toggle, "aria-label"), Some(Messages::default().close_menu));

        // clicks inside the panel or on the toggle's own children leave it alone
        menu.on_document_click(&doc, &link);
        menu.on_document_click(&doc, &icon);
        assert!(doc.has_class(&panel, "show"));

        menu.on_document_click(&doc, &main);
        assert!(!doc.has_class(&panel, "show"));
        assert_eq!(doc.attribute(&toggle, "aria-expanded").as_deref(), Some("false"));

        menu.on_toggle(&doc);
        menu.on_toggle(&doc);
        assert!(!doc.has_class(&panel, "show"));
        assert_eq!(doc.attribute(&toggle, "aria-label"), Some(Messages::default().open_menu));
    }

    #[test]
    fn half_a_menu_is_no_menu() {
        let doc = MemoryDocument::new();
        let toggle = doc.element(doc.body(), "button", &[("id", "mobile-menu-toggle")]);

        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&doc, &store, &timers);
        let menu = MobileMenu::init(&cx, &MenuConfig::default(), &Messages::default());

        assert!(!doc.is_listening(toggle, Hook::MenuToggle));
        assert!(doc.listeners(Hook::MenuToggle).is_empty());
        assert!(doc.listeners(Hook::OutsideClick).is_empty());
        assert_eq!(menu.on_toggle(&doc), Flow::PROCEED);
    }
}
