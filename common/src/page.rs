use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::{
    Context,
    config::SiteConfig,
    dom::{Document, DomEvent, Flow, Hook, Watch},
    faq::FaqAccordion,
    lazy::LazyImages,
    menu::MobileMenu,
    reveal::RevealObserver,
    schedule::TaskKey,
    scroll::SmoothScroller,
    scroll_top::ScrollTopButton,
    theme::ThemeController,
    validate::FormValidator,
};

// the page
//
// every behavior is initialized exactly once, here, in a fixed order.  none of them talk to
// each other; the page only exists to route what the adapter reports (dom events,
// intersections, due timers) to whichever behavior registered for it
pub struct Page<N> {
    theme: ThemeController<N>,
    forms: FormValidator<N>,
    anchors: SmoothScroller,
    reveal: RevealObserver,
    menu: MobileMenu<N>,
    faq: FaqAccordion<N>,
    lazy: LazyImages,
    scroll_top: ScrollTopButton<N>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Page<N> {
    #[instrument(skip_all)]
    pub fn new<D: Document<Node = N>>(config: &SiteConfig, cx: &Context<D>) -> Result<Self> {
        let page = Page {
            theme: ThemeController::init(cx, &config.theme, &config.messages)?,
            forms: FormValidator::init(cx, &config.forms, &config.messages)?,
            anchors: SmoothScroller::init(cx, &config.anchors)?,
            reveal: RevealObserver::init(cx, &config.reveal)?,
            menu: MobileMenu::init(cx, &config.menu, &config.messages),
            faq: FaqAccordion::init(cx, &config.faq)?,
            lazy: LazyImages::init(cx, &config.lazy)?,
            scroll_top: ScrollTopButton::init(cx, &config.scroll_top),
        };

        info!(
            "page ready: {} form(s), {} fragment link(s), {} reveal target(s), {} lazy image(s)",
            page.forms.forms().len(),
            page.anchors.links(),
            page.reveal.watching(),
            page.lazy.watching()
        );

        Ok(page)
    }

    pub fn forms(&self) -> &FormValidator<N> {
        &self.forms
    }

    pub fn handle<D: Document<Node = N>>(&self, cx: &Context<D>, event: &DomEvent<N>) -> Flow {
        debug!("{:?} on {:?}", event.hook, event.current);

        match event.hook {
            Hook::ThemeToggle => self.theme.on_toggle(cx),
            Hook::FormSubmit => self.forms.on_submit(cx, &event.current),
            Hook::FieldBlur => self.forms.on_blur(cx.doc, &event.current),
            Hook::FieldInput => self.forms.on_input(cx.doc, &event.current),
            Hook::FragmentLink => self.anchors.on_click(cx.doc, &event.current),
            Hook::MenuToggle => self.menu.on_toggle(cx.doc),
            Hook::OutsideClick => self.menu.on_document_click(cx.doc, &event.target),
            Hook::FaqSummary => self.faq.on_summary_click(cx, &event.current),
            Hook::ScrollTopClick => self.scroll_top.on_click(cx.doc),
            Hook::WindowScroll => self.scroll_top.on_scroll(cx),
        }
    }

    pub fn intersect<D: Document<Node = N>>(
        &self,
        cx: &Context<D>,
        watch: Watch,
        node: &N,
        intersecting: bool,
    ) {
        match watch {
            Watch::Reveal => self.reveal.on_intersect(cx.doc, node, intersecting),
            Watch::LazyImage => self.lazy.on_intersect(cx.doc, node, intersecting),
        }
    }

    pub fn fire<D: Document<Node = N>>(&self, cx: &Context<D>, key: TaskKey) {
        match key {
            TaskKey::ScrollCheck => self.scroll_top.fire(cx, key),
            TaskKey::FaqSettle(_) => self.faq.fire(cx, key),
            TaskKey::BannerFade(_) | TaskKey::BannerRemove(_) => self.forms.fire(cx, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dom::memory::{MemoryDocument, NodeId},
        schedule::VirtualTimers,
        selector::Selector,
        store::{MemoryStore, PreferenceStore},
    };

    struct Site {
        doc: MemoryDocument,
        theme_toggle: NodeId,
        form: NodeId,
        email: NodeId,
        name: NodeId,
        message: NodeId,
        contact_link: NodeId,
        contact: NodeId,
        menu_toggle: NodeId,
        menu: NodeId,
        faq: NodeId,
        faq_summary: NodeId,
        card: NodeId,
        photo: NodeId,
        scroll_top: NodeId,
    }

    // roughly the markup of the landing page
    fn site() -> Site {
        let doc = MemoryDocument::new();
        let body = doc.body();

        let header = doc.element(body, "header", &[]);
        let theme_toggle = doc.element(header, "button", &[("id", "theme-toggle")]);
        doc.element(theme_toggle, "i", &[("class", "icon-moon")]);
        let menu_toggle = doc.element(header, "button", &[("id", "mobile-menu-toggle")]);
        let menu = doc.element(header, "nav", &[("id", "mobile-menu")]);
        let contact_link = doc.element(menu, "a", &[("href", "#contact")]);
        doc.element(menu, "a", &[("href", "#")]);

        let main = doc.element(body, "main", &[]);
        let card = doc.element(main, "div", &[("class", "card animate-on-scroll")]);
        let photo = doc.element(card, "img", &[("data-src", "/img/office.webp")]);

        let faq = doc.element(main, "details", &[("class", "faq-item")]);
        let faq_summary = doc.element(faq, "summary", &[]);
        doc.text(faq_summary, "كيف أتواصل معكم؟");

        let contact = doc.element(main, "section", &[("id", "contact")]);
        let form = doc.element(contact, "form", &[("data-validate", "")]);
        let email = doc.element(form, "input", &[("type", "email"), ("required", "")]);
        let name = doc.element(form, "input", &[("type", "text"), ("required", "")]);
        let message = doc.element(form, "textarea", &[("minlength", "10")]);

        let scroll_top = doc.element(body, "button", &[("id", "scroll-top")]);

        Site {
            doc,
            theme_toggle,
            form,
            email,
            name,
            message,
            contact_link,
            contact,
            menu_toggle,
            menu,
            faq,
            faq_summary,
            card,
            photo,
            scroll_top,
        }
    }

    fn errors(doc: &MemoryDocument, form: NodeId) -> Vec<String> {
        doc.query_within(&form, &Selector::parse(".error-message").unwrap())
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    }

    #[test]
    fn wires_every_behavior() {
        let site = site();
        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&site.doc, &store, &timers);
        let page = Page::new(&SiteConfig::default(), &cx).unwrap();

        let doc = &site.doc;
        assert_eq!(doc.attribute(&doc.root(), "data-theme").as_deref(), Some("light"));
        assert!(doc.is_listening(site.theme_toggle, Hook::ThemeToggle));
        assert!(doc.is_listening(site.form, Hook::FormSubmit));
        for field in [site.email, site.name, site.message] {
            assert!(doc.is_listening(field, Hook::FieldBlur));
            assert!(doc.is_listening(field, Hook::FieldInput));
        }
        assert!(doc.is_listening(site.contact_link, Hook::FragmentLink));
        assert!(doc.is_listening(site.menu_toggle, Hook::MenuToggle));
        assert!(doc.is_listening(site.faq_summary, Hook::FaqSummary));
        assert!(doc.is_listening(site.scroll_top, Hook::ScrollTopClick));
        assert_eq!(doc.observed(Watch::Reveal), vec![site.card]);
        assert_eq!(doc.observed(Watch::LazyImage), vec![site.photo]);
        assert_eq!(page.forms().forms(), &[site.form]);
    }

    #[test]
    fn routes_events_to_their_behaviors() {
        let site = site();
        let doc = &site.doc;
        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(doc, &store, &timers);
        let page = Page::new(&SiteConfig::default(), &cx).unwrap();
        let fire = |key: TaskKey| page.fire(&cx, key);

        page.handle(&cx, &DomEvent::on(Hook::ThemeToggle, site.theme_toggle));
        assert_eq!(store.get("theme").as_deref(), Some("dark"));

        let flow = page.handle(&cx, &DomEvent::on(Hook::FragmentLink, site.contact_link));
        assert_eq!(flow, Flow::PREVENT);
        assert_eq!(doc.scrolled_into_view(), vec![site.contact]);

        page.handle(&cx, &DomEvent::on(Hook::MenuToggle, site.menu_toggle));
        assert!(doc.has_class(&site.menu, "show"));
        page.handle(
            &cx,
            &DomEvent {
                hook: Hook::OutsideClick,
                current: doc.root(),
                target: site.card,
            },
        );
        assert!(!doc.has_class(&site.menu, "show"));

        page.handle(&cx, &DomEvent::on(Hook::FaqSummary, site.faq_summary));
        assert!(doc.has_class(&site.faq, "opening"));

        page.intersect(&cx, Watch::Reveal, &site.card, true);
        page.intersect(&cx, Watch::LazyImage, &site.photo, true);
        assert!(doc.has_class(&site.card, "animate-fade-in"));
        assert_eq!(doc.attribute(&site.photo, "src").as_deref(), Some("/img/office.webp"));

        doc.set_scroll_offset(1200.0);
        page.handle(&cx, &DomEvent::on(Hook::WindowScroll, doc.root()));
        timers.advance(Duration::from_millis(300), fire);
        assert!(!doc.has_class(&site.faq, "opening"));
        assert!(doc.has_class(&site.scroll_top, "show"));

        page.handle(&cx, &DomEvent::on(Hook::ScrollTopClick, site.scroll_top));
        assert_eq!(doc.scrolls_to_top(), 1);
    }

    #[test]
    fn contact_form_round_trip() {
        let site = site();
        let doc = &site.doc;
        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(doc, &store, &timers);
        let page = Page::new(&SiteConfig::default(), &cx).unwrap();
        let fire = |key: TaskKey| page.fire(&cx, key);
        let messages = SiteConfig::default().messages;

        // blur on the optional message checks its minlength, typing then clears it
        doc.set_value(site.message, "short");
        page.handle(&cx, &DomEvent::on(Hook::FieldBlur, site.message));
        assert_eq!(errors(doc, site.form), vec![messages.too_short.replace("{min}", "10")]);
        doc.set_value(site.message, "a much longer message");
        page.handle(&cx, &DomEvent::on(Hook::FieldInput, site.message));
        assert!(errors(doc, site.form).is_empty());

        doc.set_value(site.email, "a@b");
        doc.set_value(site.name, "hello");
        let flow = page.handle(&cx, &DomEvent::on(Hook::FormSubmit, site.form));
        assert_eq!(flow, Flow::PREVENT);
        assert_eq!(errors(doc, site.form), vec![messages.invalid_email.clone()]);

        doc.set_value(site.email, "a@b.com");
        page.handle(&cx, &DomEvent::on(Hook::FieldInput, site.email));
        assert!(errors(doc, site.form).is_empty());

        // the optional message is too short again, but submission does not look at it
        doc.set_value(site.message, "short");
        let flow = page.handle(&cx, &DomEvent::on(Hook::FormSubmit, site.form));
        assert_eq!(flow, Flow::PREVENT);
        assert!(errors(doc, site.form).is_empty());
        assert_eq!(doc.value(&site.email), "");
        assert_eq!(doc.value(&site.message), "");

        let banner = Selector::parse(".alert-success").unwrap();
        assert_eq!(doc.query_within(&site.form, &banner).len(), 1);
        timers.advance(Duration::from_millis(3300), fire);
        assert!(doc.query_within(&site.form, &banner).is_empty());
    }

    #[test]
    fn bad_configured_selector_is_reported() {
        let site = site();
        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&site.doc, &store, &timers);

        let mut config = SiteConfig::default();
        config.faq.item_selector = String::from("details > .faq-item");

        let err = Page::new(&config, &cx).err().unwrap();
        assert!(err.to_string().contains("faq.item_selector"));
    }
}
