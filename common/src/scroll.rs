use anyhow::Result;
use tracing::debug;

use crate::{
    Context,
    config::AnchorConfig,
    dom::{Document, Flow, Hook},
    selector::Selector,
};

// smooth scroller for in-page fragment links
pub struct SmoothScroller {
    links: usize,
}

impl SmoothScroller {
    pub fn init<D: Document>(cx: &Context<D>, config: &AnchorConfig) -> Result<Self> {
        let selector = crate::parse_selector("anchors.link_selector", &config.link_selector)?;

        let links = cx.doc.query_all(&selector);
        for link in &links {
            cx.doc.listen(link, Hook::FragmentLink);
        }

        Ok(SmoothScroller { links: links.len() })
    }

    pub fn links(&self) -> usize {
        self.links
    }

    // a bare `#` keeps its native meaning (jump to top); anything longer is ours even if
    // nothing on the page answers to it
    pub fn on_click<D: Document>(&self, doc: &D, link: &D::Node) -> Flow {
        let Some(href) = doc.attribute(link, "href") else {
            return Flow::PROCEED;
        };
        if href == "#" || href.len() <= 1 {
            return Flow::PROCEED;
        }

        match Selector::parse(&href) {
            Ok(target) => match doc.query_first(&target) {
                Some(node) => doc.scroll_into_view(&node),
                None => debug!("fragment link {href} points at nothing"),
            },
            Err(err) => debug!("fragment link {href} is not a selector: {err}"),
        }

        Flow::PREVENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dom::memory::MemoryDocument, schedule::VirtualTimers, store::MemoryStore};

    #[test]
    fn scrolls_to_the_fragment_target() {
        let doc = MemoryDocument::new();
        let nav = doc.element(doc.body(), "nav", &[]);
        let to_faq = doc.element(nav, "a", &[("href", "#faq")]);
        let to_top = doc.element(nav, "a", &[("href", "#")]);
        let missing = doc.element(nav, "a", &[("href", "#nowhere")]);
        let external = doc.element(nav, "a", &[("href", "/about#team")]);
        let faq = doc.element(doc.body(), "section", &[("id", "faq")]);

        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&doc, &store, &timers);
        let scroller = SmoothScroller::init(&cx, &AnchorConfig::default()).unwrap();

        assert_eq!(scroller.links(), 3);
        assert!(!doc.is_listening(external, Hook::FragmentLink));

        assert_eq!(scroller.on_click(&doc, &to_faq), Flow::PREVENT);
        assert_eq!(doc.scrolled_into_view(), vec![faq]);

        assert_eq!(scroller.on_click(&doc, &to_top), Flow::PROCEED);
        assert_eq!(scroller.on_click(&doc, &missing), Flow::PREVENT);
        assert_eq!(doc.scrolled_into_view(), vec![faq]);
    }

    #[test]
    fn unparseable_fragment_is_swallowed() {
        let doc = MemoryDocument::new();
        let odd = doc.element(doc.body(), "a", &[("href", "#a b")]);

        let store = MemoryStore::new();
        let timers = VirtualTimers::new();
        let cx = Context::new(&doc, &store, &timers);
        let scroller = SmoothScroller::init(&cx, &AnchorConfig::default()).unwrap();

        assert_eq!(scroller.on_click(&doc, &odd), Flow::PREVENT);
        assert!(doc.scrolled_into_view().is_empty());
    }
}
