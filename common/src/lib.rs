use dom::Document;
use schedule::Scheduler;
use store::PreferenceStore;

pub mod config;
pub mod dom;
pub mod faq;
pub mod lazy;
pub mod menu;
pub mod page;
pub mod reveal;
pub mod schedule;
pub mod scroll;
pub mod scroll_top;
pub mod selector;
pub mod store;
pub mod theme;
pub mod validate;

pub use page::Page;

// the environment every behavior runs against
//
// the page never owns any of these: in the browser they live for the lifetime of the tab, and
// in tests they are plain locals the test inspects afterwards
pub struct Context<'a, D: Document> {
    pub doc: &'a D,
    pub store: &'a dyn PreferenceStore,
    pub timers: &'a dyn Scheduler,
}

impl<'a, D: Document> Context<'a, D> {
    pub fn new(doc: &'a D, store: &'a dyn PreferenceStore, timers: &'a dyn Scheduler) -> Self {
        Context { doc, store, timers }
    }
}

// parse a configured selector, naming the setting it came from on failure
pub(crate) fn parse_selector(setting: &str, css: &str) -> anyhow::Result<selector::Selector> {
    selector::Selector::parse(css)
        .map_err(|err| anyhow::Error::new(err).context(format!("invalid selector for {setting}")))
}
