use std::cell::OnceCell;

use anyhow::Result;
use tracing::{Level, error, warn};
use web_sys::Element;

use common::{
    Context, Page,
    config::SiteConfig,
    dom::{DomEvent, Flow, Watch},
    schedule::TaskKey,
};

mod dom;
use dom::WebDocument;

mod storage;
use storage::LocalStore;

mod timers;
use timers::BrowserTimers;

// id of an optional <script type="application/json"> holding a SiteConfig override
const CONFIG_ELEMENT_ID: &str = "site-config";

fn main() {
    let level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    dioxus_logger::init(level).expect("failed to init logger");

    // nothing on the page depends on us, so failing to start just leaves it static
    if let Err(err) = start() {
        error!("page behaviors disabled: {err:#}");
    }
}

// everything the browser calls back into
//
// the runtime is built once and lives as long as the tab, so it is leaked rather than
// reference counted.  callbacks find it through RUNTIME; any that fire before the page is
// ready (none should, initialization is synchronous) are ignored
struct Runtime {
    doc: WebDocument,
    store: LocalStore,
    timers: BrowserTimers,
    page: OnceCell<Page<Element>>,
}

impl Runtime {
    fn context(&self) -> Context<'_, WebDocument> {
        Context::new(&self.doc, &self.store, &self.timers)
    }
}

thread_local! {
    static RUNTIME: OnceCell<&'static Runtime> = const { OnceCell::new() };
}

fn with_page<R>(f: impl FnOnce(&Runtime, &Page<Element>) -> R) -> Option<R> {
    RUNTIME.with(|cell| {
        let runtime = cell.get()?;
        let page = runtime.page.get()?;
        Some(f(runtime, page))
    })
}

fn on_event(event: DomEvent<Element>) -> Flow {
    with_page(|runtime, page| page.handle(&runtime.context(), &event)).unwrap_or_default()
}

fn on_intersect(watch: Watch, node: Element, intersecting: bool) {
    with_page(|runtime, page| page.intersect(&runtime.context(), watch, &node, intersecting));
}

fn on_timer(key: TaskKey) {
    with_page(|runtime, page| {
        runtime.timers.finished(key);
        page.fire(&runtime.context(), key);
    });
}

fn load_config(doc: &WebDocument) -> SiteConfig {
    let Some(text) = doc.text_of(CONFIG_ELEMENT_ID) else {
        return SiteConfig::default();
    };

    SiteConfig::from_json(&text).unwrap_or_else(|err| {
        warn!("ignoring #{CONFIG_ELEMENT_ID}: {err}");
        SiteConfig::default()
    })
}

fn start() -> Result<()> {
    let doc = WebDocument::new(on_event, on_intersect)?;
    let config = load_config(&doc);

    let runtime: &'static Runtime = Box::leak(Box::new(Runtime {
        doc,
        store: LocalStore,
        timers: BrowserTimers::new(on_timer),
        page: OnceCell::new(),
    }));

    RUNTIME
        .with(|cell| cell.set(runtime))
        .map_err(|_| anyhow::Error::msg("page behaviors already started"))?;

    let page = Page::new(&config, &runtime.context())?;
    runtime
        .page
        .set(page)
        .map_err(|_| anyhow::Error::msg("page already built"))?;

    Ok(())
}
