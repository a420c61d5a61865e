use tracing::debug;

use crate::{
    Context,
    config::ScrollTopConfig,
    dom::{Document, Flow, Hook},
    schedule::TaskKey,
};

const VISIBLE_CLASS: &str = "show";

// scroll-to-top button
//
// scroll events arrive far faster than the button needs to react, so each one only re-arms
// the ScrollCheck task; the offset is read when the scrolling settles
pub struct ScrollTopButton<N> {
    button: Option<N>,
    config: ScrollTopConfig,
}

impl<N: Clone + PartialEq> ScrollTopButton<N> {
    pub fn init<D: Document<Node = N>>(cx: &Context<D>, config: &ScrollTopConfig) -> Self {
        let button = cx.doc.by_id(&config.button_id);

        match &button {
            Some(button) => {
                cx.doc.listen_window(Hook::WindowScroll);
                cx.doc.listen(button, Hook::ScrollTopClick);
            }
            None => debug!("no #{} on this page", config.button_id),
        }

        ScrollTopButton {
            button,
            config: config.clone(),
        }
    }

    pub fn on_scroll<D: Document<Node = N>>(&self, cx: &Context<D>) -> Flow {
        if self.button.is_some() {
            cx.timers
                .schedule(TaskKey::ScrollCheck, self.config.debounce());
        }
        Flow::PROCEED
    }

    pub fn on_click<D: Document<Node = N>>(&self, doc: &D) -> Flow {
        doc.scroll_to_top();
        Flow::PROCEED
    }

    pub fn fire<D: Document<Node = N>>(&self, cx: &Context<D>, key: TaskKey) {
        let (TaskKey::ScrollCheck, Some(button)) = (key, &self.button) else {
            return;
        };

        if cx.doc.scroll_offset() > self.config.threshold_px {
            cx.doc.add_class(button, VISIBLE_CLASS);
        } else {
            cx.doc.remove_class(button, VISIBLE_CLASS);
        }
    }
}
