use anyhow::Result;

use crate::{
    Context,
    config::FaqConfig,
    dom::{Document, Flow, Hook},
    schedule::TaskKey,
    selector::Selector,
};

const OPENING_CLASS: &str = "opening";

// faq accordion
//
// the browser does the actual opening and closing of <details>; all we add is a short-lived
// class the stylesheet animates on
pub struct FaqAccordion<N> {
    items: Vec<N>,
    item_selector: Selector,
    config: FaqConfig,
}

impl<N: Clone + PartialEq> FaqAccordion<N> {
    pub fn init<D: Document<Node = N>>(cx: &Context<D>, config: &FaqConfig) -> Result<Self> {
        let item_selector = crate::parse_selector("faq.item_selector", &config.item_selector)?;
        let items = cx.doc.query_all(&item_selector);
        let summaries = crate::parse_selector("faq.summary_selector", &config.summary_selector)?;

        for item in &items {
            if let Some(summary) = cx.doc.first_within(item, &summaries) {
                cx.doc.listen(&summary, Hook::FaqSummary);
            }
        }

        Ok(FaqAccordion {
            items,
            item_selector,
            config: config.clone(),
        })
    }

    pub fn on_summary_click<D: Document<Node = N>>(&self, cx: &Context<D>, summary: &N) -> Flow {
        let index = cx
            .doc
            .closest(summary, &self.item_selector)
            .and_then(|item| self.items.iter().position(|i| *i == item));

        if let Some(index) = index {
            cx.doc.add_class(&self.items[index], OPENING_CLASS);
            cx.timers
                .schedule(TaskKey::FaqSettle(index), self.config.settle());
        }

        // never suppressed, the native toggle is the point
        Flow::PROCEED
    }

    pub fn fire<D: Document<Node = N>>(&self, cx: &Context<D>, key: TaskKey) {
        if let TaskKey::FaqSettle(index) = key {
            if let Some(item) = self.items.get(index) {
                cx.doc.remove_class(item, OPENING_CLASS);
            }
        }
    }
}
