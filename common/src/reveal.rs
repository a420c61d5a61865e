use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    Context,
    config::RevealConfig,
    dom::{Document, ObserverOptions, Watch},
};

const REVEALED_CLASS: &str = "animate-fade-in";

// scroll-triggered reveal
//
// one shot per element: the first time it comes into view it gets the animation class and
// is never looked at again
pub struct RevealObserver {
    watching: usize,
}

impl RevealObserver {
    pub fn init<D: Document>(cx: &Context<D>, config: &RevealConfig) -> Result<Self> {
        let selector = crate::parse_selector("reveal.selector", &config.selector)?;

        if !cx.doc.supports_intersection() {
            warn!("no intersection observer, reveal animations disabled");
            return Ok(RevealObserver { watching: 0 });
        }

        let options = ObserverOptions {
            threshold: config.threshold,
            root_margin: config.root_margin.clone(),
        };

        let targets = cx.doc.query_all(&selector);
        for target in &targets {
            cx.doc.observe(target, Watch::Reveal, &options);
        }

        debug!("watching {} element(s) for reveal", targets.len());
        Ok(RevealObserver {
            watching: targets.len(),
        })
    }

    pub fn watching(&self) -> usize {
        self.watching
    }

    pub fn on_intersect<D: Document>(&self, doc: &D, target: &D::Node, intersecting: bool) {
        if !intersecting {
            return;
        }

        doc.add_class(target, REVEALED_CLASS);
        doc.unobserve(target, Watch::Reveal);
    }
}
