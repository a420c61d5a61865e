use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    Context,
    config::LazyConfig,
    dom::{Document, ObserverOptions, Watch},
};

const LOADED_CLASS: &str = "loaded";

// lazy images
//
// images ship with their real source parked in a staging attribute; it moves to `src` the
// first time the image is seen.  without intersection support the images simply stay parked
pub struct LazyImages {
    staged: String,
    watching: usize,
}

impl LazyImages {
    pub fn init<D: Document>(cx: &Context<D>, config: &LazyConfig) -> Result<Self> {
        let selector = crate::parse_selector("lazy.selector", &config.selector)?;

        let mut lazy = LazyImages {
            staged: config.staged_attribute.clone(),
            watching: 0,
        };

        if !cx.doc.supports_intersection() {
            warn!("no intersection observer, lazy images will not load");
            return Ok(lazy);
        }

        let images = cx.doc.query_all(&selector);
        for image in &images {
            cx.doc.observe(image, Watch::LazyImage, &ObserverOptions::default());
        }

        debug!("lazy loading {} image(s)", images.len());
        lazy.watching = images.len();
        Ok(lazy)
    }

    pub fn watching(&self) -> usize {
        self.watching
    }

    pub fn on_intersect<D: Document>(&self, doc: &D, image: &D::Node, intersecting: bool) {
        if !intersecting {
            return;
        }

        if let Some(src) = doc.attribute(image, &self.staged) {
            doc.set_attribute(image, "src", &src);
            doc.remove_attribute(image, &self.staged);
            doc.add_class(image, LOADED_CLASS);
        }

        doc.unobserve(image, Watch::LazyImage);
    }
}
