use std::{fmt, str::FromStr};

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::{
    Context,
    config::{Messages, ThemeConfig},
    dom::{Document, Flow, Hook},
    selector::Selector,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow::Error::msg(format!("unknown theme {other:?}"))),
        }
    }
}

// theme controller
//
// the <html> attribute is the source of truth while the page is up; storage only matters at
// load time.  every toggle writes both, so the two never disagree for long
pub struct ThemeController<N> {
    toggle: Option<N>,
    icon: Selector,
    config: ThemeConfig,
    activate_light: String,
    activate_dark: String,
}

impl<N: Clone + PartialEq> ThemeController<N> {
    pub fn init<D: Document<Node = N>>(
        cx: &Context<D>,
        config: &ThemeConfig,
        messages: &Messages,
    ) -> Result<Self> {
        let controller = ThemeController {
            toggle: cx.doc.by_id(&config.toggle_id),
            icon: crate::parse_selector("theme.icon_selector", &config.icon_selector)?,
            config: config.clone(),
            activate_light: messages.activate_light.clone(),
            activate_dark: messages.activate_dark.clone(),
        };

        let theme = controller.stored(cx);
        controller.apply(cx.doc, theme);

        match &controller.toggle {
            Some(toggle) => cx.doc.listen(toggle, Hook::ThemeToggle),
            None => debug!("no #{} on this page, theme is fixed", config.toggle_id),
        }

        Ok(controller)
    }

    // the theme the document currently shows
    pub fn current<D: Document<Node = N>>(&self, doc: &D) -> Theme {
        doc.attribute(&doc.root(), &self.config.attribute)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn on_toggle<D: Document<Node = N>>(&self, cx: &Context<D>) -> Flow {
        let theme = self.current(cx.doc).toggled();
        self.apply(cx.doc, theme);

        // the switch already happened on screen; a storage failure only costs us persistence
        if let Err(err) = cx.store.set(&self.config.storage_key, theme.as_str()) {
            error!("failed to persist theme {theme}: {err}");
        }

        debug!("switched to {theme} theme");
        Flow::PROCEED
    }

    fn stored<D: Document<Node = N>>(&self, cx: &Context<D>) -> Theme {
        match cx.store.get(&self.config.storage_key) {
            None => Theme::default(),
            Some(value) => value.parse().unwrap_or_else(|err| {
                warn!("ignoring stored theme: {err}");
                Theme::default()
            }),
        }
    }

    fn apply<D: Document<Node = N>>(&self, doc: &D, theme: Theme) {
        doc.set_attribute(&doc.root(), &self.config.attribute, theme.as_str());

        let Some(toggle) = &self.toggle else {
            return;
        };

        // the label describes what clicking will do, not the current state
        if let Some(icon) = doc.first_within(toggle, &self.icon) {
            let label = match theme {
                Theme::Dark => &self.activate_light,
                Theme::Light => &self.activate_dark,
            };
            doc.set_attribute(&icon, "aria-label", label);
        }
    }
}
