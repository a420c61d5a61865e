use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// site configuration
//
// this struct contains every selector, id, timing and user-facing string the page behaviors
// rely on.  the defaults reproduce the markup the site has always shipped with, so an empty
// override (or none at all) yields the historical behavior.  each section defaults on its
// own, meaning an override only has to mention what it changes.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub theme: ThemeConfig,
    pub forms: FormConfig,
    pub anchors: AnchorConfig,
    pub reveal: RevealConfig,
    pub menu: MenuConfig,
    pub faq: FaqConfig,
    pub lazy: LazyConfig,
    pub scroll_top: ScrollTopConfig,
    pub messages: Messages,
}

impl SiteConfig {
    #[instrument(skip(doc))]
    pub fn from_json(doc: &str) -> Result<Self> {
        let config: SiteConfig = serde_json::from_str(doc)?;

        debug!({ config = ?config }, "parsed site configuration");

        Ok(config)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub storage_key: String,
    // attribute on <html> the stylesheet keys off
    pub attribute: String,
    pub toggle_id: String,
    // the icon inside the toggle that carries the aria-label
    pub icon_selector: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        ThemeConfig {
            storage_key: String::from("theme"),
            attribute: String::from("data-theme"),
            toggle_id: String::from("theme-toggle"),
            icon_selector: String::from("i, svg, img"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FormConfig {
    pub form_selector: String,
    // fields validated on blur and input
    pub field_selector: String,
    // fields re-checked on submit
    pub required_selector: String,
    pub banner_visible_ms: u64,
    pub banner_fade_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            form_selector: String::from("form[data-validate]"),
            field_selector: String::from("input, textarea"),
            required_selector: String::from("input[required], textarea[required]"),
            banner_visible_ms: 3000,
            banner_fade_ms: 300,
        }
    }
}

impl FormConfig {
    pub fn banner_visible(&self) -> Duration {
        Duration::from_millis(self.banner_visible_ms)
    }

    pub fn banner_fade(&self) -> Duration {
        Duration::from_millis(self.banner_fade_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub link_selector: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        AnchorConfig {
            link_selector: String::from("a[href^=\"#\"]"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RevealConfig {
    pub selector: String,
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        RevealConfig {
            selector: String::from(".animate-on-scroll"),
            threshold: 0.1,
            root_margin: String::from("0px 0px -50px 0px"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MenuConfig {
    pub toggle_id: String,
    pub panel_id: String,
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            toggle_id: String::from("mobile-menu-toggle"),
            panel_id: String::from("mobile-menu"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FaqConfig {
    pub item_selector: String,
    pub summary_selector: String,
    pub settle_ms: u64,
}

impl Default for FaqConfig {
    fn default() -> Self {
        FaqConfig {
            item_selector: String::from("details.faq-item"),
            summary_selector: String::from("summary"),
            settle_ms: 300,
        }
    }
}

impl FaqConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LazyConfig {
    pub selector: String,
    // attribute holding the real source until the image scrolls into view
    pub staged_attribute: String,
}

impl Default for LazyConfig {
    fn default() -> Self {
        LazyConfig {
            selector: String::from("img[data-src]"),
            staged_attribute: String::from("data-src"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollTopConfig {
    pub button_id: String,
    pub threshold_px: f64,
    pub debounce_ms: u64,
}

impl Default for ScrollTopConfig {
    fn default() -> Self {
        ScrollTopConfig {
            button_id: String::from("scroll-top"),
            threshold_px: 300.0,
            debounce_ms: 100,
        }
    }
}

impl ScrollTopConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// user-facing strings
//
// the site is arabic, so are the defaults.  `too_short` substitutes {min} with the declared
// minimum length
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Messages {
    pub required: String,
    pub invalid_email: String,
    pub invalid_phone: String,
    pub too_short: String,
    pub banner_headline: String,
    pub banner_body: String,
    pub activate_light: String,
    pub activate_dark: String,
    pub open_menu: String,
    pub close_menu: String,
}

impl Default for Messages {
    fn default() -> Self {
        Messages {
            required: String::from("هذا الحقل مطلوب"),
            invalid_email: String::from("يرجى إدخال بريد إلكتروني صحيح"),
            invalid_phone: String::from("يرجى إدخال رقم هاتف صحيح"),
            too_short: String::from("يجب أن يكون النص على الأقل {min} أحرف"),
            banner_headline: String::from("تم الإرسال بنجاح!"),
            banner_body: String::from("شكراً لتواصلك معنا."),
            activate_light: String::from("تفعيل الوضع الفاتح"),
            activate_dark: String::from("تفعيل الوضع الداكن"),
            open_menu: String::from("فتح القائمة"),
            close_menu: String::from("إغلاق القائمة"),
        }
    }
}
