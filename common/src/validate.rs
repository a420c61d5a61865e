use anyhow::Result;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::{
    Context,
    config::{FormConfig, Messages},
    dom::{Document, Flow, Hook},
    schedule::TaskKey,
    selector::Selector,
};

// field shapes
//
// loose shape checks only, anything with an @ and a dotted domain passes as an email
pub const EMAIL_REGEX: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
pub const PHONE_REGEX: &str = r"^[0-9+\-\s()]+$";
pub const PHONE_MIN_LEN: usize = 10;

// trim and length as the browser sees them: U+FEFF counts as whitespace and lengths are in
// utf-16 code units, the same units minlength is declared in
fn trim_field(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

fn field_len(value: &str) -> usize {
    value.encode_utf16().count()
}

// markup produced by the validator
const ERROR_CLASS: &str = "error";
const SUCCESS_CLASS: &str = "success";
const ERROR_MESSAGE_CLASS: &str = "error-message";
const BANNER_MARKER: &str = "data-form-banner";
const BANNER_STYLE: &str = "padding: 16px; background-color: #d4edda; color: #155724; border-radius: 8px; margin-bottom: 24px;";
const BANNER_FADE_STYLE: &str = "transition: opacity 0.3s; opacity: 0;";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("required field is empty")]
    MissingRequired,
    #[error("not an email address")]
    InvalidEmail,
    #[error("not a phone number")]
    InvalidPhone,
    #[error("shorter than {min} characters")]
    TooShort { min: usize },
}

impl FieldError {
    // the inline message shown next to the field
    pub fn localize(&self, messages: &Messages) -> String {
        match self {
            FieldError::MissingRequired => messages.required.clone(),
            FieldError::InvalidEmail => messages.invalid_email.clone(),
            FieldError::InvalidPhone => messages.invalid_phone.clone(),
            FieldError::TooShort { min } => messages.too_short.replace("{min}", &min.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Tel,
    #[default]
    Other,
}

impl FieldKind {
    pub fn from_type(value: Option<&str>) -> Self {
        match value {
            Some(t) if t.eq_ignore_ascii_case("email") => FieldKind::Email,
            Some(t) if t.eq_ignore_ascii_case("tel") => FieldKind::Tel,
            _ => FieldKind::Other,
        }
    }
}

// the constraints a field declares through its attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldRules {
    pub required: bool,
    pub kind: FieldKind,
    pub min_length: Option<usize>,
}

impl FieldRules {
    pub fn read<D: Document>(doc: &D, field: &D::Node) -> Self {
        FieldRules {
            required: doc.has_attribute(field, "required"),
            kind: FieldKind::from_type(doc.attribute(field, "type").as_deref()),
            // a minlength that is not a number constrains nothing
            min_length: doc
                .attribute(field, "minlength")
                .and_then(|v| v.trim().parse().ok()),
        }
    }
}

// rule evaluation
//
// pure and headless: given what a field declares and what it holds, decide whether it passes.
// rules run in a fixed order and the first failure is the one reported
#[derive(Clone, Debug)]
pub struct FieldChecker {
    email: Regex,
    phone: Regex,
}

impl FieldChecker {
    pub fn new() -> Result<Self> {
        Ok(FieldChecker {
            email: Regex::new(EMAIL_REGEX)?,
            phone: Regex::new(PHONE_REGEX)?,
        })
    }

    pub fn check(&self, rules: &FieldRules, raw: &str) -> Result<(), FieldError> {
        let value = trim_field(raw);

        if rules.required && value.is_empty() {
            return Err(FieldError::MissingRequired);
        }

        if !value.is_empty() {
            match rules.kind {
                FieldKind::Email if !self.email.is_match(value) => {
                    return Err(FieldError::InvalidEmail);
                }
                FieldKind::Tel
                    if !self.phone.is_match(value)
                        || field_len(value) < PHONE_MIN_LEN =>
                {
                    return Err(FieldError::InvalidPhone);
                }
                _ => {}
            }
        }

        // no emptiness guard here: an optional field with a minlength still has to meet it
        if let Some(min) = rules.min_length {
            if field_len(value) < min {
                return Err(FieldError::TooShort { min });
            }
        }

        Ok(())
    }
}

// form validator
//
// every form matching forms.form_selector gets a submit hook and each of its fields a blur
// and input hook.  the per-form index doubles as the key for that form's banner timers
pub struct FormValidator<N> {
    forms: Vec<N>,
    checker: FieldChecker,
    fields: Selector,
    required: Selector,
    error_messages: Selector,
    marked: Selector,
    banner: Selector,
    config: FormConfig,
    messages: Messages,
}

impl<N: Clone + PartialEq + std::fmt::Debug> FormValidator<N> {
    pub fn init<D: Document<Node = N>>(
        cx: &Context<D>,
        config: &FormConfig,
        messages: &Messages,
    ) -> Result<Self> {
        let validator = FormValidator {
            forms: cx
                .doc
                .query_all(&crate::parse_selector("forms.form_selector", &config.form_selector)?),
            checker: FieldChecker::new()?,
            fields: crate::parse_selector("forms.field_selector", &config.field_selector)?,
            required: crate::parse_selector("forms.required_selector", &config.required_selector)?,
            error_messages: Selector::parse(".error-message")?,
            marked: Selector::parse(".error, .success, [aria-invalid]")?,
            banner: Selector::parse("[data-form-banner]")?,
            config: config.clone(),
            messages: messages.clone(),
        };

        for form in &validator.forms {
            cx.doc.listen(form, Hook::FormSubmit);

            for field in cx.doc.query_within(form, &validator.fields) {
                cx.doc.listen(&field, Hook::FieldBlur);
                cx.doc.listen(&field, Hook::FieldInput);
            }
        }

        debug!("validating {} form(s)", validator.forms.len());
        Ok(validator)
    }

    pub fn forms(&self) -> &[N] {
        &self.forms
    }

    // re-evaluate one field and bring its markup in line with the result
    //
    // calling this twice on an unchanged field leaves the document exactly as one call does
    pub fn validate_field<D: Document<Node = N>>(&self, doc: &D, field: &N) -> bool {
        self.clear_field(doc, field);

        let value = doc.value(field);
        match self.checker.check(&FieldRules::read(doc, field), &value) {
            Ok(()) => {
                if !trim_field(&value).is_empty() {
                    doc.add_class(field, SUCCESS_CLASS);
                }
                true
            }
            Err(err) => {
                debug!("field {field:?} failed validation: {err}");

                doc.add_class(field, ERROR_CLASS);
                doc.set_attribute(field, "aria-invalid", "true");
                if let Err(err) = self.attach_message(doc, field, &err) {
                    error!("failed to show validation message: {err}");
                }
                false
            }
        }
    }

    // run every required field, without stopping at the first failure so that all of them get
    // their message.  fields that only carry type or length constraints are left alone here,
    // they are checked on blur and input only
    pub fn validate_form<D: Document<Node = N>>(&self, doc: &D, form: &N) -> bool {
        doc.query_within(form, &self.required)
            .iter()
            .fold(true, |valid, field| self.validate_field(doc, field) && valid)
    }

    #[instrument(skip_all)]
    pub fn on_submit<D: Document<Node = N>>(&self, cx: &Context<D>, form: &N) -> Flow {
        // the page never posts anywhere, so the browser's submission is always suppressed
        let Some(index) = self.index_of(form) else {
            return Flow::PREVENT;
        };

        if !self.validate_form(cx.doc, form) {
            debug!("form {index} has invalid fields, not submitting");
            return Flow::PREVENT;
        }

        if let Err(err) = self.show_banner(cx, index, form) {
            error!("failed to show success banner: {err}");
        }

        cx.doc.reset_form(form);
        self.clear_form(cx.doc, form);

        Flow::PREVENT
    }

    pub fn on_blur<D: Document<Node = N>>(&self, doc: &D, field: &N) -> Flow {
        self.validate_field(doc, field);
        Flow::PROCEED
    }

    // once a field has been flagged, every keystroke re-checks it so the message goes away as
    // soon as the value is fixed.  unflagged fields wait for blur
    pub fn on_input<D: Document<Node = N>>(&self, doc: &D, field: &N) -> Flow {
        if doc.has_class(field, ERROR_CLASS) {
            self.validate_field(doc, field);
        }
        Flow::PROCEED
    }

    pub fn fire<D: Document<Node = N>>(&self, cx: &Context<D>, key: TaskKey) {
        let index = match key {
            TaskKey::BannerFade(i) | TaskKey::BannerRemove(i) => i,
            _ => return,
        };

        let Some(form) = self.forms.get(index) else {
            return;
        };
        let Some(banner) = cx.doc.first_within(form, &self.banner) else {
            return;
        };

        match key {
            TaskKey::BannerFade(_) => {
                let style = format!("{BANNER_STYLE} {BANNER_FADE_STYLE}");
                cx.doc.set_attribute(&banner, "style", &style);
                cx.timers
                    .schedule(TaskKey::BannerRemove(index), self.config.banner_fade());
            }
            _ => cx.doc.remove(&banner),
        }
    }

    fn index_of(&self, form: &N) -> Option<usize> {
        self.forms.iter().position(|f| f == form)
    }

    fn clear_field<D: Document<Node = N>>(&self, doc: &D, field: &N) {
        if let Some(next) = doc.next_sibling(field) {
            if doc.has_class(&next, ERROR_MESSAGE_CLASS) {
                doc.remove(&next);
            }
        }

        doc.remove_class(field, ERROR_CLASS);
        doc.remove_class(field, SUCCESS_CLASS);
        doc.remove_attribute(field, "aria-invalid");
    }

    fn clear_form<D: Document<Node = N>>(&self, doc: &D, form: &N) {
        for node in doc.query_within(form, &self.error_messages) {
            doc.remove(&node);
        }

        for node in doc.query_within(form, &self.marked) {
            doc.remove_class(&node, ERROR_CLASS);
            doc.remove_class(&node, SUCCESS_CLASS);
            doc.remove_attribute(&node, "aria-invalid");
        }
    }

    fn attach_message<D: Document<Node = N>>(
        &self,
        doc: &D,
        field: &N,
        err: &FieldError,
    ) -> Result<()> {
        let span = doc.create_element("span")?;
        doc.set_attribute(&span, "class", ERROR_MESSAGE_CLASS);
        doc.set_attribute(&span, "role", "alert");
        doc.set_attribute(&span, "aria-live", "polite");
        doc.append_text(&span, &err.localize(&self.messages))?;

        doc.insert_after(field, &span)
    }

    // one banner per form: a second success while the first is still up replaces it and
    // restarts the clock
    fn show_banner<D: Document<Node = N>>(&self, cx: &Context<D>, index: usize, form: &N) -> Result<()> {
        for stale in cx.doc.query_within(form, &self.banner) {
            cx.doc.remove(&stale);
        }
        cx.timers.cancel(TaskKey::BannerRemove(index));

        let doc = cx.doc;
        let banner = doc.create_element("div")?;
        doc.set_attribute(&banner, "class", "alert alert-success");
        doc.set_attribute(&banner, "role", "alert");
        doc.set_attribute(&banner, "aria-live", "polite");
        doc.set_attribute(&banner, BANNER_MARKER, "");
        doc.set_attribute(&banner, "style", BANNER_STYLE);

        let headline = doc.create_element("strong")?;
        doc.append_text(&headline, &self.messages.banner_headline)?;
        doc.append_child(&banner, &headline)?;
        doc.append_text(&banner, &format!(" {}", self.messages.banner_body))?;

        doc.prepend(form, &banner)?;

        cx.timers
            .schedule(TaskKey::BannerFade(index), self.config.banner_visible());
        Ok(())
    }
}
