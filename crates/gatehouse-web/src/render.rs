// ── Page rendering ──
//
// Templates are compiled into the binary and registered once at startup.
// Handlebars escapes every `{{value}}` for HTML.

use axum::response::Html;
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::WebError;

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/partials/header.hbs")),
    ("footer", include_str!("../templates/partials/footer.hbs")),
    ("messages", include_str!("../templates/partials/messages.hbs")),
];

const PAGES: &[(&str, &str)] = &[
    ("users", include_str!("../templates/users.hbs")),
    ("user_edit", include_str!("../templates/user_edit.hbs")),
    ("zones", include_str!("../templates/zones.hbs")),
    ("hostnames", include_str!("../templates/hostnames.hbs")),
    ("hostname_edit", include_str!("../templates/hostname_edit.hbs")),
];

/// Compiled page templates.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, WebError> {
        let mut registry = Handlebars::new();
        for (name, source) in PARTIALS {
            registry.register_partial(name, *source)?;
        }
        for (name, source) in PAGES {
            registry.register_template_string(name, *source)?;
        }
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, WebError> {
        Ok(Html(self.registry.render(name, data)?))
    }
}

/// One `<option>` of a select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

/// Options whose label is the value itself.
pub fn choices<I, S>(values: I, selected: &[String]) -> Vec<Choice>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(|v| {
            let value: String = v.into();
            let is_selected = selected.contains(&value);
            Choice::new(value.clone(), value, is_selected)
        })
        .collect()
}
