use handlebars::Handlebars;
use serde::Serialize;

use crate::errors::BackendError;

const PARTIALS: &[(&str, &str)] = &[
    ("header", include_str!("../templates/partials/header.hbs")),
    ("footer", include_str!("../templates/partials/footer.hbs")),
];

const PAGES: &[(&str, &str)] = &[
    ("index", include_str!("../templates/index.hbs")),
    ("thanks", include_str!("../templates/thanks.hbs")),
    ("testing", include_str!("../templates/testing.hbs")),
    ("error", include_str!("../templates/error.hbs")),
];

/// The pages this service renders, compiled once at startup.
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, BackendError> {
        let mut registry = Handlebars::new();

        for &(name, source) in PARTIALS {
            registry
                .register_partial(name, source)
                .map_err(|source| BackendError::InvalidTemplate { name, source })?;
        }

        for &(name, source) in PAGES {
            registry
                .register_template_string(name, source)
                .map_err(|source| BackendError::InvalidTemplate { name, source })?;
        }

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, BackendError> {
        self.registry
            .render(name, data)
            .map_err(|source| BackendError::Render {
                name: name.to_owned(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Templates;

    #[test]
    fn all_templates_compile() {
        Templates::new().expect("compile templates");
    }

    #[test]
    fn values_are_escaped() {
        let templates = Templates::new().expect("compile templates");
        let html = templates
            .render("thanks", &json!({ "title": "Thanks", "name": "<b>Ada</b>" }))
            .expect("render thanks");

        assert!(html.contains("&lt;b&gt;Ada&lt;/b&gt;"));
        assert!(!html.contains("<b>Ada</b>"));
    }

    #[test]
    fn unknown_template_fails() {
        let templates = Templates::new().expect("compile templates");

        assert!(templates.render("missing", &json!({})).is_err());
    }
}
