//! Questions page rendering

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;

const QUESTIONS_TEMPLATE: &str = include_str!("../../templates/questions.hbs");

/// Values the questions page script needs
#[derive(Debug, Clone, Serialize)]
pub struct PageSettings {
    pub generate_url: String,
    pub status_url: String,
    pub results_url: String,
    pub redirect_delay_ms: u64,
}

pub struct PageRenderer {
    handlebars: Handlebars<'static>,
    settings: PageSettings,
}

impl PageRenderer {
    pub fn new(settings: PageSettings) -> Result<Self, TemplateError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string("questions", QUESTIONS_TEMPLATE)?;
        Ok(Self {
            handlebars,
            settings,
        })
    }

    pub fn questions(&self) -> Result<String, RenderError> {
        self.handlebars.render("questions", &self.settings)
    }
}
