use anyhow::{Context as _, Result};
use modelgen_templates::Templates;
use tera::{Context, Tera};

pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        for file in Templates::iter() {
            let path = file.as_ref();
            if !path.ends_with(".tera") {
                continue;
            }
            if let Some(content) = Templates::get(path) {
                let content_str = std::str::from_utf8(content.data.as_ref())
                    .with_context(|| format!("Invalid UTF-8 in '{}'", path))?;
                tera.add_raw_template(path, content_str)
                    .with_context(|| format!("Failed to parse template '{}'", path))?;
            }
        }

        Ok(TemplateEngine { tera })
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        let result = self
            .tera
            .render(template_name, context)
            .with_context(|| format!("Failed to render template '{}'", template_name))?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_engine_creates_successfully() {
        let _engine = TemplateEngine::new().unwrap();
    }

    #[test]
    fn versions_template_is_embedded() {
        assert!(Templates::get("versions.ts.tera").is_some());
    }

    #[test]
    fn unknown_template_errors() {
        let engine = TemplateEngine::new().unwrap();
        let err = engine.render("missing.tera", &Context::new()).unwrap_err();
        assert!(err.to_string().contains("missing.tera"));
    }
}
