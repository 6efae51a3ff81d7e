//! Document rendering
//!
//! [`DocumentRenderer`] is the seam; [`TextPdfRenderer`] is the bundled
//! implementation: a `tera` text template laid out by the built-in PDF
//! writer.

use crate::core::error::{EstateError, EstateResult, RenderError};
use crate::core::filter::FilterParseMode;
use crate::core::pdf::{PageLayout, write_text_pdf};
use async_trait::async_trait;
use serde_json::Value;
use std::error::Error as _;
use std::sync::Arc;
use tera::{Context, Tera};

/// Renders structured data into document bytes (PDF).
///
/// Every failure is reported as a `RenderError`.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, template_id: &str, data: &Value) -> EstateResult<Vec<u8>>;
}

/// A named template and the fields it reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTemplate {
    pub id: &'static str,
    pub fields: &'static [&'static str],
    /// File store directory for generated files
    pub output_dir: &'static str,
    pub file_prefix: &'static str,
}

pub const ANNEXURE_TEMPLATE: DocumentTemplate = DocumentTemplate {
    id: "annexure",
    fields: &[
        "investorName",
        "investorId",
        "panAadhaar",
        "propertyId",
        "propertyName",
        "propertyType",
        "propertyAddress",
        "cityState",
        "llpName",
        "llpin",
        "totalValuation",
        "totalTokens",
        "investorTokens",
        "investAmount",
        "date",
    ],
    output_dir: "documents",
    file_prefix: "annexure",
};

const ANNEXURE_SOURCE: &str = r#"# Property-Specific Investment Annexure

Date: {{ date }}

This annexure forms part of the investment agreement between the investor
named below and {{ llpName }} (LLPIN {{ llpin }}), and records the investment
made in the property described herein.

# Investor Details
Investor Name: {{ investorName }}
Investor ID: {{ investorId }}
PAN / Aadhaar: {{ panAadhaar }}

# Property Details
Property ID: {{ propertyId }}
Property Name: {{ propertyName }}
Property Type: {{ propertyType }}
Address: {{ propertyAddress }}
City / State: {{ cityState }}

# Investment Summary
Total Valuation: {{ totalValuation }}
Total Tokens Issued: {{ totalTokens }}
Tokens Allotted to Investor: {{ investorTokens }}
Investment Amount: {{ investAmount }}

# Declaration
The investor acknowledges that the tokens allotted above represent a
proportionate interest in the property held by the LLP, subject to the terms
of the investment agreement.


Investor Signature: ____________________

Authorised Signatory ({{ llpName }}): ____________________
"#;

/// Text templates rendered with `tera`, laid out as PDF
#[derive(Clone)]
pub struct TextPdfRenderer {
    templates: Arc<Tera>,
    layout: PageLayout,
    mode: FilterParseMode,
}

impl TextPdfRenderer {
    /// Renderer with the bundled templates (`annexure`)
    pub fn new() -> EstateResult<Self> {
        Self::with_templates(&[(ANNEXURE_TEMPLATE.id, ANNEXURE_SOURCE)])
    }

    /// Renderer with the given `(id, source)` templates
    pub fn with_templates(sources: &[(&str, &str)]) -> EstateResult<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        for (id, source) in sources {
            tera.add_raw_template(id, source)
                .map_err(|e| template_error(id, &e))?;
        }
        Ok(Self {
            templates: Arc::new(tera),
            layout: PageLayout::a4(),
            mode: FilterParseMode::default(),
        })
    }

    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Strict mode fails renders whose text the built-in fonts cannot show
    pub fn with_mode(mut self, mode: FilterParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Merge `data` into the template, returning the text before layout
    pub fn render_text(&self, template_id: &str, data: &Value) -> Result<String, RenderError> {
        render_text(&self.templates, template_id, data)
    }
}

fn template_error(template: &str, err: &tera::Error) -> RenderError {
    // tera keeps the useful part (missing variable, bad syntax) in the source chain
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message = format!("{}: {}", message, cause);
        source = cause.source();
    }
    RenderError::Template {
        template: template.to_string(),
        message,
    }
}

fn render_text(tera: &Tera, template_id: &str, data: &Value) -> Result<String, RenderError> {
    if !tera.get_template_names().any(|name| name == template_id) {
        return Err(RenderError::UnknownTemplate(template_id.to_string()));
    }
    let context = Context::from_value(data.clone()).map_err(|e| template_error(template_id, &e))?;
    tera.render(template_id, &context)
        .map_err(|e| template_error(template_id, &e))
}

#[async_trait]
impl DocumentRenderer for TextPdfRenderer {
    async fn render(&self, template_id: &str, data: &Value) -> EstateResult<Vec<u8>> {
        let tera = self.templates.clone();
        let layout = self.layout;
        let mode = self.mode;
        let template_id = template_id.to_string();
        let data = data.clone();

        let bytes = tokio::task::spawn_blocking(move || {
            let text = render_text(&tera, &template_id, &data)?;
            write_text_pdf(&text, &layout, mode)
        })
        .await
        .map_err(|e| EstateError::from(RenderError::Pdf(e.to_string())))??;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_data() -> Value {
        let mut data = serde_json::Map::new();
        for field in ANNEXURE_TEMPLATE.fields {
            data.insert(field.to_string(), json!(""));
        }
        data.insert("investorName".into(), json!("Asha Rao"));
        data.insert("llpName".into(), json!("Skyline Estates LLP"));
        Value::Object(data)
    }

    #[test]
    fn test_bundled_template_renders_every_field() {
        let renderer = TextPdfRenderer::new().unwrap();
        let text = renderer.render_text("annexure", &full_data()).unwrap();
        assert!(text.starts_with("# Property-Specific Investment Annexure"));
        assert!(text.contains("Investor Name: Asha Rao"));
        assert!(text.contains("Authorised Signatory (Skyline Estates LLP)"));
    }

    #[test]
    fn test_missing_variable_is_template_error() {
        let renderer = TextPdfRenderer::new().unwrap();
        let err = renderer.render_text("annexure", &json!({"investorName": "A"})).unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
        assert!(err.to_string().starts_with("PDF generation failed"));
    }

    #[test]
    fn test_unknown_template() {
        let renderer = TextPdfRenderer::new().unwrap();
        let err = renderer.render_text("invoice", &json!({})).unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(_)));
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let renderer = TextPdfRenderer::with_templates(&[("note", "{{ body }}")]).unwrap();
        let text = renderer.render_text("note", &json!({"body": "A & B <c>"})).unwrap();
        assert_eq!(text, "A & B <c>");
    }

    #[tokio::test]
    async fn test_render_produces_pdf() {
        let renderer = TextPdfRenderer::new().unwrap();
        let bytes = renderer.render("annexure", &full_data()).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));

        let err = renderer.render("annexure", &json!([])).await.unwrap_err();
        assert!(matches!(err, EstateError::Render(_)));
    }

    #[tokio::test]
    async fn test_strict_renderer_rejects_devanagari_names() {
        let mut data = full_data();
        data["investorName"] = json!("\u{0906}\u{0936}\u{093e} \u{0930}\u{093e}\u{0935}");

        let lenient = TextPdfRenderer::new().unwrap();
        assert!(lenient.render("annexure", &data).await.unwrap().starts_with(b"%PDF-"));

        let strict = TextPdfRenderer::new().unwrap().with_mode(FilterParseMode::Strict);
        let err = strict.render("annexure", &data).await.unwrap_err();
        assert!(matches!(err, EstateError::Render(RenderError::Pdf(_))));
    }
}
