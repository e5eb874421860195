//! Embeddable widget resource
//!
//! The bundled widget (JS + optional CSS) is read once at startup and
//! served as a single HTML fragment.

use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

pub const WIDGET_URI: &str = "ui://widget/mortgagebroker-prequal.html";
pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";
pub const WIDGET_DOMAIN: &str = "https://mortgagebroker.app";

const WIDGET_JS: &str = "mortgagebroker-widget.js";
const WIDGET_CSS: &str = "mortgagebroker-widget.css";
const ROOT_DIV: &str = r#"<div id="mortgagebroker-root"></div>"#;

const CONNECT_DOMAINS: &[&str] = &["https://apply.newamericanfunding.com"];
const RESOURCE_DOMAINS: &[&str] = &[
    "https://apply.newamericanfunding.com",
    "https://fonts.googleapis.com",
    "https://fonts.gstatic.com",
];

#[derive(Debug, Clone)]
pub struct WidgetResource {
    html: String,
    bundled: bool,
}

impl WidgetResource {
    /// Load the bundle from `dir`, or fall back to a placeholder document
    pub fn load(dir: &Path) -> Self {
        let js_path = dir.join(WIDGET_JS);

        let js = match std::fs::read_to_string(&js_path) {
            Ok(js) => js,
            Err(e) => {
                warn!(path = %js_path.display(), "Widget bundle not found, serving placeholder: {}", e);
                return Self::placeholder();
            }
        };

        let css = std::fs::read_to_string(dir.join(WIDGET_CSS)).unwrap_or_default();
        info!(path = %dir.display(), js_bytes = js.len(), css_bytes = css.len(), "Widget bundle loaded");

        Self {
            html: render(&js, &css),
            bundled: true,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            html: format!(
                "{}\n<p>The MortgageBroker widget has not been built yet.</p>",
                ROOT_DIV
            ),
            bundled: false,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_bundled(&self) -> bool {
        self.bundled
    }

    pub fn metadata(&self) -> Value {
        json!({
            "uri": WIDGET_URI,
            "mimeType": WIDGET_MIME_TYPE,
            "bundled": self.bundled,
            "_meta": {
                "openai/widgetPrefersBorder": true,
                "openai/widgetDomain": WIDGET_DOMAIN,
                "openai/widgetCSP": {
                    "connect_domains": CONNECT_DOMAINS,
                    "resource_domains": RESOURCE_DOMAINS,
                }
            }
        })
    }
}

fn render(js: &str, css: &str) -> String {
    let mut html = String::with_capacity(js.len() + css.len() + 96);
    html.push_str(ROOT_DIV);
    html.push('\n');
    if !css.is_empty() {
        html.push_str("<style>");
        html.push_str(css);
        html.push_str("</style>\n");
    }
    html.push_str("<script type=\"module\">\n");
    html.push_str(js);
    html.push_str("\n</script>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("{}-{}", name, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_bundle_serves_placeholder() {
        let widget = WidgetResource::load(Path::new("/nonexistent/widget/dir"));
        assert!(!widget.is_bundled());
        assert!(widget.html().starts_with(ROOT_DIV));
    }

    #[test]
    fn test_bundle_with_css() {
        let dir = scratch_dir("widget-css");
        std::fs::write(dir.join(WIDGET_JS), "console.log('hi');").unwrap();
        std::fs::write(dir.join(WIDGET_CSS), "body{margin:0}").unwrap();

        let widget = WidgetResource::load(&dir);
        assert!(widget.is_bundled());
        assert!(widget.html().contains("<style>body{margin:0}</style>"));
        assert!(widget.html().ends_with("console.log('hi');\n</script>"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_bundle_without_css() {
        let dir = scratch_dir("widget-js");
        std::fs::write(dir.join(WIDGET_JS), "export {};").unwrap();

        let widget = WidgetResource::load(&dir);
        assert!(!widget.html().contains("<style>"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_metadata() {
        let meta = WidgetResource::placeholder().metadata();
        assert_eq!(meta["uri"], WIDGET_URI);
        assert_eq!(meta["_meta"]["openai/widgetDomain"], "https://mortgagebroker.app");
        assert_eq!(
            meta["_meta"]["openai/widgetCSP"]["resource_domains"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
    }
}
