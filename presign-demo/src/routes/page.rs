use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{response::Html, Extension};
use object_transfer::ObjectStore;
use tracing::instrument;

use crate::types::{Environment, PageError};

/// Placeholders the template may use for the presigned URL
const URL_PLACEHOLDERS: [&str; 2] = ["{{.url}}", "{{ .url }}"];

/// Settings for the demo page, fixed at startup
#[derive(Debug, Clone)]
pub struct DemoPage {
    /// HTML template, read again on every request
    pub template_path: PathBuf,
    /// Object the page links to
    pub object_key: String,
    /// Validity of each generated link
    pub ttl: Duration,
}

impl DemoPage {
    /// Builds the page settings from the environment
    #[must_use]
    pub fn from_environment(environment: &Environment) -> Self {
        Self {
            template_path: environment.template_path(),
            object_key: environment.demo_object_key(),
            ttl: environment.presigned_url_expiry(),
        }
    }
}

/// Renders the demo page with a freshly presigned download link
///
/// Nothing is cached: the template is loaded and the URL is signed again for
/// every request.
///
/// # Errors
///
/// Returns `PageError::Template` if the template cannot be read and
/// `PageError::Presign` if signing fails; both become a 500 response
#[instrument(skip_all)]
pub async fn handler(
    Extension(store): Extension<Arc<ObjectStore>>,
    Extension(page): Extension<Arc<DemoPage>>,
) -> Result<Html<String>, PageError> {
    let template = tokio::fs::read_to_string(&page.template_path)
        .await
        .map_err(|source| PageError::Template {
            path: page.template_path.clone(),
            source,
        })?;

    let presigned = store.presign_get(&page.object_key, page.ttl).await?;

    Ok(Html(render(&template, &presigned.url)))
}

/// Substitutes the escaped URL into every placeholder of `template`
#[must_use]
pub fn render(template: &str, url: &str) -> String {
    let escaped = escape_html(url);

    URL_PLACEHOLDERS
        .iter()
        .fold(template.to_string(), |html, placeholder| {
            html.replace(placeholder, &escaped)
        })
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
