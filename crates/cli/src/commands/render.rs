//! Preview an email template.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use binder_core::TemplateId;

use super::open_shop;

/// Parse a `name=value` pair.
///
/// # Errors
///
/// Returns a message if there is no `=` or the name is empty.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got `{raw}`")),
    }
}

/// Render `template_id` with `vars` and log the result.
///
/// Placeholders without a value are left in place so gaps are visible.
///
/// # Errors
///
/// Returns an error if the template does not exist.
pub fn template(
    data_dir: Option<PathBuf>,
    template_id: &str,
    vars: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shop = open_shop(data_dir)?;
    let id = TemplateId::new(template_id);
    let template = shop
        .email
        .template(&id)
        .ok_or_else(|| format!("Template not found: {template_id}"))?;

    let vars: HashMap<String, String> = vars.into_iter().collect();
    let missing: Vec<&str> = template
        .variables
        .iter()
        .filter(|name| !vars.contains_key(*name))
        .map(String::as_str)
        .collect();
    let rendered = template.render(&vars);

    info!("Template: {} ({})", template.name, template.id);
    info!("Subject: {}", rendered.subject);
    info!("Body:\n{}", rendered.html);
    if !missing.is_empty() {
        info!("Unfilled variables: {}", missing.join(", "));
    }
    Ok(())
}
