//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    for (field, url) in [
        ("api.base_url", &config.api.base_url),
        ("api.app_url", &config.api.app_url),
    ] {
        if url.trim().is_empty() {
            errors.push(format!("{} must not be empty", field));
        } else if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(format!("{} must be an http(s) URL", field));
        } else if url.ends_with('/') {
            // Paths are appended with a leading slash
            errors.push(format!("{} must not end with a slash", field));
        }
    }

    if config.api.timeout_seconds == 0 {
        errors.push("api.timeout_seconds must be > 0".to_string());
    }
    if config.chat.title_max_chars == 0 {
        errors.push("chat.title_max_chars must be > 0".to_string());
    }
    if config.chat.faq_limit == 0 {
        errors.push("chat.faq_limit must be > 0".to_string());
    }
    if config.chat.notice_ttl_seconds == 0 {
        errors.push("chat.notice_ttl_seconds must be > 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
