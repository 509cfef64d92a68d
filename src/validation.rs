//! Form input for memes and the rules it must satisfy before anything is written.

use std::collections::BTreeMap;

use serde::Deserialize;
use url::Url;
use validator::{Validate, ValidationError};

pub const MEME_URL_REQUIRED: &str = "¡Por favor, proporciona la URL del meme!";
pub const MEME_URL_INVALID: &str = "La URL del meme no es válida.";
pub const MEME_URL_TOO_LONG: &str = "La URL del meme debe tener máximo 500 caracteres.";
pub const EXPLICACION_REQUIRED: &str = "¡Por favor, escribe una explicación para el meme!";
pub const EXPLICACION_TOO_LONG: &str = "La explicación debe tener máximo 1000 caracteres.";

/// Raw `application/x-www-form-urlencoded` body of the create/edit forms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemeForm {
    #[serde(default)]
    pub meme_url: Option<String>,
    #[serde(default)]
    pub explicacion: Option<String>,
}

/// Body of `POST /memes/{id}`: browsers can't send PUT or DELETE, so the
/// intended verb travels in a hidden `_method` field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MethodOverrideForm {
    #[serde(rename = "_method", default)]
    pub method: Option<String>,
    #[serde(default)]
    pub meme_url: Option<String>,
    #[serde(default)]
    pub explicacion: Option<String>,
}

impl MethodOverrideForm {
    pub fn into_parts(self) -> (Option<String>, MemeForm) {
        let form = MemeForm {
            meme_url: self.meme_url,
            explicacion: self.explicacion,
        };
        (self.method, form)
    }
}

/// Input that passed every rule, trimmed and ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMeme {
    pub meme_url: String,
    pub explicacion: String,
}

/// One user-facing message per rejected field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, &'static str>,
}

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.fields.get(field).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.fields.len()
    }
}

#[derive(Debug, Validate)]
struct MemeRules {
    #[validate(required, url, custom(function = "web_url"), length(max = 500))]
    meme_url: Option<String>,
    #[validate(required, length(max = 1000))]
    explicacion: Option<String>,
}

/// Only `http(s)://host/...` can be shown as an image; `javascript:` or `host:port` parse but can't.
fn web_url(value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ValidationError::new("web_url")),
    }
}

// Checked in this order; the first failing rule names the field's message.
const MEME_URL_RULES: &[(&str, &str)] = &[
    ("required", MEME_URL_REQUIRED),
    ("url", MEME_URL_INVALID),
    ("web_url", MEME_URL_INVALID),
    ("length", MEME_URL_TOO_LONG),
];
const EXPLICACION_RULES: &[(&str, &str)] = &[
    ("required", EXPLICACION_REQUIRED),
    ("length", EXPLICACION_TOO_LONG),
];

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl MemeForm {
    /// Trimmed copy with blank fields turned into `None`, as redisplayed after a rejection.
    pub fn normalized(&self) -> MemeForm {
        MemeForm {
            meme_url: normalize(self.meme_url.as_deref()).map(str::to_owned),
            explicacion: normalize(self.explicacion.as_deref()).map(str::to_owned),
        }
    }

    pub fn validate(&self) -> Result<ValidMeme, ValidationErrors> {
        let normalized = self.normalized();
        let rules = MemeRules {
            meme_url: normalized.meme_url,
            explicacion: normalized.explicacion,
        };

        if let Err(report) = rules.validate() {
            let by_field = report.field_errors();
            let mut errors = ValidationErrors::default();
            for (field, table) in [("meme_url", MEME_URL_RULES), ("explicacion", EXPLICACION_RULES)] {
                let Some(failed) = by_field.get(field) else {
                    continue;
                };
                let message = table
                    .iter()
                    .find(|(code, _)| failed.iter().any(|e| e.code == *code))
                    .map(|(_, message)| *message);
                if let Some(message) = message {
                    errors.fields.insert(field, message);
                }
            }
            tracing::debug!(rejected = errors.len(), "Meme form failed validation");
            return Err(errors);
        }

        match (rules.meme_url, rules.explicacion) {
            (Some(meme_url), Some(explicacion)) => Ok(ValidMeme {
                meme_url,
                explicacion,
            }),
            // `required` already rejected a missing field above.
            _ => Err(ValidationErrors::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(url: &str, text: &str) -> MemeForm {
        MemeForm {
            meme_url: Some(url.to_string()),
            explicacion: Some(text.to_string()),
        }
    }

    #[test]
    fn accepts_valid_input_and_trims() {
        let valid = form("  https://example.com/a.jpg ", " test ").validate().unwrap();
        assert_eq!(valid.meme_url, "https://example.com/a.jpg");
        assert_eq!(valid.explicacion, "test");
    }

    #[test]
    fn missing_fields_use_required_messages() {
        let errors = MemeForm::default().validate().unwrap_err();
        assert_eq!(errors.get("meme_url"), Some(MEME_URL_REQUIRED));
        assert_eq!(errors.get("explicacion"), Some(EXPLICACION_REQUIRED));
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let errors = form("   ", "").validate().unwrap_err();
        assert_eq!(errors.get("meme_url"), Some(MEME_URL_REQUIRED));
        assert_eq!(errors.get("explicacion"), Some(EXPLICACION_REQUIRED));
    }

    #[test]
    fn rejects_relative_url() {
        let errors = form("not-a-url", "test").validate().unwrap_err();
        assert_eq!(errors.get("meme_url"), Some(MEME_URL_INVALID));
        assert_eq!(errors.get("explicacion"), None);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn rejects_urls_that_are_not_web_addresses() {
        for url in [
            "javascript:alert(1)",
            "foo:bar",
            "localhost:8080",
            "mailto:a@b.c",
            "data:text/html,<b>x</b>",
            "ftp://example.com/a.jpg",
            "http://",
        ] {
            let errors = form(url, "test").validate().unwrap_err();
            assert_eq!(errors.get("meme_url"), Some(MEME_URL_INVALID), "{url}");
            assert_eq!(errors.len(), 1, "{url}");
        }
        assert!(form("HTTP://Example.com/a.jpg", "test").validate().is_ok());
    }

    #[test]
    fn rejects_overlong_url() {
        let url = format!("https://example.com/{}", "a".repeat(500));
        let errors = form(&url, "test").validate().unwrap_err();
        assert_eq!(errors.get("meme_url"), Some(MEME_URL_TOO_LONG));
    }

    #[test]
    fn explanation_limit_counts_characters() {
        let at_limit = "ñ".repeat(1000);
        assert!(form("https://example.com/a.jpg", &at_limit).validate().is_ok());

        let over = "ñ".repeat(1001);
        let errors = form("https://example.com/a.jpg", &over).validate().unwrap_err();
        assert_eq!(errors.get("explicacion"), Some(EXPLICACION_TOO_LONG));
    }

    #[test]
    fn method_override_splits_verb_from_fields() {
        let body = MethodOverrideForm {
            method: Some("PUT".into()),
            meme_url: Some("https://example.com/a.jpg".into()),
            explicacion: None,
        };
        let (method, form) = body.into_parts();
        assert_eq!(method.as_deref(), Some("PUT"));
        assert_eq!(form.meme_url.as_deref(), Some("https://example.com/a.jpg"));
        assert!(form.explicacion.is_none());
    }
}
