//! @acp:module "Command Templates"
//! @acp:summary "Placeholder substitution for command strings"
//! @acp:domain execution
//! @acp:layer logic
//!
//! Substitutes `{{ $name }}` placeholders into a command string. This is
//! plain textual substitution: values are inserted verbatim and never
//! re-scanned, quoted or evaluated. Callers that need shell-safe values
//! pre-escape them with [`shell_escape`].
//!
//! Anything without the `$` sigil (for example the Go templates accepted
//! by `docker inspect --format '{{ .Name }}'`) is left untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Placeholder name to rendered value
pub type Variables = BTreeMap<String, String>;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\$([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Template rendering failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unresolved placeholder `{{{{ ${0} }}}}`")]
    UnresolvedPlaceholder(String),
}

/// Render `template` against `variables`.
///
/// Every placeholder is checked before anything is substituted, so a
/// missing variable never yields a half-rendered command.
pub fn render(template: &str, variables: &Variables) -> Result<String, RenderError> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .find(|name| !variables.contains_key(name))
    {
        return Err(RenderError::UnresolvedPlaceholder(missing));
    }

    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        variables
            .get(&caps[1])
            .cloned()
            .unwrap_or_default()
    });

    Ok(rendered.into_owned())
}

/// Placeholder names referenced by `template`, in order of first use
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Quote a value for POSIX `sh` if it contains anything outside a safe set
pub fn shell_escape(value: &str) -> Cow<'_, str> {
    let safe = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '=' | ':' | ',' | '@' | '%' | '+')
        });

    if safe {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("'{}'", value.replace('\'', r"'\''")))
    }
}
