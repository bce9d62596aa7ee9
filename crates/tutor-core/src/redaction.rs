use once_cell::sync::Lazy;
use regex::Regex;

static RE_KEY_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(api[_-]?key|access[_-]?token|authorization)\s*[:=]\s*(["']?)([^\s"']+)(["']?)"#)
        .expect("valid regex")
});

static RE_BEARER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(Bearer)\s+([A-Za-z0-9._\-]+)").expect("valid regex"));

static RE_OPENAI_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bsk-[A-Za-z0-9_\-]{8,}").expect("valid regex"));

static RE_URL_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([?&](?:api_key|key|token)=)[^&\s]+").expect("valid regex"));

/// Masks credentials in provider error bodies and URLs before they are logged.
pub fn redact_secrets_in_text(input: &str) -> String {
    let text = RE_BEARER.replace_all(input, |caps: &regex::Captures| {
        format!("{} ***REDACTED***", &caps[1])
    });
    let text = RE_KEY_VALUE.replace_all(&text, |caps: &regex::Captures| {
        format!("{}: ***REDACTED***", &caps[1])
    });
    let text = RE_OPENAI_KEY.replace_all(&text, "sk-***REDACTED***");
    RE_URL_QUERY
        .replace_all(&text, |caps: &regex::Captures| format!("{}REDACTED", &caps[1]))
        .into_owned()
}
