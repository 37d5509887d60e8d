//! Prose normalization: wiki directive soup → plain inline markdown.
//!
//! A fixed, ordered substitution chain. Later passes only ever see the
//! output of earlier ones, so the order is load-bearing: admonitions first
//! (their bodies may contain code/link directives), leftover-brace stripping
//! last.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHOLE_ADMONITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{(?:info|note|warning|caution)\|([^{}]*)\}\}$").unwrap());
static ADMONITION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:info|note|warning|caution)\|([^{}|]*)\}\}").unwrap());
static CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:code|cd)\|([^{}|]*)(?:\|([^{}|]*))?\}\}").unwrap());
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:el|link)\|([^{}|]+)(?:\|([^{}|]+))?\}\}").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"'''([^']+?)'''").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"''([^']+?)''").unwrap());
static LEFTOVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());

pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();

    // an admonition that is the entire text becomes the whole result
    let mut out = if let Some(caps) = WHOLE_ADMONITION.captures(trimmed) {
        format!("*{}*", caps[1].trim())
    } else {
        ADMONITION
            .replace_all(trimmed, |caps: &Captures| format!("*{}*", caps[1].trim()))
            .into_owned()
    };

    out = CODE
        .replace_all(&out, |caps: &Captures| {
            // two-argument form carries the display text second
            let code = caps.get(2).map_or(&caps[1], |m| m.as_str());
            format!("`{code}`")
        })
        .into_owned();

    out = LINK
        .replace_all(&out, |caps: &Captures| {
            let target = caps[1].trim().to_string();
            let text = caps
                .get(2)
                .map_or(target.clone(), |m| m.as_str().trim().to_string());
            format!("[{text}]({target})")
        })
        .into_owned();

    out = BOLD.replace_all(&out, "**$1**").into_owned();
    out = ITALIC.replace_all(&out, "*$1*").into_owned();

    // anything still in braces: strip the directive, keep its last argument
    out = LEFTOVER
        .replace_all(&out, |caps: &Captures| {
            caps[1].rsplit('|').next().unwrap_or("").trim().to_string()
        })
        .into_owned();

    out
}
