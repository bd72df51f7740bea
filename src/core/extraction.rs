//! Pulls contact fields out of free-form service answers.
//!
//! Three shapes are understood, tried in order:
//!
//! 1. a JSON array (or object) of contacts, as the default prompt asks for;
//! 2. labelled lines such as `Title: Director of Operations`;
//! 3. a comma-separated line carrying an email, like
//!    `Jane Doe, Owner, jane@acme.example, manages over 50 properties`.
//!
//! A field that cannot be read with confidence stays `None`. Extraction never
//! fails: an answer with nothing usable yields an empty [`EnrichmentResult`].
//! A JSON answer is taken as-is; its fields are never filled from other text.

use crate::domain::model::EnrichmentResult;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}")
        .expect("email pattern")
});

static PROPERTIES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(over|more than|around|about|approximately|at least|nearly|roughly|under|up to)\s+)?(\d[\d,]*\+?)\s+(?:vacation\s+)?(?:rental\s+)?(?:properties|property|units|homes|rentals|listings|doors)\b",
    )
    .expect("properties pattern")
});

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:[-*•][ \t]*)?(?:\d+\.[ \t]*)?\**(first[ _]name|last[ _]name|full[ _]name|name|job[ _]title|title|role|position|e-?mail(?:[ _]address)?|num[ _]properties|number[ _]of[ _]properties|properties)\**[ \t]*[:=][ \t]*(.+?)[ \t]*$",
    )
    .expect("label pattern")
});

const PLACEHOLDERS: [&str; 11] = [
    "",
    "null",
    "none",
    "n/a",
    "na",
    "unknown",
    "not found",
    "not available",
    "not public",
    "tbd",
    "-",
];

/// Extracts the best contact from a service answer.
pub fn extract_contact(text: &str) -> EnrichmentResult {
    if let Some(result) = from_json(text) {
        return result;
    }

    let mut result = from_labelled_lines(text)
        .or_else(|| from_comma_line(text))
        .unwrap_or_default();

    // Emails and property counts are unambiguous enough to pick up anywhere.
    if result.contact_email.is_none() {
        result.contact_email = find_email(text);
    }
    if result.num_properties.is_none() {
        result.num_properties = find_properties(text);
    }

    result
}

fn clean(value: &str) -> Option<String> {
    let trimmed = value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '*' || c == '`')
        .trim();

    let lowered = trimmed.to_lowercase();
    if PLACEHOLDERS.contains(&lowered.as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

fn find_properties(text: &str) -> Option<String> {
    let caps = PROPERTIES_RE.captures(text)?;
    let count = caps.get(2)?.as_str();
    Some(match caps.get(1) {
        Some(qualifier) => format!("{} {}", qualifier.as_str().to_lowercase(), count),
        None => count.to_string(),
    })
}

fn split_name(full: &str) -> (Option<String>, Option<String>) {
    let Some(full) = clean(full) else {
        return (None, None);
    };
    let mut parts = full.split_whitespace();
    let first = parts.next().map(str::to_string);
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, clean(&rest))
}

// ---------------------------------------------------------------------------
// JSON answers
// ---------------------------------------------------------------------------

fn from_json(text: &str) -> Option<EnrichmentResult> {
    let value = find_json(text)?;

    let contacts: Vec<&Map<String, Value>> = match &value {
        Value::Array(items) => {
            if items.is_empty() {
                return Some(EnrichmentResult::default());
            }
            items.iter().filter_map(Value::as_object).collect()
        }
        Value::Object(map) => match map.get("contacts").and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(Value::as_object).collect(),
            None => vec![map],
        },
        _ => return None,
    };

    let best = contacts
        .iter()
        .enumerate()
        .min_by_key(|(index, contact)| (priority(contact).unwrap_or(u64::MAX), *index))
        .map(|(_, contact)| *contact);

    match best {
        Some(contact) => Some(from_contact(contact)),
        None if contacts.is_empty() && matches!(value, Value::Object(_)) => {
            Some(EnrichmentResult::default())
        }
        None => None,
    }
}

fn find_json(text: &str) -> Option<Value> {
    let candidates = [('[', ']'), ('{', '}')];
    for (open, close) in candidates {
        let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) else {
            continue;
        };
        if end <= start {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
            return Some(value);
        }
    }
    None
}

fn priority(contact: &Map<String, Value>) -> Option<u64> {
    match contact.get("contact_priority").or_else(|| contact.get("priority"))? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_field(contact: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match contact.get(*key)? {
        Value::String(s) => clean(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn from_contact(contact: &Map<String, Value>) -> EnrichmentResult {
    let mut first = string_field(contact, &["first_name", "firstName"]);
    let mut last = string_field(contact, &["last_name", "lastName"]);
    if first.is_none() && last.is_none() {
        if let Some(full) = string_field(contact, &["name", "full_name"]) {
            (first, last) = split_name(&full);
        }
    }

    EnrichmentResult {
        contact_email: string_field(contact, &["email", "contact_email"])
            .and_then(|e| find_email(&e)),
        contact_first_name: first,
        contact_last_name: last,
        contact_title: string_field(contact, &["title", "job_title", "role"]),
        num_properties: string_field(contact, &["num_properties", "properties"]),
    }
}

// ---------------------------------------------------------------------------
// Labelled lines
// ---------------------------------------------------------------------------

fn from_labelled_lines(text: &str) -> Option<EnrichmentResult> {
    let mut result = EnrichmentResult::default();
    let mut matched = false;

    for caps in LABEL_RE.captures_iter(text) {
        let (Some(label), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let label = label.as_str().to_lowercase().replace(['_', ' ', '-'], "");
        let value = value.as_str();
        matched = true;

        match label.as_str() {
            "firstname" => set_once(&mut result.contact_first_name, clean(value)),
            "lastname" => set_once(&mut result.contact_last_name, clean(value)),
            "name" | "fullname" => {
                if result.contact_first_name.is_none() && result.contact_last_name.is_none() {
                    let (first, last) = split_name(value);
                    result.contact_first_name = first;
                    result.contact_last_name = last;
                }
            }
            "title" | "jobtitle" | "role" | "position" => {
                set_once(&mut result.contact_title, clean(value))
            }
            "email" | "emailaddress" => set_once(&mut result.contact_email, find_email(value)),
            _ => set_once(
                &mut result.num_properties,
                find_properties(value).or_else(|| clean(value)),
            ),
        }
    }

    matched.then_some(result)
}

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

// ---------------------------------------------------------------------------
// Comma-separated lines
// ---------------------------------------------------------------------------

// Only a line that carries an email is read as a contact; company and
// location names look just like person names otherwise.
fn from_comma_line(text: &str) -> Option<EnrichmentResult> {
    text.lines()
        .map(strip_bullet)
        .filter(|line| line.contains(',') && EMAIL_RE.is_match(line))
        .map(classify_segments)
        .next()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
    match line.split_once(". ") {
        Some((number, rest)) if number.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => line,
    }
}

fn classify_segments(line: &str) -> EnrichmentResult {
    let mut result = EnrichmentResult::default();

    for segment in line.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some(email) = find_email(segment) {
            set_once(&mut result.contact_email, Some(email));
        } else if let Some(count) = find_properties(segment) {
            set_once(&mut result.num_properties, Some(count));
        } else if result.contact_first_name.is_none()
            && result.contact_title.is_none()
            && looks_like_name(segment)
        {
            let (first, last) = split_name(segment);
            result.contact_first_name = first;
            result.contact_last_name = last;
        } else if result.contact_first_name.is_some()
            && result.contact_title.is_none()
            && looks_like_title(segment)
        {
            result.contact_title = clean(segment);
        }
    }

    result
}

fn looks_like_name(segment: &str) -> bool {
    let words: Vec<&str> = segment.split_whitespace().collect();
    (2..=3).contains(&words.len())
        && words.iter().all(|word| {
            word.chars().next().is_some_and(char::is_uppercase)
                && word
                    .chars()
                    .all(|c| c.is_alphabetic() || matches!(c, '-' | '\'' | '.'))
        })
}

fn looks_like_title(segment: &str) -> bool {
    let words = segment.split_whitespace().count();
    (1..=6).contains(&words)
        && segment.chars().next().is_some_and(char::is_uppercase)
        && !segment.chars().any(|c| c.is_ascii_digit() || c == '@')
        && !segment.ends_with(['.', '?', '!', ':'])
}
