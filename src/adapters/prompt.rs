use crate::domain::model::InputRecord;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern"));

/// Asks for a JSON array of ranked contacts, which is what `core::extraction`
/// handles best. Free-text answers still work, just less reliably.
pub const DEFAULT_TEMPLATE: &str = r#"I need to find the best person to contact at {company_name} (website: {website}, location: {location}) about tools for their property operations team.

Company description: {description}
Known company phone: {phone}
Known company email: {email}

Look for owners, operations, maintenance or quality assurance staff. For each contact person provide:
1. first name
2. last name
3. professional email address
4. job title
5. the approximate number of properties the company manages (a lower bound such as "over 50" is fine)
6. contact priority (1 = contact first)

Answer with a JSON array of objects using exactly these keys: "first_name", "last_name", "email", "title", "num_properties", "contact_priority".
Use null for anything you cannot find. Do not guess email addresses."#;

/// Prompt text with `{field}` placeholders for the input columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// True if the template mentions `{company_name}`; without it every row
    /// would send the same question.
    pub fn references_company(&self) -> bool {
        self.template.contains("{company_name}")
    }

    /// Fills placeholders in one pass, so braces inside row values are left
    /// alone. Unknown `{names}` stay as written.
    pub fn render(&self, record: &InputRecord) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.template, |caps: &Captures| {
                let value = match &caps[1] {
                    "company_name" => &record.company_name,
                    "website" => &record.website,
                    "location" => &record.location,
                    "description" => &record.description,
                    "phone" => &record.phone,
                    "email" => &record.email,
                    _ => return caps[0].to_string(),
                };
                value.trim().to_string()
            })
            .into_owned()
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}
