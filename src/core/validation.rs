use crate::domain::model::{Field, FormDraft};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

// 寬鬆的 local@domain.tld 格式，不是完整的 RFC 5322
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Which optional inputs take part in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSet {
    pub require_email: bool,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            require_email: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(Field::as_str).collect();
        f.write_str(&fields.join(", "))
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// 純函式：同樣的草稿永遠得到同樣的錯誤集合
pub fn validate(draft: &FormDraft, fields: &FieldSet) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if draft.title.trim().is_empty() {
        errors.insert(Field::Title, "Title is required.");
    }

    if draft.description.trim().is_empty() {
        errors.insert(Field::Description, "Description is required.");
    }

    if draft.contact_name.trim().is_empty() {
        errors.insert(Field::ContactName, "Name is required.");
    }

    if fields.require_email {
        let email = draft.contact_email.trim();
        if email.is_empty() {
            errors.insert(Field::ContactEmail, "Email is required.");
        } else if !is_valid_email(email) {
            errors.insert(Field::ContactEmail, "Check the email address.");
        }
    }

    errors
}
