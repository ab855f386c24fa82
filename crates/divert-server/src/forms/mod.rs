//! Declarative form definitions.
//!
//! Each entity describes its editable fields as a [`FormSpec`]: name, label,
//! kind (with constraints), required flag, default and widget hint.
//! [`FormSpec::clean`] turns a submitted `application/x-www-form-urlencoded`
//! map into typed [`Cleaned`] values or per-field [`FormErrors`];
//! [`FormSpec::render`] produces the [`FormView`] document clients display.

pub mod account;
pub mod admin;
pub mod diversion;
pub mod link;
pub mod login;
pub mod number;
pub mod work_order;

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Raw submitted form fields.
pub type FormData = HashMap<String, String>;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Value kinds and their constraints.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text { max_len: usize },
    TextArea,
    Url { max_len: usize },
    Integer,
    DateTime,
    /// Integer-coded enumeration.
    Choice(&'static [(i64, &'static str)]),
    /// String-coded enumeration.
    CodeChoice(&'static [(&'static str, &'static str)]),
    /// Optional foreign key by ID; options are supplied at render time.
    Reference,
    Boolean,
    IpAddress,
    Password,
}

impl FieldKind {
    const fn type_name(self) -> &'static str {
        match self {
            Self::Text { .. } | Self::TextArea => "text",
            Self::Url { .. } => "url",
            Self::Integer => "integer",
            Self::DateTime => "datetime",
            Self::Choice(_) | Self::CodeChoice(_) => "choice",
            Self::Reference => "reference",
            Self::Boolean => "boolean",
            Self::IpAddress => "ip_address",
            Self::Password => "password",
        }
    }
}

/// Display hint for clients rendering the form.
#[derive(Debug, Clone, Copy)]
pub enum Widget {
    TextInput,
    Textarea { rows: u8 },
    Select,
    UrlInput,
    NumberInput,
    DateTimeLocal,
    PasswordInput,
    Checkbox,
    RawId,
}

impl Widget {
    const fn name(self) -> &'static str {
        match self {
            Self::TextInput => "text",
            Self::Textarea { .. } => "textarea",
            Self::Select => "select",
            Self::UrlInput => "url",
            Self::NumberInput => "number",
            Self::DateTimeLocal => "datetime-local",
            Self::PasswordInput => "password",
            Self::Checkbox => "checkbox",
            Self::RawId => "raw_id",
        }
    }

    const fn rows(self) -> Option<u8> {
        match self {
            Self::Textarea { rows } => Some(rows),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Used when an optional field is missing or blank.
    pub default: Option<&'static str>,
    pub widget: Widget,
}

#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// A cleaned field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
    Ref(i64),
    Empty,
}

/// Typed values of a successfully cleaned form.
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    values: BTreeMap<&'static str, Value>,
}

impl Cleaned {
    pub fn text(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(Value::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    pub fn opt_text(&self, name: &str) -> Option<String> {
        match self.values.get(name) {
            Some(Value::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(Value::Int(n)) => *n,
            _ => 0,
        }
    }

    pub fn opt_int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn reference(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(Value::Ref(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Value::Bool(true)))
    }
}

/// Field-level and form-level validation messages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// One selectable option.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
}

impl ChoiceView {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}

/// Options for reference fields, keyed by field name.
pub type ChoiceOptions = BTreeMap<&'static str, Vec<ChoiceView>>;

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub widget: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
    pub required: bool,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceView>>,
    pub errors: Vec<String>,
}

/// A form as a page would render it.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub title: String,
    pub form: &'static str,
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
}

impl FormSpec {
    /// Validate submitted data against every field.
    pub fn clean(&self, data: &FormData) -> Result<Cleaned, FormErrors> {
        let mut cleaned = Cleaned::default();
        let mut errors = FormErrors::default();

        for field in self.fields {
            match clean_field(field, data.get(field.name).map(String::as_str)) {
                Ok(value) => {
                    cleaned.values.insert(field.name, value);
                }
                Err(message) => errors.add(field.name, message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }

    /// Render the form with the given values, errors and reference options.
    pub fn render(
        &self,
        title: &str,
        values: &FormData,
        errors: &FormErrors,
        options: &ChoiceOptions,
    ) -> FormView {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let value = match field.kind {
                    FieldKind::Password => None,
                    _ => values
                        .get(field.name)
                        .cloned()
                        .or_else(|| field.default.map(String::from)),
                };
                FieldView {
                    name: field.name,
                    label: field.label,
                    kind: field.kind.type_name(),
                    widget: field.widget.name(),
                    rows: field.widget.rows(),
                    required: field.required,
                    value,
                    choices: choices_for(field, options),
                    errors: errors.fields.get(field.name).cloned().unwrap_or_default(),
                }
            })
            .collect();

        FormView {
            title: title.to_string(),
            form: self.name,
            fields,
            non_field_errors: errors.non_field.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn choices_for(field: &FieldSpec, options: &ChoiceOptions) -> Option<Vec<ChoiceView>> {
    match field.kind {
        FieldKind::Choice(choices) => Some(
            choices
                .iter()
                .map(|(v, label)| ChoiceView::new(v, *label))
                .collect(),
        ),
        FieldKind::CodeChoice(choices) => Some(
            choices
                .iter()
                .map(|(v, label)| ChoiceView::new(v, *label))
                .collect(),
        ),
        FieldKind::Reference => options.get(field.name).cloned(),
        _ => None,
    }
}

fn clean_field(field: &FieldSpec, raw: Option<&str>) -> Result<Value, String> {
    if let FieldKind::Boolean = field.kind {
        return Ok(match raw.map(str::trim) {
            Some(v) if !v.is_empty() => Value::Bool(parse_bool(v)),
            _ => Value::Bool(field.default.is_some_and(parse_bool)),
        });
    }

    let raw = match field.kind {
        FieldKind::Password => raw.filter(|v| !v.is_empty()),
        _ => raw.map(str::trim).filter(|v| !v.is_empty()),
    };

    let Some(raw) = raw.or(field.default) else {
        return if field.required {
            Err(REQUIRED.to_string())
        } else {
            Ok(Value::Empty)
        };
    };

    match field.kind {
        FieldKind::Text { max_len } => check_len(raw, max_len).map(|()| Value::Text(raw.into())),
        FieldKind::TextArea | FieldKind::Password => Ok(Value::Text(raw.into())),
        FieldKind::Url { max_len } => {
            check_len(raw, max_len)?;
            if is_valid_url(raw) {
                Ok(Value::Text(raw.into()))
            } else {
                Err("Enter a valid URL.".to_string())
            }
        }
        FieldKind::Integer => raw
            .parse()
            .map(Value::Int)
            .map_err(|_| "Enter a whole number.".to_string()),
        FieldKind::DateTime => parse_datetime(raw)
            .map(Value::Int)
            .ok_or_else(|| "Enter a valid date/time.".to_string()),
        FieldKind::Choice(choices) => raw
            .parse::<i64>()
            .ok()
            .filter(|v| choices.iter().any(|(c, _)| c == v))
            .map(Value::Int)
            .ok_or_else(|| {
                format!("Select a valid choice. {raw} is not one of the available choices.")
            }),
        FieldKind::CodeChoice(choices) => {
            if choices.iter().any(|(c, _)| *c == raw) {
                Ok(Value::Text(raw.into()))
            } else {
                Err(format!(
                    "Select a valid choice. {raw} is not one of the available choices."
                ))
            }
        }
        FieldKind::Reference => raw
            .parse()
            .map(Value::Ref)
            .map_err(|_| INVALID_CHOICE.to_string()),
        FieldKind::IpAddress => raw
            .parse::<IpAddr>()
            .map(|ip| Value::Text(ip.to_string()))
            .map_err(|_| "Enter a valid IPv4 or IPv6 address.".to_string()),
        FieldKind::Boolean => Ok(Value::Bool(parse_bool(raw))),
    }
}

fn check_len(raw: &str, max_len: usize) -> Result<(), String> {
    let len = raw.chars().count();
    if len > max_len {
        Err(format!(
            "Ensure this value has at most {max_len} characters (it has {len})."
        ))
    } else {
        Ok(())
    }
}

fn parse_bool(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

fn is_valid_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok_and(|u| {
        matches!(u.scheme(), "http" | "https" | "ftp" | "ftps")
            && u.host_str().is_some_and(|h| !h.is_empty())
    })
}

/// Build initial form values from record fields.
pub fn form_data<const N: usize>(pairs: [(&str, String); N]) -> FormData {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Render an optional ID the way a select expects it.
pub fn opt_id(id: Option<i64>) -> String {
    id.map(|v| v.to_string()).unwrap_or_default()
}

/// Parse a form date/time (UTC) into unix seconds.
///
/// Accepts `datetime-local` input values, space-separated timestamps and
/// bare dates (midnight).
pub fn parse_datetime(raw: &str) -> Option<i64> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp())
}

/// Format unix seconds as a `datetime-local` input value (UTC).
pub fn format_datetime(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const TEST_FORM: FormSpec = FormSpec {
        name: "test",
        fields: &[
            FieldSpec {
                name: "title",
                label: "Title",
                kind: FieldKind::Text { max_len: 5 },
                required: true,
                default: None,
                widget: Widget::TextInput,
            },
            FieldSpec {
                name: "status",
                label: "Status",
                kind: FieldKind::Choice(&[(0, "Off"), (1, "On")]),
                required: false,
                default: Some("0"),
                widget: Widget::Select,
            },
            FieldSpec {
                name: "parent",
                label: "Parent",
                kind: FieldKind::Reference,
                required: false,
                default: None,
                widget: Widget::Select,
            },
            FieldSpec {
                name: "visible",
                label: "Visible",
                kind: FieldKind::Boolean,
                required: false,
                default: Some("true"),
                widget: Widget::Checkbox,
            },
        ],
    };

    fn data(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_fill_missing_optional_fields() {
        let cleaned = TEST_FORM.clean(&data(&[("title", " abc ")])).unwrap();
        assert_eq!(cleaned.text("title"), "abc");
        assert_eq!(cleaned.int("status"), 0);
        assert_eq!(cleaned.reference("parent"), None);
        assert!(cleaned.boolean("visible"));
    }

    #[test]
    fn collects_every_field_error() {
        let errors = TEST_FORM
            .clean(&data(&[("status", "7"), ("parent", "abc")]))
            .unwrap_err();
        assert_eq!(errors.fields["title"], vec![REQUIRED.to_string()]);
        assert!(errors.fields["status"][0].contains("7 is not one of"));
        assert_eq!(errors.fields["parent"], vec![INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn max_length_counts_characters() {
        assert!(TEST_FORM.clean(&data(&[("title", "链接链接链")])).is_ok());
        let errors = TEST_FORM.clean(&data(&[("title", "toolong")])).unwrap_err();
        assert!(errors.fields["title"][0].contains("at most 5"));
    }

    #[test]
    fn explicit_false_overrides_boolean_default() {
        let cleaned = TEST_FORM
            .clean(&data(&[("title", "a"), ("visible", "off")]))
            .unwrap();
        assert!(!cleaned.boolean("visible"));
    }

    #[test]
    fn render_echoes_values_and_errors() {
        let mut errors = FormErrors::default();
        errors.add("title", "bad");
        let mut options = ChoiceOptions::new();
        options.insert("parent", vec![ChoiceView::new(3, "third")]);

        let view = TEST_FORM.render("Edit", &data(&[("title", "zz")]), &errors, &options);
        assert_eq!(view.fields[0].value.as_deref(), Some("zz"));
        assert_eq!(view.fields[0].errors, vec!["bad".to_string()]);
        assert_eq!(view.fields[1].value.as_deref(), Some("0"));
        assert_eq!(view.fields[1].choices.as_ref().unwrap().len(), 2);
        assert_eq!(view.fields[2].choices.as_ref().unwrap()[0].value, "3");

        let bare = TEST_FORM.render("Add", &FormData::new(), &FormErrors::default(), &ChoiceOptions::new());
        assert!(bare.fields[2].choices.is_none());
    }

    #[test]
    fn datetime_formats() {
        assert_eq!(parse_datetime("1970-01-02T00:00"), Some(86_400));
        assert_eq!(parse_datetime("1970-01-01 00:01:05"), Some(65));
        assert_eq!(parse_datetime("1970-01-03"), Some(172_800));
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(format_datetime(86_400), "1970-01-02T00:00");
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("mailto:a@b.c"));
    }
}
