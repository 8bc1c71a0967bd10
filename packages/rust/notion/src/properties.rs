//! Page title and property-value extraction.

use std::collections::BTreeMap;

use spoketome_shared::PropertyValue;
use spoketome_shared::blocks::plain_text;
use spoketome_shared::properties::{
    DateValue, FileRef, FormulaValue, PartialUser, RawProperty, RollupValue, SelectOption,
};

/// Title used when a page has no non-empty title property.
pub const UNTITLED: &str = "Untitled";

/// The plain text of the first non-empty `title` property.
pub fn extract_title(props: &BTreeMap<String, RawProperty>) -> String {
    props
        .values()
        .find_map(|prop| match prop {
            RawProperty::Title { title } if !title.is_empty() => Some(plain_text(title)),
            _ => None,
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Every non-title property, reduced to a [`PropertyValue`].
pub fn extract_properties(props: &BTreeMap<String, RawProperty>) -> BTreeMap<String, PropertyValue> {
    props
        .iter()
        .filter(|(_, prop)| !matches!(prop, RawProperty::Title { .. }))
        .map(|(name, prop)| (name.clone(), extract_value(prop)))
        .collect()
}

/// Reduce one property to a plain value.
pub fn extract_value(prop: &RawProperty) -> PropertyValue {
    use PropertyValue as V;

    match prop {
        RawProperty::Title { title } => V::String(plain_text(title)),
        RawProperty::RichText { rich_text } => {
            let text = plain_text(rich_text);
            if text.is_empty() { V::Null } else { V::String(text) }
        }
        RawProperty::Number { number } => number.map_or(V::Null, V::Number),
        RawProperty::Select { select } | RawProperty::Status { status: select } => {
            option_name(select.as_ref())
        }
        RawProperty::MultiSelect { multi_select } => {
            V::List(multi_select.iter().map(|o| o.name.clone()).collect())
        }
        RawProperty::Date { date } => date.as_ref().map_or(V::Null, date_range),
        RawProperty::Checkbox { checkbox } => V::Bool(*checkbox),
        RawProperty::Url { url: s }
        | RawProperty::Email { email: s }
        | RawProperty::PhoneNumber { phone_number: s } => V::from_opt_string(s.clone()),
        RawProperty::Formula { formula } => formula_value(formula),
        RawProperty::Rollup { rollup } => rollup_value(rollup),
        RawProperty::People { people } => V::List(people.iter().filter_map(user_label).collect()),
        RawProperty::Files { files } => V::List(files.iter().filter_map(file_label).collect()),
        RawProperty::Relation { relation } => {
            V::List(relation.iter().map(|r| r.id.clone()).collect())
        }
        RawProperty::CreatedTime { created_time: t }
        | RawProperty::LastEditedTime { last_edited_time: t } => V::String(t.clone()),
        RawProperty::CreatedBy { created_by: u } | RawProperty::LastEditedBy { last_edited_by: u } => {
            V::from_opt_string(user_label(u))
        }
        RawProperty::UniqueId { unique_id } => unique_id
            .as_ref()
            .and_then(|id| {
                let number = id.number?;
                Some(match id.prefix.as_deref() {
                    Some(prefix) if !prefix.is_empty() => format!("{prefix}-{number}"),
                    _ => number.to_string(),
                })
            })
            .map_or(V::Null, V::String),
        RawProperty::Unknown => V::Null,
    }
}

fn option_name(option: Option<&SelectOption>) -> PropertyValue {
    option.map_or(PropertyValue::Null, |o| PropertyValue::String(o.name.clone()))
}

fn date_range(date: &DateValue) -> PropertyValue {
    PropertyValue::String(match &date.end {
        Some(end) => format!("{} → {end}", date.start),
        None => date.start.clone(),
    })
}

fn formula_value(formula: &FormulaValue) -> PropertyValue {
    use PropertyValue as V;

    match formula {
        FormulaValue::String { string } => V::from_opt_string(string.clone()),
        FormulaValue::Number { number } => number.map_or(V::Null, V::Number),
        FormulaValue::Boolean { boolean } => boolean.map_or(V::Null, V::Bool),
        FormulaValue::Date { date } => date
            .as_ref()
            .map_or(V::Null, |d| V::String(d.start.clone())),
        FormulaValue::Unknown => V::Null,
    }
}

fn rollup_value(rollup: &RollupValue) -> PropertyValue {
    use PropertyValue as V;

    match rollup {
        RollupValue::Number { number } => number.map_or(V::Null, V::Number),
        RollupValue::Date { date } => date
            .as_ref()
            .map_or(V::Null, |d| V::String(d.start.clone())),
        RollupValue::Array { array } => {
            V::List(array.iter().flat_map(|item| flatten(extract_value(item))).collect())
        }
        RollupValue::Unknown => V::Null,
    }
}

/// Stringify a value for inclusion in a list; nulls vanish, lists splice in.
fn flatten(value: PropertyValue) -> Vec<String> {
    match value {
        PropertyValue::Null => Vec::new(),
        PropertyValue::Bool(b) => vec![b.to_string()],
        PropertyValue::Number(n) => vec![n.to_string()],
        PropertyValue::String(s) => vec![s],
        PropertyValue::List(items) => items,
    }
}

fn user_label(user: &PartialUser) -> Option<String> {
    user.name.clone().or_else(|| user.id.clone())
}

fn file_label(file: &FileRef) -> Option<String> {
    file.external
        .as_ref()
        .or(file.file.as_ref())
        .map(|f| f.url.clone())
        .or_else(|| file.name.clone())
}
