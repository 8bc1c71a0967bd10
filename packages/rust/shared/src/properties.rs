//! Notion page property values, as returned by the API.
//!
//! Each property is `{"id", "type": "<kind>", "<kind>": <value>}`. The enum is
//! internally tagged on `type`; kinds this crate does not model deserialize to
//! [`RawProperty::Unknown`].

use serde::Deserialize;

use crate::blocks::RichText;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// A user reference. `name` is absent when the integration lacks user access.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartialUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub external: Option<FileUrl>,
    #[serde(default)]
    pub file: Option<FileUrl>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniqueId {
    #[serde(default)]
    pub prefix: Option<String>,
    pub number: Option<i64>,
}

/// Result of a formula property.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String {
        #[serde(default)]
        string: Option<String>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Boolean {
        #[serde(default)]
        boolean: Option<bool>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Unknown,
}

/// Result of a rollup property. Array items are themselves property values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollupValue {
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    Array {
        #[serde(default)]
        array: Vec<RawProperty>,
    },
    #[serde(other)]
    Unknown,
}

/// A typed property value from a Notion page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawProperty {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Status {
        #[serde(default)]
        status: Option<SelectOption>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Email {
        #[serde(default)]
        email: Option<String>,
    },
    PhoneNumber {
        #[serde(default)]
        phone_number: Option<String>,
    },
    Formula {
        formula: FormulaValue,
    },
    Rollup {
        rollup: RollupValue,
    },
    People {
        #[serde(default)]
        people: Vec<PartialUser>,
    },
    Files {
        #[serde(default)]
        files: Vec<FileRef>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    CreatedTime {
        created_time: String,
    },
    CreatedBy {
        created_by: PartialUser,
    },
    LastEditedTime {
        last_edited_time: String,
    },
    LastEditedBy {
        last_edited_by: PartialUser,
    },
    UniqueId {
        #[serde(default)]
        unique_id: Option<UniqueId>,
    },
    #[serde(other)]
    Unknown,
}
