//! User document and DTOs.
//!
//! A user exists twice: as an identity with the identity provider (uid, email,
//! display name, `role` custom claim) and as a document `users/<uid>` holding
//! `email`, `name`, `role` and a `class` reference. Both carry the role.

use classbase_store::{Document, FieldValue, Fields};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::collections::{class_path, validate_class_id};

/// Role names known to the API.
pub mod roles {
    pub const ADMIN: &str = "admin";
}

/// Content of `users/<uid>` as written on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDocument {
    pub email: String,
    pub name: String,
    pub role: String,
    pub class_id: String,
}

impl UserDocument {
    pub fn into_fields(self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("email".into(), self.email.into());
        fields.insert("name".into(), self.name.into());
        fields.insert("role".into(), self.role.into());
        fields.insert("class".into(), class_path(&self.class_id).into());
        fields
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    #[validate(email)]
    #[schema(example = "teacher@example.com")]
    pub email: Option<String>,
    #[schema(example = "Grace Hopper")]
    pub name: Option<String>,
    #[schema(example = "teacher")]
    pub role: Option<String>,
    /// Id of a document in `classes`
    #[validate(custom(function = "validate_class_id"))]
    pub class_id: Option<String>,
}

/// A create request with every field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: String,
    pub class_id: String,
}

impl CreateUserDto {
    /// `None` unless all four fields were supplied.
    pub fn complete(self) -> Option<NewUser> {
        Some(NewUser {
            email: self.email?,
            name: self.name?,
            role: self.role?,
            class_id: self.class_id?,
        })
    }
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    #[validate(email)]
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    #[validate(custom(function = "validate_class_id"))]
    pub class_id: Option<String>,
}

impl UpdateUserDto {
    pub fn has_any_field(&self) -> bool {
        self.email.is_some() || self.name.is_some() || self.role.is_some() || self.class_id.is_some()
    }

    /// The role to assign, if one was given and is not empty.
    pub fn new_role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.is_empty())
    }

    /// Document fields to overwrite. Empty strings are skipped and
    /// `classId` becomes a `class` reference.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        if let Some(email) = present(&self.email) {
            fields.insert("email".into(), email.into());
        }
        if let Some(name) = present(&self.name) {
            fields.insert("name".into(), name.into());
        }
        if let Some(role) = present(&self.role) {
            fields.insert("role".into(), role.into());
        }
        if let Some(class_id) = present(&self.class_id) {
            fields.insert("class".into(), class_path(&class_id).into());
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    pub uid: String,
}

/// A user document as returned by the API: the document id, its fields, and
/// in place of the `class` reference the data of the referenced class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserView {
    /// `class` is the already resolved class data; the document's own
    /// `class` field is discarded.
    pub fn from_document(document: &Document, class: Option<Value>) -> Self {
        let mut extra = match document.to_json() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        extra.remove("id");
        extra.remove("class");

        Self {
            id: document.path.id.clone(),
            email: take_string(&mut extra, "email"),
            name: take_string(&mut extra, "name"),
            role: take_string(&mut extra, "role"),
            class,
            extra,
        }
    }
}

/// Removes `key` if it holds a string. Other values stay in `extra`.
fn take_string(extra: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !extra.get(key).is_some_and(Value::is_string) {
        return None;
    }
    match extra.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// The `role` field of a user document, if it is a string.
pub fn document_role(document: &Document) -> Option<String> {
    document
        .fields
        .get("role")
        .and_then(FieldValue::as_str)
        .map(str::to_string)
}
