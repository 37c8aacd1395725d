//! Session payloads as the admin service sends them.

use serde::{Deserialize, Deserializer, Serialize};

/// Reads an explicit `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub profile_id: Option<String>,
    pub designation: Option<String>,
    pub organization: Option<String>,
    pub profile_picture: Option<String>,
    pub whatsapp_no: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Signed-in administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Tenant-scoped identifier sent as the `index` header; `null` reads as "".
    #[serde(deserialize_with = "null_as_default")]
    pub index: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub account_type: String,
    pub profile: Option<Profile>,
    #[serde(deserialize_with = "null_as_default")]
    pub role: String,
}

impl User {
    pub fn is_super_admin(&self) -> bool {
        self.role == "Super Admin"
    }

    /// Upper-case initials of first and last name; empty if either is blank.
    pub fn initials(&self) -> String {
        let first = self.first_name.trim().chars().next();
        let last = self.last_name.trim().chars().next();
        match (first, last) {
            (Some(f), Some(l)) => f.to_uppercase().chain(l.to_uppercase()).collect(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub id: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub segment: String,
    #[serde(default)]
    pub pages: Vec<Page>,
}

/// Role permission tree: segment → page → actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub data: Vec<Segment>,
}
