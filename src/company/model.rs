//! Wire-facing company messages shared by both transports.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A company as seen by clients. `id == 0` means not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Company {
    /// An unsaved company with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SaveCompanyRequest {
    pub company: Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindCompanyRequest {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteCompanyRequest {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindAllCompaniesRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FindAllCompaniesResponse {
    pub companies: Vec<Company>,
}

/// Canonical reply for operations without a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}

/// The fixed capability set of the company service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Save,
    Find,
    Delete,
    FindAll,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Save => "Save",
            Method::Find => "Find",
            Method::Delete => "Delete",
            Method::FindAll => "FindAll",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsaved_company_omits_timestamps() {
        let json = serde_json::to_value(Company::named("Acme")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 0, "name": "Acme" }));
    }

    #[test]
    fn save_request_accepts_missing_id() {
        let req: SaveCompanyRequest =
            serde_json::from_str(r#"{"company":{"name":"Acme"}}"#).unwrap();
        assert_eq!(req.company.id, 0);
        assert_eq!(req.company.name, "Acme");
        assert!(req.company.created_at.is_none());
    }
}
