use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workdesk_core::{DomainResult, Entity, RecordId};

use crate::{Record, RecordKind, required_text};

/// A customer with its contact lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "customerID")]
    pub id: RecordId,
    pub name: String,
    pub address: String,
    #[serde(rename = "taxID")]
    pub tax_id: String,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "taxID")]
    pub tax_id: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// Partial update. Contact lists are edited by adding and removing entries
/// rather than by replacing the whole list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "taxID")]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub add_phones: Vec<String>,
    #[serde(default)]
    pub remove_phones: Vec<String>,
    #[serde(default)]
    pub add_emails: Vec<String>,
    #[serde(default)]
    pub remove_emails: Vec<String>,
}

impl Entity for Customer {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn deactivate(&mut self) {
        self.active = false;
    }
}

impl Record for Customer {
    const KIND: RecordKind = RecordKind::Customer;
    type Draft = NewCustomer;
    type Patch = CustomerUpdate;

    fn create(draft: NewCustomer) -> DomainResult<Self> {
        let mut customer = Self {
            id: RecordId::new(),
            name: required_text("name", &draft.name)?,
            address: draft.address.trim().to_string(),
            tax_id: draft.tax_id.trim().to_string(),
            phones: Vec::new(),
            emails: Vec::new(),
            created_at: Utc::now(),
            active: true,
        };
        merge_unique(&mut customer.phones, draft.phones);
        merge_unique(&mut customer.emails, draft.emails);
        Ok(customer)
    }

    fn apply(&mut self, patch: CustomerUpdate) -> DomainResult<()> {
        let name = patch.name.as_deref().map(|n| required_text("name", n)).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(address) = patch.address {
            self.address = address.trim().to_string();
        }
        if let Some(tax_id) = patch.tax_id {
            self.tax_id = tax_id.trim().to_string();
        }

        merge_unique(&mut self.phones, patch.add_phones);
        self.phones.retain(|p| !patch.remove_phones.contains(p));
        merge_unique(&mut self.emails, patch.add_emails);
        self.emails.retain(|e| !patch.remove_emails.contains(e));
        Ok(())
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append trimmed, non-empty entries not already present.
fn merge_unique(list: &mut Vec<String>, additions: Vec<String>) {
    for entry in additions {
        let entry = entry.trim();
        if !entry.is_empty() && !list.iter().any(|e| e == entry) {
            list.push(entry.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Customer {
        Customer::create(NewCustomer {
            name: "Acme".into(),
            address: "1 Main St".into(),
            tax_id: "TX-1".into(),
            phones: vec!["555-0100".into(), "555-0100".into()],
            emails: vec![],
        })
        .unwrap()
    }

    #[test]
    fn create_trims_and_deduplicates() {
        let customer = acme();
        assert_eq!(customer.phones, vec!["555-0100"]);
        assert!(customer.is_active());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = Customer::create(NewCustomer {
            name: "  ".into(),
            address: String::new(),
            tax_id: String::new(),
            phones: vec![],
            emails: vec![],
        })
        .unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn update_adds_and_removes_contacts() {
        let mut customer = acme();
        customer
            .apply(CustomerUpdate {
                add_phones: vec!["555-0199".into()],
                remove_phones: vec!["555-0100".into()],
                add_emails: vec!["billing@acme.test".into()],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(customer.phones, vec!["555-0199"]);
        assert_eq!(customer.emails, vec!["billing@acme.test"]);
        assert_eq!(customer.name, "Acme");
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(acme()).unwrap();
        assert!(json["customerID"].is_string());
        assert_eq!(json["taxID"], "TX-1");
        assert!(json.get("active").is_none());
    }
}
