use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workdesk_core::{DomainError, DomainResult, Entity, RecordId};

use crate::{Record, RecordKind, required_text};

/// One priced line of an expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub name: String,
    pub price: f64,
}

/// A purchase, optionally charged to a project.
///
/// `total_price` and `is_vat` are derived from the lines and VAT rate and are
/// recomputed on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "expenseID")]
    pub id: RecordId,
    pub title: String,
    pub seller: String,
    #[serde(rename = "projectID", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<RecordId>,
    pub date: DateTime<Utc>,
    pub lists: Vec<ExpenseLine>,
    pub current_vat: f64,
    total_price: f64,
    is_vat: bool,
    #[serde(skip)]
    active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub title: String,
    #[serde(default)]
    pub seller: String,
    #[serde(rename = "projectID")]
    pub project_id: Option<RecordId>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub lists: Vec<ExpenseLine>,
    #[serde(default)]
    pub current_vat: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub seller: Option<String>,
    #[serde(rename = "projectID")]
    pub project_id: Option<RecordId>,
    pub date: Option<DateTime<Utc>>,
    /// Replaces all lines when present.
    pub lists: Option<Vec<ExpenseLine>>,
    pub current_vat: Option<f64>,
}

impl Expense {
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn is_vat(&self) -> bool {
        self.is_vat
    }

    fn recompute(&mut self) {
        self.total_price = self.lists.iter().map(|l| l.price).sum();
        self.is_vat = self.current_vat > 0.0;
    }
}

impl Entity for Expense {
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

impl Record for Expense {
    const KIND: RecordKind = RecordKind::Expense;
    type Draft = NewExpense;
    type Patch = ExpenseUpdate;

    fn create(draft: NewExpense) -> DomainResult<Self> {
        validate_lines(&draft.lists)?;
        let mut expense = Self {
            id: RecordId::new(),
            title: required_text("title", &draft.title)?,
            seller: draft.seller.trim().to_string(),
            project_id: draft.project_id,
            date: draft.date,
            lists: draft.lists,
            current_vat: validate_vat(draft.current_vat)?,
            total_price: 0.0,
            is_vat: false,
            active: true,
        };
        expense.recompute();
        Ok(expense)
    }

    fn apply(&mut self, patch: ExpenseUpdate) -> DomainResult<()> {
        let title = patch.title.as_deref().map(|t| required_text("title", t)).transpose()?;
        let vat = patch.current_vat.map(validate_vat).transpose()?;
        if let Some(lists) = &patch.lists {
            validate_lines(lists)?;
        }

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(seller) = patch.seller {
            self.seller = seller.trim().to_string();
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(lists) = patch.lists {
            self.lists = lists;
        }
        if let Some(vat) = vat {
            self.current_vat = vat;
        }
        self.recompute();
        Ok(())
    }

    fn links(&self) -> Vec<(RecordKind, RecordId)> {
        self.project_id
            .map(|id| (RecordKind::Project, id))
            .into_iter()
            .collect()
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.date
    }
}

fn validate_lines(lines: &[ExpenseLine]) -> DomainResult<()> {
    for line in lines {
        if line.name.trim().is_empty() {
            return Err(DomainError::validation("expense line name cannot be empty"));
        }
        if !line.price.is_finite() || line.price < 0.0 {
            return Err(DomainError::validation(format!(
                "expense line '{}' has an invalid price",
                line.name
            )));
        }
    }
    Ok(())
}

fn validate_vat(vat: f64) -> DomainResult<f64> {
    if !vat.is_finite() || vat < 0.0 {
        return Err(DomainError::validation("currentVat must be a non-negative number"));
    }
    Ok(vat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, price: f64) -> ExpenseLine {
        ExpenseLine {
            name: name.into(),
            price,
        }
    }

    fn draft() -> NewExpense {
        NewExpense {
            title: "Lumber".into(),
            seller: "Yard & Co".into(),
            project_id: None,
            date: Utc::now(),
            lists: vec![line("boards", 120.5), line("nails", 9.5)],
            current_vat: 0.0,
        }
    }

    #[test]
    fn totals_are_derived_from_lines() {
        let expense = Expense::create(draft()).unwrap();
        assert_eq!(expense.total_price(), 130.0);
        assert!(!expense.is_vat());
        assert!(expense.links().is_empty());
    }

    #[test]
    fn update_recomputes_derived_fields() {
        let mut expense = Expense::create(draft()).unwrap();
        expense
            .apply(ExpenseUpdate {
                lists: Some(vec![line("boards", 50.0)]),
                current_vat: Some(7.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(expense.total_price(), 50.0);
        assert!(expense.is_vat());

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["totalPrice"], 50.0);
        assert_eq!(json["isVat"], true);
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = Expense::create(NewExpense {
            lists: vec![line("refund", -1.0)],
            ..draft()
        })
        .unwrap_err();
        assert!(err.to_string().contains("refund"));
    }

    #[test]
    fn project_link_is_reported() {
        let project = RecordId::new();
        let expense = Expense::create(NewExpense {
            project_id: Some(project),
            ..draft()
        })
        .unwrap();
        assert_eq!(expense.links(), vec![(RecordKind::Project, project)]);
    }
}
