use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use workdesk_core::{DomainError, DomainResult, Entity, RecordId};

use crate::{Record, RecordKind};

const TITLE_MIN: usize = 4;
const TITLE_MAX: usize = 100;

/// Work done for a customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "projectID")]
    pub id: RecordId,
    pub title: String,
    pub detail: String,
    #[serde(rename = "customerID")]
    pub customer_id: RecordId,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_end: Option<DateTime<Utc>>,
    pub profit: f64,
    #[serde(skip)]
    active: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(rename = "customerID")]
    pub customer_id: RecordId,
    pub date: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub profit: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub detail: Option<String>,
    #[serde(rename = "customerID")]
    pub customer_id: Option<RecordId>,
    pub date: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    pub profit: Option<f64>,
}

impl Entity for Project {
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

impl Record for Project {
    const KIND: RecordKind = RecordKind::Project;
    type Draft = NewProject;
    type Patch = ProjectUpdate;

    fn create(draft: NewProject) -> DomainResult<Self> {
        let project = Self {
            id: RecordId::new(),
            title: validate_title(&draft.title)?,
            detail: draft.detail,
            customer_id: draft.customer_id,
            date: draft.date,
            date_end: draft.date_end,
            profit: validate_profit(draft.profit)?,
            active: true,
        };
        validate_period(project.date, project.date_end)?;
        Ok(project)
    }

    fn apply(&mut self, patch: ProjectUpdate) -> DomainResult<()> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let profit = patch.profit.map(validate_profit).transpose()?;
        let date = patch.date.unwrap_or(self.date);
        let date_end = patch.date_end.or(self.date_end);
        validate_period(date, date_end)?;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(detail) = patch.detail {
            self.detail = detail;
        }
        if let Some(customer_id) = patch.customer_id {
            self.customer_id = customer_id;
        }
        if let Some(profit) = profit {
            self.profit = profit;
        }
        self.date = date;
        self.date_end = date_end;
        Ok(())
    }

    fn links(&self) -> Vec<(RecordKind, RecordId)> {
        vec![(RecordKind::Customer, self.customer_id)]
    }

    fn sort_key(&self) -> DateTime<Utc> {
        self.date
    }
}

fn validate_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    let len = title.chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(DomainError::validation(format!(
            "title must be {TITLE_MIN} to {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_profit(profit: f64) -> DomainResult<f64> {
    if !profit.is_finite() {
        return Err(DomainError::validation("profit must be a finite number"));
    }
    Ok(profit)
}

fn validate_period(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> DomainResult<()> {
    match end {
        Some(end) if end < start => Err(DomainError::validation("dateEnd cannot precede date")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn draft() -> NewProject {
        NewProject {
            title: "Kitchen remodel".into(),
            detail: String::new(),
            customer_id: RecordId::new(),
            date: Utc::now(),
            date_end: None,
            profit: 1200.0,
        }
    }

    #[test]
    fn short_title_is_rejected() {
        let err = Project::create(NewProject {
            title: "abc".into(),
            ..draft()
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn end_before_start_is_rejected_on_update() {
        let mut project = Project::create(draft()).unwrap();
        let before = project.date - Duration::days(1);

        let result = project.apply(ProjectUpdate {
            title: Some("Bathroom remodel".into()),
            date_end: Some(before),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(project.title, "Kitchen remodel");
    }

    #[test]
    fn links_to_its_customer() {
        let project = Project::create(draft()).unwrap();
        assert_eq!(project.links(), vec![(RecordKind::Customer, project.customer_id)]);
    }

    #[test]
    fn open_ended_project_omits_date_end() {
        let json = serde_json::to_value(Project::create(draft()).unwrap()).unwrap();
        assert!(json.get("dateEnd").is_none());
        assert!(json["customerID"].is_string());
    }
}
