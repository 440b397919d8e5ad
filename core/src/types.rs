//! Domain DTOs for the platform API.
//!
//! # Design
//! Field names follow the platform's camelCase JSON. Every optional field is
//! skipped when unset, so a partially filled value serializes to exactly the
//! fields the caller set. Each DTO names its `EntityType` through `ApiEntity`;
//! the engine uses that tag as the root type when filtering a write payload.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dates::optional_date_time;
use crate::registry::EntityType;

/// A DTO bound to one registered entity type.
pub trait ApiEntity: Serialize + DeserializeOwned {
    const ENTITY: EntityType;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_branch_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
}

impl ApiEntity for Client {
    const ENTITY: EntityType = EntityType::CLIENT;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ApiEntity for Address {
    const ENTITY: EntityType = EntityType::ADDRESS;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_holder_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repayment_installments: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_days_of_month: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disbursement_details: Option<DisbursementDetails>,
}

impl ApiEntity for LoanAccount {
    const ENTITY: EntityType = EntityType::LOAN_ACCOUNT;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_disbursement_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub first_repayment_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub disbursement_date: Option<DateTime<Utc>>,
}

impl ApiEntity for DisbursementDetails {
    const ENTITY: EntityType = EntityType::DISBURSEMENT_DETAILS;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub entry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApiEntity for LoanTransaction {
    const ENTITY: EntityType = EntityType::LOAN_TRANSACTION;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ApiEntity for User {
    const ENTITY: EntityType = EntityType::USER;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ApiEntity for Role {
    const ENTITY: EntityType = EntityType::ROLE;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<DateTime<Utc>>,
}

impl ApiEntity for Comment {
    const ENTITY: EntityType = EntityType::COMMENT;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        default,
        with = "optional_date_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_link_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_key: Option<String>,
}

impl ApiEntity for Task {
    const ENTITY: EntityType = EntityType::TASK;
}

/// One hit of the global search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(rename = "resultID", skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_string: Option<String>,
}

impl ApiEntity for SearchResult {
    const ENTITY: EntityType = EntityType::SEARCH_RESULT;
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn unset_fields_are_not_serialized() {
        let client = Client {
            first_name: Some("Ana".to_string()),
            ..Client::default()
        };
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json, serde_json::json!({"firstName": "Ana"}));
    }

    #[test]
    fn dates_use_platform_format() {
        let details = DisbursementDetails {
            expected_disbursement_date: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..DisbursementDetails::default()
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["expectedDisbursementDate"], "2020-01-01T00:00:00+0000");
    }

    #[test]
    fn transaction_type_uses_wire_name() {
        let tx: LoanTransaction =
            serde_json::from_str(r#"{"type":"REPAYMENT","amount":10.5,"entryDate":"2021-03-04"}"#)
                .unwrap();
        assert_eq!(tx.kind.as_deref(), Some("REPAYMENT"));
        assert_eq!(tx.amount, Some(10.5));
        assert_eq!(
            tx.entry_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn search_result_reads_upper_case_id() {
        let hit: SearchResult =
            serde_json::from_str(r#"{"resultType":"CLIENT","resultID":"C1","displayString":"Ana X"}"#)
                .unwrap();
        assert_eq!(hit.result_id.as_deref(), Some("C1"));
    }

    #[test]
    fn invalid_date_is_rejected() {
        let result: Result<Comment, _> = serde_json::from_str(r#"{"creationDate":"yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn entity_tags_match_registry_names() {
        assert_eq!(Client::ENTITY.name(), "Client");
        assert_eq!(LoanAccount::ENTITY, EntityType::LOAN_ACCOUNT);
    }
}
