//! Pre-built request specs for common platform operations.
//!
//! `ApiCatalog::new` builds every spec once against a registry and fails on
//! the first configuration error, so a process that starts with a catalog
//! cannot hit an unregistered endpoint later. The specs are immutable and can
//! be shared freely between threads; call sites that need a variation derive
//! one (`with_response_shape`, `with_path_suffix`, ...).

use crate::adjust::Adjustment;
use crate::dates::DateFormat;
use crate::error::ConfigError;
use crate::http::HttpMethod;
use crate::inclusion::InclusionPolicy;
use crate::registry::{EntityType as E, Registry};
use crate::spec::{OperationKind as K, RequestSpec, ResponseShape};

/// Fields a client PATCH may change.
pub const CLIENT_PATCH_FIELDS: &[&str] = &[
    "id",
    "firstName",
    "middleName",
    "lastName",
    "homePhone",
    "emailAddress",
    "gender",
    "birthDate",
    "state",
    "assignedBranchKey",
];

/// Fields of a loan account a PATCH may change.
pub const LOAN_PATCH_FIELDS: &[&str] = &[
    "loanAmount",
    "interestRate",
    "repaymentInstallments",
    "fixedDaysOfMonth",
    "disbursementDetails",
];

/// Disbursement dates a loan PATCH carries on the account itself.
pub const LOAN_PATCH_DATES: &[&str] = &["expectedDisbursementDate", "firstRepaymentDate"];

#[derive(Debug, Clone)]
pub struct ApiCatalog {
    pub get_client: RequestSpec,
    pub get_client_details: RequestSpec,
    pub get_clients: RequestSpec,
    pub create_client: RequestSpec,
    pub patch_client: RequestSpec,
    pub delete_client: RequestSpec,
    pub get_client_loans: RequestSpec,
    pub create_client_comment: RequestSpec,
    pub get_client_comments: RequestSpec,
    pub create_loan_account: RequestSpec,
    pub get_loan_account: RequestSpec,
    pub get_loan_account_details: RequestSpec,
    pub patch_loan_account: RequestSpec,
    pub get_loan_transactions: RequestSpec,
    pub post_loan_transaction: RequestSpec,
    pub create_user: RequestSpec,
    pub patch_user: RequestSpec,
    pub get_tasks: RequestSpec,
    pub update_task: RequestSpec,
    pub search: RequestSpec,
    pub get_indicators: RequestSpec,
    pub get_general_settings: RequestSpec,
}

impl ApiCatalog {
    pub fn new(registry: &Registry) -> Result<Self, ConfigError> {
        let build = |kind, entity| RequestSpec::builder(kind, entity).build(registry);

        Ok(Self {
            get_client: build(K::GetEntity, E::CLIENT)?,
            get_client_details: build(K::GetEntityWithDetails, E::CLIENT)?,
            get_clients: build(K::GetList, E::CLIENT)?,
            create_client: RequestSpec::builder(K::CreateJson, E::CLIENT)
                .adjust(Adjustment::envelope("client"))
                .build(registry)?,
            patch_client: RequestSpec::builder(K::PatchEntity, E::CLIENT)
                .inclusion(InclusionPolicy::new(E::CLIENT, CLIENT_PATCH_FIELDS.iter().copied()))
                .adjust(Adjustment::envelope("client"))
                .build(registry)?,
            delete_client: build(K::DeleteEntity, E::CLIENT)?,
            get_client_loans: RequestSpec::builder(K::GetRelatedEntities, E::CLIENT)
                .result(E::LOAN_ACCOUNT)
                .build(registry)?,
            create_client_comment: RequestSpec::builder(K::CreateOwnedEntity, E::CLIENT)
                .result(E::COMMENT)
                .inclusion(InclusionPolicy::new(E::COMMENT, ["text"]))
                .adjust(Adjustment::envelope("comment"))
                .build(registry)?,
            get_client_comments: RequestSpec::builder(K::GetOwnedEntities, E::CLIENT)
                .result(E::COMMENT)
                .build(registry)?,
            create_loan_account: RequestSpec::builder(K::CreateJson, E::LOAN_ACCOUNT)
                .adjust(Adjustment::envelope("loanAccount"))
                .build(registry)?,
            get_loan_account: build(K::GetEntity, E::LOAN_ACCOUNT)?,
            get_loan_account_details: build(K::GetEntityWithDetails, E::LOAN_ACCOUNT)?,
            patch_loan_account: RequestSpec::builder(K::PatchEntity, E::LOAN_ACCOUNT)
                .inclusion(
                    InclusionPolicy::new(E::LOAN_ACCOUNT, LOAN_PATCH_FIELDS.iter().copied())
                        .and(E::DISBURSEMENT_DETAILS, LOAN_PATCH_DATES.iter().copied()),
                )
                .date_format(DateFormat::Date)
                .adjust(Adjustment::promote(
                    "disbursementDetails",
                    LOAN_PATCH_DATES.iter().map(|field| (*field, *field)),
                ))
                .adjust(Adjustment::join_array("fixedDaysOfMonth"))
                .adjust(Adjustment::envelope("loanAccount"))
                .build(registry)?,
            get_loan_transactions: RequestSpec::builder(K::GetOwnedEntities, E::LOAN_ACCOUNT)
                .result(E::LOAN_TRANSACTION)
                .build(registry)?,
            post_loan_transaction: RequestSpec::builder(K::PostEntityAction, E::LOAN_ACCOUNT)
                .result(E::LOAN_TRANSACTION)
                .build(registry)?,
            create_user: RequestSpec::builder(K::CreateJson, E::USER)
                .inclusion(
                    InclusionPolicy::new(
                        E::USER,
                        ["id", "username", "firstName", "lastName", "email", "role"],
                    )
                    .and(E::ROLE, ["encodedKey", "id"]),
                )
                .adjust(Adjustment::rebuild_nested("role", "userRole", ["encodedKey", "id"]))
                .adjust(Adjustment::envelope("user"))
                .build(registry)?,
            patch_user: RequestSpec::builder(K::PatchEntity, E::USER)
                .inclusion(
                    InclusionPolicy::new(E::USER, ["firstName", "lastName", "email", "role"])
                        .and(E::ROLE, ["encodedKey"]),
                )
                .adjust(Adjustment::replace_with_id("role", "encodedKey", "roleKey"))
                .adjust(Adjustment::envelope("user"))
                .build(registry)?,
            get_tasks: build(K::GetList, E::TASK)?,
            update_task: RequestSpec::builder(K::UpdateJson, E::TASK)
                .inclusion(InclusionPolicy::new(
                    E::TASK,
                    ["title", "description", "status", "dueDate", "assignedUserKey", "taskLinkKey"],
                ))
                .adjust(Adjustment::envelope("task"))
                .build(registry)?,
            search: build(K::GetList, E::SEARCH_RESULT)?,
            get_indicators: RequestSpec::custom(registry.endpoint_for(E::INDICATOR)?, HttpMethod::Get)
                .result(E::INDICATOR)
                .response(ResponseShape::Collection)
                .build(registry)?,
            get_general_settings: RequestSpec::custom(
                registry.endpoint_for(E::GENERAL_SETTINGS)?,
                HttpMethod::Get,
            )
            .result(E::GENERAL_SETTINGS)
            .response(ResponseShape::Raw)
            .build(registry)?,
        })
    }
}
