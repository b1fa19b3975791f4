use crate::api::ApiError;
use crate::db::OperationStore;
use crate::models::OperationPage;
use crate::validation::{validate_account_name, Pagination};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackedAccounts {
    pub accounts: Vec<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Newest-first operations, optionally filtered by account and type.
///
/// Blank filters are ignored. A non-blank account must be a valid account
/// name. Pagination values outside their range fall back to the defaults.
pub async fn get_operations(
    store: &dyn OperationStore,
    account: Option<&str>,
    op_type: Option<&str>,
    page: Option<i64>,
    page_size: Option<i64>,
) -> Result<OperationPage, ApiError> {
    let account = non_empty(account);
    let op_type = non_empty(op_type);
    if let Some(account) = account {
        validate_account_name(account)?;
    }

    let pagination = Pagination::normalize(page, page_size);
    debug!(
        "Querying operations: account={:?}, op_type={:?}, page={}, page_size={}",
        account, op_type, pagination.page, pagination.page_size
    );

    let result = store
        .query(account, op_type, pagination.page, pagination.page_size)
        .await?;
    Ok(result)
}

pub async fn get_tracked_accounts(store: &dyn OperationStore) -> Result<TrackedAccounts, ApiError> {
    let accounts = store.tracked_accounts().await?;
    Ok(TrackedAccounts { accounts })
}
