//! Account lookup by configured code, cached per tenant.

use std::collections::HashMap;
use std::sync::RwLock;

use orderbridge_accounting::{Account, AccountingClient, Filter, cache_key};

use crate::error::{Stage, SyncError};

#[derive(Debug)]
pub struct AccountDirectory<C> {
    client: C,
    cache: RwLock<HashMap<String, Account>>,
}

impl<C> AccountDirectory<C>
where
    C: AccountingClient,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Remote account carrying `code`.
    ///
    /// Hits are cached for the lifetime of the directory; misses are not.
    pub fn account_by_code(&self, code: &str) -> Result<Account, SyncError> {
        let key = cache_key(self.client.tenant_id(), &format!("account:{code}"));

        if let Ok(cache) = self.cache.read() {
            if let Some(account) = cache.get(&key) {
                return Ok(account.clone());
            }
        }

        let found = self
            .client
            .find_account(&Filter::eq("Code", code))
            .map_err(|err| {
                tracing::error!(
                    message = %err.message,
                    code = err.code,
                    account_code = code,
                    "account lookup failed"
                );
                SyncError::remote(Stage::Account, err)
            })?;

        let account = found.ok_or_else(|| {
            tracing::error!(account_code = code, "no account with configured code");
            SyncError::AccountNotFound {
                code: code.to_string(),
            }
        })?;

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, account.clone());
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use orderbridge_accounting::{InMemoryAccounting, Operation, RemoteError};

    #[test]
    fn finds_account_by_code_and_caches_it() {
        let client = Arc::new(InMemoryAccounting::new().with_account(Account::new("090", "Bank")));
        let directory = AccountDirectory::new(Arc::clone(&client));

        let first = directory.account_by_code("090").unwrap();
        let second = directory.account_by_code("090").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, "Bank");
        assert_eq!(client.call_count(Operation::FindAccount), 1);
    }

    #[test]
    fn missing_code_is_not_found_and_not_cached() {
        let client = Arc::new(InMemoryAccounting::new());
        let directory = AccountDirectory::new(Arc::clone(&client));

        for _ in 0..2 {
            let err = directory.account_by_code("999").unwrap_err();
            assert!(matches!(err, SyncError::AccountNotFound { ref code } if code == "999"));
        }
        assert_eq!(client.call_count(Operation::FindAccount), 2);
    }

    #[test]
    fn remote_failure_is_an_account_stage_error() {
        let client = Arc::new(InMemoryAccounting::new());
        client.fail_on(Operation::FindAccount, RemoteError::new("rate limited", 429));
        let directory = AccountDirectory::new(Arc::clone(&client));

        let err = directory.account_by_code("090").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Account));
        assert_eq!(err.remote_code(), Some(429));
    }
}
