use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::StatusCheck;
use crate::store::Store;

/// Log of client check-ins.
#[derive(Clone)]
pub struct StatusLedger {
    store: Arc<dyn Store>,
    list_limit: u32,
}

impl StatusLedger {
    pub fn new(store: Arc<dyn Store>, list_limit: u32) -> Self {
        Self { store, list_limit }
    }

    pub async fn record(&self, client_name: &str) -> Result<StatusCheck> {
        // ---
        let check = StatusCheck {
            id: Uuid::new_v4(),
            client_name: client_name.to_string(),
            timestamp: Utc::now(),
        };
        self.store.insert_status_check(&check).await?;
        tracing::debug!(check_id = %check.id, client_name, "status check recorded");
        Ok(check)
    }

    pub async fn list(&self) -> Result<Vec<StatusCheck>> {
        Ok(self.store.list_status_checks(self.list_limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::testing::ledgers;

    #[tokio::test]
    async fn test_record_and_list() {
        // ---
        let l = ledgers();
        let a = l.status.record("dashboard").await.unwrap();
        let b = l.status.record("cli").await.unwrap();

        let ids: Vec<_> = l.status.list().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id) && ids.contains(&b.id));
    }
}
