use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::TodoListId;

/// One async mutex per todo list.
///
/// Writers that read a list's tasks and then write positions back hold the
/// list's guard for the whole read-validate-write sequence, so two such
/// sequences on the same list never interleave inside this process.
#[derive(Debug, Clone, Default)]
pub struct ListLocks {
    inner: Arc<Mutex<HashMap<TodoListId, Arc<AsyncMutex<()>>>>>,
}

impl ListLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, todo_list_id: TodoListId) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Drop entries nobody is holding or waiting on
            locks.retain(|id, m| *id == todo_list_id || Arc::strong_count(m) > 1);
            locks.entry(todo_list_id).or_default().clone()
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
