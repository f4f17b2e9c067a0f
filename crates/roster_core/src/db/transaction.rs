//! Request-scoped transaction helper.
//!
//! # Invariants
//! - The closure's `Ok` commits; any `Err` rolls the whole scope back.
//! - Nothing executed inside the scope is visible to other connections
//!   before commit.

use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `op` inside one transaction on `conn`.
///
/// Repositories constructed from the `&Transaction` handed to `op` execute
/// inside the scope. `TransactionBehavior::Immediate` takes the write lock up
/// front; `Deferred` takes it on the first write (or locked read).
///
/// # Errors
/// - Returns the closure error unchanged after rolling back.
/// - Returns begin/commit failures converted through `From<rusqlite::Error>`.
pub fn with_transaction<T, E, F>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    op: F,
) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    match op(&tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("event=tx_end module=db status=ok outcome=commit");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx_end module=db status=error outcome=rollback_failed error={rollback_err}"
                );
            } else {
                debug!("event=tx_end module=db status=ok outcome=rollback");
            }
            Err(err)
        }
    }
}
