use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{RecordStore, Storage};
use crate::engine::formulas;

/// Key of the single slot carrying the last withdrawal's raw inputs.
pub const LINKAGE_KEY: &str = "lastWithdrawalCalculation";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLinkage {
    withdrawal_request: f64,
    won_amount: f64,
}

/// The last withdrawal, as consumed by the distribution calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkedWithdrawal {
    pub withdrawal_request: f64,
    /// Derived from the stored won amount on every read.
    pub customer_withdrawal: f64,
}

impl<S: Storage> RecordStore<S> {
    /// Overwrite the linkage slot with a withdrawal's raw inputs.
    pub fn set_last_withdrawal(&mut self, withdrawal_request: f64, won_amount: f64) {
        let stored = StoredLinkage {
            withdrawal_request,
            won_amount,
        };
        let result = serde_json::to_string(&stored)
            .map_err(Into::into)
            .and_then(|raw| self.storage.write(LINKAGE_KEY, &raw));
        if let Err(e) = result {
            warn!(reason = %e, "last withdrawal not saved");
        }
    }

    /// Read the linkage slot, or `None` if no withdrawal was ever calculated.
    pub fn last_withdrawal(&self) -> Option<LinkedWithdrawal> {
        let raw = match self.storage.read(LINKAGE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(reason = %e, "last withdrawal unreadable");
                return None;
            }
        };

        match serde_json::from_str::<StoredLinkage>(&raw) {
            Ok(stored) => Some(LinkedWithdrawal {
                withdrawal_request: stored.withdrawal_request,
                customer_withdrawal: formulas::customer_withdrawal(stored.won_amount),
            }),
            Err(e) => {
                warn!(reason = %e, "last withdrawal corrupt");
                None
            }
        }
    }
}
