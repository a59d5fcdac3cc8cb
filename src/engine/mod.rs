//! Calculator engine.
//!
//! The engine validates calculator requests, computes their figures, renders
//! a report and records the result in the history. A withdrawal also
//! refreshes the linkage slot the distribution calculator reads from.
//! Also supports async stream of requests.

use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::model::{Calculation, Category, Request};
use crate::report::{Render, Report};
use crate::store::{MemoryStorage, RecordStore, Storage};

pub mod formulas;
pub mod validate;

mod error;
pub use error::{EngineError, ValidationError};

/// The calculator engine, recording into a [`RecordStore`].
pub struct Engine<S> {
    store: RecordStore<S>,
}

/// Public API
impl<S: Storage> Engine<S> {
    pub fn new(storage: S) -> Self {
        Self::with_store(RecordStore::new(storage))
    }

    pub fn with_store(store: RecordStore<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut RecordStore<S> {
        &mut self.store
    }

    pub fn into_store(self) -> RecordStore<S> {
        self.store
    }

    /// Run the engine over a request stream, handing every outcome to `on_outcome`.
    pub async fn run(
        &mut self,
        mut stream: impl Stream<Item = Request> + Unpin,
        mut on_outcome: impl FnMut(Result<Report, EngineError>),
    ) {
        while let Some(request) = stream.next().await {
            // a rejected request must not stop the batch
            on_outcome(self.apply(request));
        }
    }

    /// Apply a single calculator request.
    ///
    /// On error nothing is written to the history or the linkage slot. A
    /// report whose record could not be saved is still returned, with
    /// `record_id` unset.
    pub fn apply(&mut self, request: Request) -> Result<Report, EngineError> {
        let category = request.category();
        let result = self.calculate(request);
        Self::log_result(category, &result);
        result
    }
}

/// Private API
impl<S: Storage> Engine<S> {
    /// Small helper to log `apply` results
    fn log_result(category: Category, result: &Result<Report, EngineError>) {
        match result {
            Ok(Report {
                record_id: Some(id),
                ..
            }) => {
                info!(category = %category, id = %id, "{category} calculation applied");
            }
            Ok(Report { record_id: None, .. }) => {
                info!(category = %category, "{category} calculation applied but not recorded");
            }
            Err(e) => {
                info!(category = %category, reason = %e, "{category} calculation skipped");
            }
        }
    }

    fn calculate(&mut self, request: Request) -> Result<Report, EngineError> {
        match request {
            Request::Xrp {
                balance,
                xrp_sent,
                usdt_after_sale,
            } => {
                let balance = validate::require_numeric("balance", balance)?;
                let xrp_sent = validate::require_numeric("xrp sent", xrp_sent)?;
                let usdt_after_sale =
                    validate::require_numeric("usdt after sale", usdt_after_sale)?;

                let settlement = validate::require_representable(formulas::xrp_settlement(
                    balance,
                    xrp_sent,
                    usdt_after_sale,
                ))?;
                Ok(self.record(settlement))
            }
            Request::Deposit { amount } => {
                let amount = validate::require_positive("deposit amount", amount)?;
                let split = validate::require_representable(formulas::deposit_split(amount))?;
                Ok(self.record(split))
            }
            Request::Withdrawal { request, won } => {
                // both must be numbers before either is range checked
                validate::require_numeric("withdrawal request", request)?;
                validate::require_numeric("won amount", won)?;
                let request = validate::require_positive("withdrawal request", request)?;
                let won = validate::require_positive("won amount", won)?;

                let split =
                    validate::require_representable(formulas::withdrawal_split(request, won))?;
                self.store.set_last_withdrawal(request, won);
                Ok(self.record(split))
            }
            Request::Distribution { customers } => {
                let linked = self
                    .store
                    .last_withdrawal()
                    .ok_or(EngineError::LinkageMissing)?;

                let customers = validate::positive_customers(&customers);
                if customers.is_empty() {
                    return Err(ValidationError::NoCustomers.into());
                }

                let split = validate::require_representable(formulas::distribution_split(
                    linked,
                    &customers,
                ))?;
                Ok(self.record(split))
            }
        }
    }

    /// Render the report and append the record, both stamped with the same time.
    fn record<T: Calculation + Render>(&mut self, fields: T) -> Report {
        let date = self.store.now();
        let body = fields.report_body();
        let record_id = self.store.append_at(fields, date).map(|record| record.id);

        Report {
            category: T::CATEGORY,
            date,
            body,
            record_id,
        }
    }
}

impl Default for Engine<MemoryStorage> {
    fn default() -> Self {
        Self::new(MemoryStorage::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DepositSplit, DistributionSplit, MAX_CUSTOMERS, WithdrawalSplit, XrpSettlement,
    };
    use crate::store::{DEFAULT_LIST_LIMIT, LINKAGE_KEY};
    use chrono::{DateTime, Local, TimeZone};

    // test utils

    fn fixed_clock() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap()
    }

    fn engine() -> Engine<MemoryStorage> {
        Engine::with_store(RecordStore::with_clock(MemoryStorage::new(), fixed_clock))
    }

    fn xrp(balance: f64, xrp_sent: f64, usdt_after_sale: f64) -> Request {
        Request::Xrp {
            balance,
            xrp_sent,
            usdt_after_sale,
        }
    }

    fn deposit(amount: f64) -> Request {
        Request::Deposit { amount }
    }

    fn withdrawal(request: f64, won: f64) -> Request {
        Request::Withdrawal { request, won }
    }

    fn distribution(amounts: &[f64]) -> Request {
        let mut customers = [None; MAX_CUSTOMERS];
        for (slot, amount) in customers.iter_mut().zip(amounts) {
            *slot = Some(*amount);
        }
        Request::Distribution { customers }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distribution_overflowing_share_is_rejected() {
        let mut engine = engine();
        engine.apply(withdrawal(1e-300, 1e300)).unwrap();

        let result = engine.apply(distribution(&[1e300]));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::OutOfRange {
                category: Category::Distribution
            }))
        );
        assert!(
            engine
                .store()
                .list::<DistributionSplit>(DEFAULT_LIST_LIMIT)
                .is_empty()
        );
    }

    #[test]
    fn new_engine_has_empty_history() {
        let engine: Engine<MemoryStorage> = Engine::default();
        assert!(engine.store().list::<XrpSettlement>(DEFAULT_LIST_LIMIT).is_empty());
        assert_eq!(engine.store().last_withdrawal(), None);
    }

    // XRP

    #[test]
    fn xrp_records_settlement() {
        let mut engine = engine();
        let report = engine.apply(xrp(1000.0, 50.0, 1200.0)).unwrap();

        assert_eq!(report.category, Category::Xrp);
        assert_eq!(report.date, fixed_clock());
        assert!(report.body.contains("6. 선물사송금액: \"4-5\" = 196.00"));

        let records = engine.store().list::<XrpSettlement>(DEFAULT_LIST_LIMIT);
        assert_eq!(records.len(), 1);
        assert_eq!(Some(&records[0].id), report.record_id.as_ref());
        assert!(approx(records[0].fields.net_xrp_sale, 200.0));
        assert!(approx(records[0].fields.profit_2percent, 4.0));
        assert!(approx(records[0].fields.futures_transfer, 196.0));
    }

    #[test]
    fn xrp_rejects_non_numeric_and_records_nothing() {
        let mut engine = engine();

        let result = engine.apply(xrp(1000.0, f64::NAN, 1200.0));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::NotNumeric {
                field: "xrp sent"
            }))
        );
        assert!(engine.store().list::<XrpSettlement>(DEFAULT_LIST_LIMIT).is_empty());
    }

    #[test]
    fn xrp_overflowing_result_is_rejected() {
        let mut engine = engine();

        let result = engine.apply(xrp(-1e308, 0.0, 1e308));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::OutOfRange {
                category: Category::Xrp
            }))
        );
        assert!(engine.store().list::<XrpSettlement>(DEFAULT_LIST_LIMIT).is_empty());
    }

    #[test]
    fn xrp_accepts_zero_and_negative() {
        let mut engine = engine();
        engine.apply(xrp(0.0, -1.0, 0.0)).unwrap();
        assert_eq!(engine.store().list::<XrpSettlement>(DEFAULT_LIST_LIMIT).len(), 1);
    }

    // Deposit

    #[test]
    fn deposit_records_split() {
        let mut engine = engine();
        engine.apply(deposit(1_000_000.0)).unwrap();

        let records = engine.store().list::<DepositSplit>(DEFAULT_LIST_LIMIT);
        assert!(approx(records[0].fields.one_percent, 10_000.0));
        assert!(approx(records[0].fields.personal_corporate, 5000.0));
        assert!(approx(records[0].fields.bithumb_deposit, 990_000.0));
    }

    #[test]
    fn deposit_rejects_non_positive() {
        let mut engine = engine();

        for amount in [0.0, -10.0] {
            let result = engine.apply(deposit(amount));
            assert!(matches!(
                result,
                Err(EngineError::Validation(ValidationError::NotPositive { .. }))
            ));
        }
        assert!(matches!(
            engine.apply(deposit(f64::INFINITY)),
            Err(EngineError::Validation(ValidationError::NotNumeric { .. }))
        ));
        assert!(engine.store().list::<DepositSplit>(DEFAULT_LIST_LIMIT).is_empty());
    }

    // Withdrawal

    #[test]
    fn withdrawal_records_split_and_links() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();

        let records = engine.store().list::<WithdrawalSplit>(DEFAULT_LIST_LIMIT);
        assert!(approx(records[0].fields.bithumb_withdrawal, 9800.0));
        assert!(approx(records[0].fields.customer_withdrawal, 4950.0));

        let linked = engine.store().last_withdrawal().unwrap();
        assert_eq!(linked.withdrawal_request, 10_000.0);
        assert!(approx(linked.customer_withdrawal, 4950.0));
    }

    #[test]
    fn withdrawal_checks_numbers_before_range() {
        let mut engine = engine();

        let result = engine.apply(withdrawal(0.0, f64::NAN));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::NotNumeric {
                field: "won amount"
            }))
        );
    }

    #[test]
    fn rejected_withdrawal_keeps_previous_link() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();

        let result = engine.apply(withdrawal(500.0, 0.0));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::NotPositive {
                field: "won amount",
                value: 0.0
            }))
        );

        assert_eq!(
            engine.store().last_withdrawal().unwrap().withdrawal_request,
            10_000.0
        );
        assert_eq!(
            engine.store().list::<WithdrawalSplit>(DEFAULT_LIST_LIMIT).len(),
            1
        );
    }

    // Distribution

    #[test]
    fn distribution_without_withdrawal_fails() {
        let mut engine = engine();

        let result = engine.apply(distribution(&[2000.0]));
        assert_eq!(result, Err(EngineError::LinkageMissing));
        assert!(
            engine
                .store()
                .list::<DistributionSplit>(DEFAULT_LIST_LIMIT)
                .is_empty()
        );
    }

    #[test]
    fn distribution_follows_last_withdrawal() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();
        let report = engine.apply(distribution(&[2000.0, 3000.0])).unwrap();

        assert!(report.body.contains("고객1: 2,000.00 / 10,000.00 × 4,950 = 990\n"));
        assert!(report.body.contains("고객2: 3,000.00 / 10,000.00 × 4,950 = 1,485\n"));

        let records = engine.store().list::<DistributionSplit>(DEFAULT_LIST_LIMIT);
        let results: Vec<f64> = records[0].fields.customers.iter().map(|c| c.result).collect();
        assert_eq!(results.len(), 2);
        assert!(approx(results[0], 990.0));
        assert!(approx(results[1], 1485.0));
    }

    #[test]
    fn distribution_uses_newest_withdrawal() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();
        engine.apply(withdrawal(1000.0, 1000.0)).unwrap();
        engine.apply(distribution(&[500.0])).unwrap();

        let records = engine.store().list::<DistributionSplit>(DEFAULT_LIST_LIMIT);
        let share = records[0].fields.customers.iter().next().unwrap();
        assert!(approx(share.result, 495.0));
    }

    #[test]
    fn distribution_skips_unusable_slots() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();

        let request = Request::Distribution {
            customers: [None, Some(-5.0), Some(1000.0), Some(f64::NAN), None],
        };
        engine.apply(request).unwrap();

        let records = engine.store().list::<DistributionSplit>(DEFAULT_LIST_LIMIT);
        let numbers: Vec<u8> = records[0].fields.customers.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![3]);
    }

    #[test]
    fn distribution_without_customers_fails() {
        let mut engine = engine();
        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();

        let result = engine.apply(distribution(&[0.0, -1.0]));
        assert_eq!(
            result,
            Err(EngineError::Validation(ValidationError::NoCustomers))
        );
        assert!(
            engine
                .store()
                .list::<DistributionSplit>(DEFAULT_LIST_LIMIT)
                .is_empty()
        );
    }

    // Storage failures

    #[test]
    fn storage_failure_still_returns_report() {
        let mut engine = Engine::with_store(RecordStore::with_clock(
            MemoryStorage::with_quota(10),
            fixed_clock,
        ));

        let report = engine.apply(deposit(1000.0)).unwrap();
        assert!(!report.is_recorded());
        assert!(report.body.contains("4. 빗썸입금액: \"1-2\" = 990"));
    }

    #[test]
    fn linkage_write_failure_leaves_slot_empty() {
        let mut engine = Engine::with_store(RecordStore::with_clock(
            MemoryStorage::with_quota(10),
            fixed_clock,
        ));

        engine.apply(withdrawal(10_000.0, 5000.0)).unwrap();
        assert_eq!(engine.store().storage().get(LINKAGE_KEY), None);
        assert_eq!(
            engine.apply(distribution(&[1.0])),
            Err(EngineError::LinkageMissing)
        );
    }

    //  Async run()

    #[tokio::test]
    async fn run_processes_all_requests() {
        let mut engine = engine();
        let requests = vec![
            xrp(1000.0, 50.0, 1200.0),
            deposit(1000.0),
            withdrawal(10_000.0, 5000.0),
            distribution(&[2000.0, 3000.0]),
        ];

        let mut categories = Vec::new();
        engine
            .run(tokio_stream::iter(requests), |outcome| {
                categories.push(outcome.unwrap().category)
            })
            .await;

        assert_eq!(categories, Category::ALL.to_vec());
    }

    #[tokio::test]
    async fn run_continues_after_rejected_request() {
        let mut engine = engine();
        let requests = vec![
            distribution(&[100.0]), // no withdrawal yet
            deposit(0.0),           // not positive
            deposit(50.0),
        ];

        let mut outcomes = Vec::new();
        engine
            .run(tokio_stream::iter(requests), |outcome| outcomes.push(outcome))
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], Err(EngineError::LinkageMissing));
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());
        assert_eq!(engine.store().list::<DepositSplit>(DEFAULT_LIST_LIMIT).len(), 1);
    }
}
