//! Text reports shown after a calculation and copied out of the history.

use std::fmt;

use chrono::{DateTime, Local};

use crate::amount::{Amount, Won};
use crate::model::{Category, DepositSplit, DistributionSplit, WithdrawalSplit, XrpSettlement};

const REPORT_DATE_FORMAT: &str = "%Y년 %m월 %d일";

/// The outcome of one successful calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub category: Category,
    pub date: DateTime<Local>,
    /// Numbered report lines, without the date header.
    pub body: String,
    /// Id of the stored record, `None` if saving failed.
    pub record_id: Option<String>,
}

impl Report {
    pub fn is_recorded(&self) -> bool {
        self.record_id.is_some()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[작성일: {}]\n\n{}",
            self.date.format(REPORT_DATE_FORMAT),
            self.body
        )
    }
}

/// Text renderings of a calculation's fields.
pub trait Render {
    /// Report lines with the formula behind each derived figure.
    fn report_body(&self) -> String;

    /// The same lines without formulas, as exported from the history.
    fn copy_text(&self) -> String;
}

impl Render for XrpSettlement {
    fn report_body(&self) -> String {
        format!(
            "1. 기존바이낸스잔액: {}\n\
             2. xrp 전송: {}\n\
             3. 바이낸스에서 xrp매도후 테더금액: {}\n\
             4. 순xrp매도액: \"3-1\" = {}\n\
             5. 2%수익: \"4\"×2% = {}\n\
             6. 선물사송금액: \"4-5\" = {}",
            Amount::from_float(self.balance),
            Amount::from_float(self.xrp_sent),
            Amount::from_float(self.usdt_after_sale),
            Amount::from_float(self.net_xrp_sale),
            Amount::from_float(self.profit_2percent),
            Amount::from_float(self.futures_transfer),
        )
    }

    fn copy_text(&self) -> String {
        format!(
            "1. 기존바이낸스잔액: {}\n\
             2. xrp 전송: {}\n\
             3. 바이낸스에서 xrp매도후 테더금액: {}\n\
             4. 순xrp매도액: {}\n\
             5. 2%수익: {}\n\
             6. 선물사송금액: {}",
            Amount::from_float(self.balance),
            Amount::from_float(self.xrp_sent),
            Amount::from_float(self.usdt_after_sale),
            Amount::from_float(self.net_xrp_sale),
            Amount::from_float(self.profit_2percent),
            Amount::from_float(self.futures_transfer),
        )
    }
}

impl Render for DepositSplit {
    fn report_body(&self) -> String {
        format!(
            "1. 오늘입금액: {}\n\
             2. 1%: {}\n\
             3. 개인 법인(각0.5%씩): {}\n\
             4. 빗썸입금액: \"1-2\" = {}",
            Won::from_float(self.deposit_amount),
            Won::from_float(self.one_percent),
            Won::from_float(self.personal_corporate),
            Won::from_float(self.bithumb_deposit),
        )
    }

    fn copy_text(&self) -> String {
        format!(
            "1. 오늘입금액: {}\n\
             2. 1%: {}\n\
             3. 개인 법인(각0.5%씩): {}\n\
             4. 빗썸입금액: {}",
            Won::from_float(self.deposit_amount),
            Won::from_float(self.one_percent),
            Won::from_float(self.personal_corporate),
            Won::from_float(self.bithumb_deposit),
        )
    }
}

impl Render for WithdrawalSplit {
    fn report_body(&self) -> String {
        format!(
            "1. 출금요청액: {}\n\
             2. 2%수익: \"1\"× 2% = {}\n\
             3. 빗썸 출금금액: \"1\" - \"2\" = {}\n\
             4. 환매후 원화금액: {}\n\
             5. 1%수익: \"4\" × 1% = {}\n\
             6. 고객 출금금액: \"4\" - \"5\" = {}",
            Amount::from_float(self.withdrawal_request),
            Amount::from_float(self.two_percent),
            Amount::from_float(self.bithumb_withdrawal),
            Won::from_float(self.won_amount),
            Won::from_float(self.one_percent),
            Won::from_float(self.customer_withdrawal),
        )
    }

    fn copy_text(&self) -> String {
        format!(
            "1. 출금요청액: {}\n\
             2. 2%수익: {}\n\
             3. 빗썸 출금금액: {}\n\
             4. 환매후 원화금액: {}\n\
             5. 1%수익: {}\n\
             6. 고객 출금금액: {}",
            Amount::from_float(self.withdrawal_request),
            Amount::from_float(self.two_percent),
            Amount::from_float(self.bithumb_withdrawal),
            Won::from_float(self.won_amount),
            Won::from_float(self.one_percent),
            Won::from_float(self.customer_withdrawal),
        )
    }
}

impl Render for DistributionSplit {
    fn report_body(&self) -> String {
        // the report and the copy text share the same lines
        self.copy_text()
    }

    fn copy_text(&self) -> String {
        let request = Amount::from_float(self.withdrawal_request);
        let total = Won::from_float(self.customer_withdrawal);

        let mut text = format!("출금 요청액: {request}\n고객 출금금액: {total}\n\n");
        for share in self.customers.iter() {
            text.push_str(&format!(
                "고객{}: {} / {request} × {total} = {}\n",
                share.number,
                Amount::from_float(share.amount),
                Won::from_float(share.result),
            ));
        }
        text
    }
}
