//! Core domain types for the calculators and their stored records.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of customer slots offered by the distribution calculator.
pub const MAX_CUSTOMERS: usize = 5;

/// One of the four calculators, each with its own record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Xrp,
    Deposit,
    Withdrawal,
    Distribution,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Xrp,
        Category::Deposit,
        Category::Withdrawal,
        Category::Distribution,
    ];

    /// Key of the JSON array holding this category's records.
    pub fn storage_key(self) -> &'static str {
        match self {
            Category::Xrp => "xrp_calculations",
            Category::Deposit => "deposit_calculations",
            Category::Withdrawal => "withdrawal_calculations",
            Category::Distribution => "distribution_calculations",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Xrp => "xrp",
            Category::Deposit => "deposit",
            Category::Withdrawal => "withdrawal",
            Category::Distribution => "distribution",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A calculator request, the possible inputs of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Settle an XRP transfer sold for USDT.
    Xrp {
        balance: f64,
        xrp_sent: f64,
        usdt_after_sale: f64,
    },
    /// Split the fees off a won deposit.
    Deposit { amount: f64 },
    /// Split the fees off a withdrawal; also refreshes the linkage slot.
    Withdrawal { request: f64, won: f64 },
    /// Share the last withdrawal between customers. `None` marks an empty or unreadable slot.
    Distribution {
        customers: [Option<f64>; MAX_CUSTOMERS],
    },
}

impl Request {
    pub fn category(&self) -> Category {
        match self {
            Request::Xrp { .. } => Category::Xrp,
            Request::Deposit { .. } => Category::Deposit,
            Request::Withdrawal { .. } => Category::Withdrawal,
            Request::Distribution { .. } => Category::Distribution,
        }
    }
}

/// Fields persisted for one category. The store is typed over this trait.
pub trait Calculation: Serialize + DeserializeOwned {
    const CATEGORY: Category;

    /// Every number the record holds, inputs included.
    fn figures(&self) -> Vec<f64>;
}

/// A stored calculation: generated identity and timestamps plus the category fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    /// Local wall-clock time of the calculation, `YYYY-MM-DD HH:MM:SS`.
    pub calculation_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XrpSettlement {
    pub balance: f64,
    pub xrp_sent: f64,
    pub usdt_after_sale: f64,
    pub net_xrp_sale: f64,
    pub profit_2percent: f64,
    pub futures_transfer: f64,
}

impl Calculation for XrpSettlement {
    const CATEGORY: Category = Category::Xrp;

    fn figures(&self) -> Vec<f64> {
        vec![
            self.balance,
            self.xrp_sent,
            self.usdt_after_sale,
            self.net_xrp_sale,
            self.profit_2percent,
            self.futures_transfer,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositSplit {
    pub deposit_amount: f64,
    pub one_percent: f64,
    pub personal_corporate: f64,
    pub bithumb_deposit: f64,
}

impl Calculation for DepositSplit {
    const CATEGORY: Category = Category::Deposit;

    fn figures(&self) -> Vec<f64> {
        vec![
            self.deposit_amount,
            self.one_percent,
            self.personal_corporate,
            self.bithumb_deposit,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalSplit {
    pub withdrawal_request: f64,
    pub two_percent: f64,
    pub bithumb_withdrawal: f64,
    pub won_amount: f64,
    pub one_percent: f64,
    pub customer_withdrawal: f64,
}

impl Calculation for WithdrawalSplit {
    const CATEGORY: Category = Category::Withdrawal;

    fn figures(&self) -> Vec<f64> {
        vec![
            self.withdrawal_request,
            self.two_percent,
            self.bithumb_withdrawal,
            self.won_amount,
            self.one_percent,
            self.customer_withdrawal,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSplit {
    pub withdrawal_request: f64,
    pub customer_withdrawal: f64,
    #[serde(flatten)]
    pub customers: CustomerShares,
}

impl Calculation for DistributionSplit {
    const CATEGORY: Category = Category::Distribution;

    fn figures(&self) -> Vec<f64> {
        let shares = self
            .customers
            .iter()
            .flat_map(|share| [share.amount, share.result]);
        [self.withdrawal_request, self.customer_withdrawal]
            .into_iter()
            .chain(shares)
            .collect()
    }
}

/// One customer's portion of a distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerShare {
    /// 1-based slot the amount was entered in.
    pub number: u8,
    pub amount: f64,
    pub result: f64,
}

/// Customer shares, persisted as flat `customerN_amount` / `customerN_result` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerShares(Vec<CustomerShare>);

impl CustomerShares {
    pub fn new(shares: Vec<CustomerShare>) -> Self {
        CustomerShares(shares)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerShare> + '_ {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CustomerShares {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len() * 2))?;
        for share in &self.0 {
            map.serialize_entry(&format!("customer{}_amount", share.number), &share.amount)?;
            map.serialize_entry(&format!("customer{}_result", share.number), &share.result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CustomerShares {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

        let shares = (1..=MAX_CUSTOMERS as u8)
            .filter_map(|number| {
                let amount = raw
                    .get(&format!("customer{number}_amount"))?
                    .as_f64()
                    .filter(|amount| *amount != 0.0)?;
                let result = raw
                    .get(&format!("customer{number}_result"))
                    .and_then(serde_json::Value::as_f64)
                    .unwrap_or_default();
                Some(CustomerShare {
                    number,
                    amount,
                    result,
                })
            })
            .collect();

        Ok(CustomerShares(shares))
    }
}
