//! Pure calculator formulas. Inputs are validated before they get here.

use crate::model::{
    CustomerShare, CustomerShares, DepositSplit, DistributionSplit, WithdrawalSplit,
    XrpSettlement,
};
use crate::store::LinkedWithdrawal;

/// Profit kept from a net XRP sale.
pub const XRP_PROFIT_RATE: f64 = 0.02;
/// Fee taken from a deposit.
pub const DEPOSIT_FEE_RATE: f64 = 0.01;
/// Each of the personal and corporate halves of the deposit fee.
pub const PERSONAL_CORPORATE_RATE: f64 = 0.005;
/// Fee taken from a withdrawal request.
pub const WITHDRAWAL_FEE_RATE: f64 = 0.02;
/// Fee taken from the won amount after buy-back.
pub const WON_FEE_RATE: f64 = 0.01;

pub fn xrp_settlement(balance: f64, xrp_sent: f64, usdt_after_sale: f64) -> XrpSettlement {
    let net_xrp_sale = usdt_after_sale - balance;
    let profit_2percent = net_xrp_sale * XRP_PROFIT_RATE;
    XrpSettlement {
        balance,
        xrp_sent,
        usdt_after_sale,
        net_xrp_sale,
        profit_2percent,
        futures_transfer: net_xrp_sale - profit_2percent,
    }
}

pub fn deposit_split(deposit_amount: f64) -> DepositSplit {
    let one_percent = deposit_amount * DEPOSIT_FEE_RATE;
    DepositSplit {
        deposit_amount,
        one_percent,
        personal_corporate: deposit_amount * PERSONAL_CORPORATE_RATE,
        bithumb_deposit: deposit_amount - one_percent,
    }
}

pub fn withdrawal_split(withdrawal_request: f64, won_amount: f64) -> WithdrawalSplit {
    let two_percent = withdrawal_request * WITHDRAWAL_FEE_RATE;
    WithdrawalSplit {
        withdrawal_request,
        two_percent,
        bithumb_withdrawal: withdrawal_request - two_percent,
        won_amount,
        one_percent: won_amount * WON_FEE_RATE,
        customer_withdrawal: customer_withdrawal(won_amount),
    }
}

/// What the customers receive out of the won amount.
pub fn customer_withdrawal(won_amount: f64) -> f64 {
    won_amount - won_amount * WON_FEE_RATE
}

/// A customer's portion of the linked withdrawal.
///
/// Proportional to the original withdrawal request, not to the sum of the
/// customer amounts, so shares only add up to the customer withdrawal when
/// the amounts add up to the request.
pub fn customer_share(amount: f64, linked: LinkedWithdrawal) -> f64 {
    (amount / linked.withdrawal_request) * linked.customer_withdrawal
}

/// `customers` pairs a 1-based slot number with the amount entered there.
pub fn distribution_split(linked: LinkedWithdrawal, customers: &[(u8, f64)]) -> DistributionSplit {
    let shares = customers
        .iter()
        .map(|&(number, amount)| CustomerShare {
            number,
            amount,
            result: customer_share(amount, linked),
        })
        .collect();

    DistributionSplit {
        withdrawal_request: linked.withdrawal_request,
        customer_withdrawal: linked.customer_withdrawal,
        customers: CustomerShares::new(shares),
    }
}
