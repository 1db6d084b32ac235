//! Credit line and the monthly repayment state machine.

use serde::{Deserialize, Serialize};

use crate::error::FarmError;

pub const MAX_CREDIT_SCORE: u32 = 100;

const LOAN_FLOOR: f64 = 1_000.0;
const LOAN_SPAN: f64 = 49_000.0;
const BORROW_PENALTY: u32 = 5;
const ON_TIME_BONUS: u32 = 2;
const PARTIAL_PENALTY: u32 = 10;
const OVERDUE_PENALTY: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepaymentOutcome {
    NoDebt,
    PaidFull { amount: f64 },
    PaidPartial { paid: f64, penalty: f64 },
    Overdue { penalty: f64 },
}

impl RepaymentOutcome {
    /// Cash that left the farm's funds.
    pub fn paid(&self) -> f64 {
        match self {
            RepaymentOutcome::PaidFull { amount } => *amount,
            RepaymentOutcome::PaidPartial { paid, .. } => *paid,
            RepaymentOutcome::NoDebt | RepaymentOutcome::Overdue { .. } => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAccount {
    pub total_debt: f64,
    pub credit_score: u32,
    pub base_monthly_payment: f64,
    pub overdue_interest_rate: f64,
    /// Day of the month on which the installment is settled.
    pub repayment_day: u32,
}

impl Default for LoanAccount {
    fn default() -> Self {
        Self {
            total_debt: 30_000.0,
            credit_score: MAX_CREDIT_SCORE,
            base_monthly_payment: 3_000.0,
            overdue_interest_rate: 0.05,
            repayment_day: 28,
        }
    }
}

impl LoanAccount {
    /// Credit line: 1 000 at score 0 rising linearly to 50 000 at 100.
    pub fn max_loan_amount(&self) -> f64 {
        LOAN_FLOOR + (self.credit_score.min(MAX_CREDIT_SCORE) as f64 / 100.0) * LOAN_SPAN
    }

    pub fn due_amount(&self) -> f64 {
        self.base_monthly_payment.min(self.total_debt).max(0.0)
    }

    pub fn borrow(&mut self, amount: f64) -> Result<(), FarmError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(FarmError::InvalidAmount(amount));
        }
        let limit = self.max_loan_amount();
        if amount > limit {
            return Err(FarmError::CreditLimitExceeded {
                requested: amount,
                limit,
            });
        }
        self.total_debt += amount;
        self.credit_score = self.credit_score.saturating_sub(BORROW_PENALTY);
        Ok(())
    }

    /// Settles this month's installment from `funds_available`.
    ///
    /// Whatever part of the due amount is left unpaid accrues the overdue
    /// rate onto the debt. Negative funds count as nothing available.
    pub fn repay(&mut self, funds_available: f64) -> RepaymentOutcome {
        if self.total_debt <= 0.0 {
            return RepaymentOutcome::NoDebt;
        }
        let due = self.due_amount();
        let funds = funds_available.max(0.0);

        if funds >= due {
            self.total_debt -= due;
            self.credit_score = (self.credit_score + ON_TIME_BONUS).min(MAX_CREDIT_SCORE);
            RepaymentOutcome::PaidFull { amount: due }
        } else if funds > 0.0 {
            let penalty = (due - funds) * self.overdue_interest_rate;
            self.total_debt += penalty - funds;
            self.credit_score = self.credit_score.saturating_sub(PARTIAL_PENALTY);
            RepaymentOutcome::PaidPartial {
                paid: funds,
                penalty,
            }
        } else {
            let penalty = due * self.overdue_interest_rate;
            self.total_debt += penalty;
            self.credit_score = self.credit_score.saturating_sub(OVERDUE_PENALTY);
            RepaymentOutcome::Overdue { penalty }
        }
    }
}
