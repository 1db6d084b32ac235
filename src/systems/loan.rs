use anyhow::Result;
use chrono::Datelike;
use tracing::{info, warn};

use crate::{
    engine::{FarmEvent, System, SystemContext},
    farm::Farm,
    loan::RepaymentOutcome,
    rng::SystemRng,
};

/// Settles the monthly installment on the account's repayment day.
pub struct LoanSystem;

impl LoanSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoanSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LoanSystem {
    fn name(&self) -> &str {
        "loan"
    }

    fn run(
        &mut self,
        ctx: &mut SystemContext<'_>,
        farm: &mut Farm,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !ctx.day_started || farm.weather.now().day() != farm.loan.repayment_day {
            return Ok(());
        }
        let outcome = farm.repay_due()?;
        match outcome {
            RepaymentOutcome::NoDebt | RepaymentOutcome::PaidFull { .. } => info!(
                ?outcome,
                debt = farm.loan.total_debt,
                credit_score = farm.loan.credit_score,
                "loan settled"
            ),
            RepaymentOutcome::PaidPartial { .. } | RepaymentOutcome::Overdue { .. } => warn!(
                ?outcome,
                debt = farm.loan.total_debt,
                credit_score = farm.loan.credit_score,
                "loan payment missed"
            ),
        }
        ctx.emit(FarmEvent::LoanSettled { outcome });
        Ok(())
    }
}
