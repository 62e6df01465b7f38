use chrono::{Datelike, Local, Months, NaiveDate};

use super::types::{Affordability, EmiResult, EmiType, LoanInputs, ScheduleRow};

/// Largest share of monthly salary an EMI may take and still count as affordable.
pub const AFFORDABLE_EMI_SHARE: f64 = 0.4;
pub const LOW_SALARY_THRESHOLD: f64 = 30_000.0;

const BALANCE_SNAP_ABS: f64 = 1e-6;
const BALANCE_SNAP_REL: f64 = 1e-9;

pub fn compute_amortization(inputs: &LoanInputs) -> EmiResult {
    let start = inputs
        .start_date
        .unwrap_or_else(|| Local::now().date_naive());
    compute_amortization_from(inputs, start)
}

/// Same as [`compute_amortization`] with the schedule anchored at `start` even when
/// the inputs carry no start date.
pub fn compute_amortization_from(inputs: &LoanInputs, start: NaiveDate) -> EmiResult {
    let principal = inputs.principal();
    let tenure = inputs.tenure_months as f64;
    let rate = monthly_rate(inputs);

    let (monthly_emi, total_interest) = match inputs.emi_type {
        EmiType::Reducing => {
            let emi = reducing_emi(principal, rate, inputs.tenure_months);
            (emi, emi * tenure - principal)
        }
        EmiType::Flat => {
            let interest = flat_total_interest(
                principal,
                inputs.effective_rate_percent(),
                inputs.tenure_months,
            );
            ((principal + interest) / tenure, interest)
        }
    };

    let schedule = build_schedule(
        principal,
        rate,
        monthly_emi,
        inputs.tenure_months,
        inputs.start_date.unwrap_or(start),
    );

    EmiResult {
        principal,
        monthly_emi,
        total_interest,
        total_processing_fee: inputs.processing_fee,
        total_amount: monthly_emi * tenure + inputs.down_payment + inputs.processing_fee,
        schedule,
    }
}

pub fn monthly_rate(inputs: &LoanInputs) -> f64 {
    inputs.effective_rate_percent() / 100.0 / 12.0
}

pub(crate) fn reducing_emi(principal: f64, monthly_rate: f64, tenure_months: u32) -> f64 {
    let growth_minus_one = compound_growth_minus_one(monthly_rate, tenure_months);
    if monthly_rate == 0.0 || growth_minus_one == 0.0 {
        return principal / tenure_months as f64;
    }
    principal * monthly_rate * (growth_minus_one + 1.0) / growth_minus_one
}

/// `(1 + r)^n - 1` without the cancellation `powi` suffers once `r` is tiny.
pub(crate) fn compound_growth_minus_one(monthly_rate: f64, tenure_months: u32) -> f64 {
    (tenure_months as f64 * monthly_rate.ln_1p()).exp_m1()
}

pub(crate) fn flat_total_interest(
    principal: f64,
    annual_rate_percent: f64,
    tenure_months: u32,
) -> f64 {
    principal * (annual_rate_percent / 100.0) * (tenure_months as f64 / 12.0)
}

fn build_schedule(
    principal: f64,
    monthly_rate: f64,
    emi: f64,
    tenure_months: u32,
    start: NaiveDate,
) -> Vec<ScheduleRow> {
    let snap = (principal.abs() * BALANCE_SNAP_REL).max(BALANCE_SNAP_ABS);
    let first_month = start.with_day(1).unwrap_or(start);

    let mut schedule = Vec::with_capacity(tenure_months as usize);
    let mut balance = principal;
    for period in 0..tenure_months {
        if balance <= 0.0 {
            break;
        }
        let interest = balance * monthly_rate;
        let principal_paid = emi - interest;
        balance -= principal_paid;
        if balance < snap {
            balance = 0.0;
        }
        schedule.push(ScheduleRow {
            period: period + 1,
            month: month_label(first_month, period),
            emi,
            principal: principal_paid,
            interest,
            balance,
        });
    }
    schedule
}

fn month_label(first_month: NaiveDate, offset: u32) -> String {
    first_month
        .checked_add_months(Months::new(offset))
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_default()
}

pub fn assess_affordability(monthly_salary: f64, emi: f64) -> Affordability {
    let ratio = if monthly_salary > 0.0 {
        emi / monthly_salary
    } else {
        f64::INFINITY
    };
    Affordability {
        monthly_salary,
        emi,
        emi_to_salary_ratio: ratio,
        affordable: emi <= monthly_salary * AFFORDABLE_EMI_SHARE,
        low_salary: monthly_salary < LOW_SALARY_THRESHOLD,
    }
}
