//! Raw calculator forms and their validation.
//!
//! A form holds whatever the caller supplied (query string, JSON body, CLI flags or the
//! persisted store), every field optional. Building a request fills defaults, checks
//! every field and either hands back engine inputs or the full field → message map.
//! Engines are never invoked on a form that failed validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{
    AFFORDABLE_EMI_SHARE, BASIC_SHARE_OF_CTC, BankPreset, CityType, DEFAULT_HRA_SHARE_OF_BASIC,
    EmiType, LoanInputs, LoanProduct, MIN_CTC, SalaryInputs, TaxRegime, TenureUnit,
};
use crate::errors::FieldErrors;

pub const MAX_TENURE_MONTHS: f64 = 360.0;
pub const DEFAULT_TENURE: f64 = 12.0;
pub const DEFAULT_MONTHLY_SALARY: f64 = 25_000.0;
pub const DEFAULT_DESIRED_EMI: f64 = 5_000.0;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoanForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<LoanProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<BankPreset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenure_unit: Option<TenureUnit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emi_type: Option<EmiType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_cost_emi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_emi: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SalaryForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<CityType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hra: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonus: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical: Option<f64>,
    #[serde(rename = "investment80C", skip_serializing_if = "Option::is_none")]
    pub investment_80c: Option<f64>,
    #[serde(rename = "investment80D", skip_serializing_if = "Option::is_none")]
    pub investment_80d: Option<f64>,
    #[serde(rename = "investmentNPS", skip_serializing_if = "Option::is_none")]
    pub investment_nps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_regime: Option<TaxRegime>,
}

/// Monthly salary and the EMI the borrower wants to pay, carried by salary-based
/// requests and optionally by any other product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryCheck {
    pub monthly_salary: f64,
    pub desired_emi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub product: LoanProduct,
    pub product_name: String,
    pub bank: BankPreset,
    /// Tenure as entered, in `tenure_unit`.
    pub tenure: f64,
    pub tenure_unit: TenureUnit,
    pub inputs: LoanInputs,
    pub salary_check: Option<SalaryCheck>,
}

pub fn build_loan_request(form: LoanForm) -> Result<LoanRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    let product = form.product.unwrap_or_default();
    let is_salary = product == LoanProduct::Salary;

    let product_name = form
        .product_name
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| product.default_name().to_string());
    if product_name.is_empty() && !is_salary {
        errors.insert("productName", "Required");
    }

    let loan_amount = form.loan_amount.unwrap_or(0.0);
    let loan_amount_valid = loan_amount.is_finite() && loan_amount > 0.0;
    if !loan_amount_valid {
        errors.insert("loanAmount", "Valid amount required");
    }

    let down_payment = if is_salary {
        0.0
    } else {
        form.down_payment.unwrap_or(0.0)
    };
    if !down_payment.is_finite()
        || down_payment < 0.0
        || (loan_amount_valid && down_payment >= loan_amount)
    {
        errors.insert("downPayment", "0 to loan amount");
    }

    let bank = form.bank.unwrap_or_default();
    let interest_rate = form
        .interest_rate
        .or(bank.rate_percent())
        .unwrap_or(product.default_rate_percent());
    if !(0.0..=100.0).contains(&interest_rate) {
        errors.insert("interestRate", "0-100%");
    }

    let tenure_unit = form.tenure_unit.unwrap_or_default();
    let tenure = form.tenure.unwrap_or(DEFAULT_TENURE);
    let tenure_months = tenure_unit.to_months(tenure).round();
    if !(1.0..=MAX_TENURE_MONTHS).contains(&tenure_months) {
        let range = match tenure_unit {
            TenureUnit::Months => "1-360 months",
            TenureUnit::Years => "1-30 years",
        };
        errors.insert("tenure", range);
    }

    let processing_fee = form.processing_fee.unwrap_or(0.0);
    if !processing_fee.is_finite() || processing_fee < 0.0 {
        errors.insert("processingFee", "Non-negative");
    }

    let start_date = match form.start_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.insert("startDate", "Use YYYY-MM-DD");
                None
            }
        },
    };

    let salary_check = if is_salary {
        let monthly_salary = form.salary.unwrap_or(DEFAULT_MONTHLY_SALARY);
        let desired_emi = form.desired_emi.unwrap_or(DEFAULT_DESIRED_EMI);
        if !monthly_salary.is_finite() || monthly_salary <= 0.0 {
            errors.insert("salary", "Valid salary required");
        }
        if !desired_emi.is_finite() || desired_emi <= 0.0 {
            errors.insert("desiredEmi", "Valid EMI required");
        }
        if desired_emi > monthly_salary * AFFORDABLE_EMI_SHARE {
            errors.insert("desiredEmi", "EMI exceeds 40% of salary");
        }
        Some(SalaryCheck {
            monthly_salary,
            desired_emi: Some(desired_emi),
        })
    } else {
        match form.salary {
            Some(monthly_salary) if monthly_salary.is_finite() && monthly_salary > 0.0 => {
                Some(SalaryCheck {
                    monthly_salary,
                    desired_emi: form.desired_emi,
                })
            }
            Some(_) => {
                errors.insert("salary", "Valid salary required");
                None
            }
            None => None,
        }
    };

    let inputs = LoanInputs {
        price: loan_amount,
        down_payment,
        annual_rate_percent: interest_rate,
        no_cost: form.no_cost_emi.unwrap_or(false),
        tenure_months: tenure_months.clamp(0.0, MAX_TENURE_MONTHS) as u32,
        emi_type: form.emi_type.unwrap_or_default(),
        start_date,
        processing_fee,
    };

    errors.into_result(LoanRequest {
        product,
        product_name,
        bank,
        tenure,
        tenure_unit,
        inputs,
        salary_check,
    })
}

pub fn build_salary_inputs(form: SalaryForm) -> Result<SalaryInputs, FieldErrors> {
    let mut errors = FieldErrors::new();

    let ctc = form.ctc.unwrap_or(0.0);
    if !ctc.is_finite() || ctc < MIN_CTC {
        errors.insert("ctc", "CTC must be at least ₹2,50,000.");
    }
    let basic = ctc * BASIC_SHARE_OF_CTC;

    let mut amount = |field: &'static str, value: Option<f64>, default: f64| {
        let value = value.unwrap_or(default);
        if !value.is_finite() || value < 0.0 {
            errors.insert(field, "Must be a non-negative amount");
        }
        value
    };
    let hra = amount("hra", form.hra, basic * DEFAULT_HRA_SHARE_OF_BASIC);
    let bonus = amount("bonus", form.bonus, 0.0);
    let lta = amount("lta", form.lta, 0.0);
    let medical = amount("medical", form.medical, 0.0);
    let investment_80c = amount("investment80C", form.investment_80c, 0.0);
    let investment_80d = amount("investment80D", form.investment_80d, 0.0);
    let investment_nps = amount("investmentNPS", form.investment_nps, 0.0);

    if !errors.contains("ctc") && hra + bonus + lta + medical > ctc - basic {
        errors.insert(
            "allowances",
            "HRA, bonus, LTA and medical together exceed CTC minus basic pay",
        );
    }

    errors.into_result(SalaryInputs {
        ctc,
        city: form.city.unwrap_or_default(),
        hra,
        bonus,
        lta,
        medical,
        investment_80c,
        investment_80d,
        investment_nps,
        tax_regime: form.tax_regime.unwrap_or_default(),
    })
}

/// Echo of resolved salary inputs as a form, the shape persisted between visits.
pub fn salary_form_from_inputs(inputs: &SalaryInputs) -> SalaryForm {
    SalaryForm {
        ctc: Some(inputs.ctc),
        city: Some(inputs.city),
        hra: Some(inputs.hra),
        bonus: Some(inputs.bonus),
        lta: Some(inputs.lta),
        medical: Some(inputs.medical),
        investment_80c: Some(inputs.investment_80c),
        investment_80d: Some(inputs.investment_80d),
        investment_nps: Some(inputs.investment_nps),
        tax_regime: Some(inputs.tax_regime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_loan_form() -> LoanForm {
        LoanForm {
            product_name: Some("Smartphone".to_string()),
            loan_amount: Some(60_000.0),
            interest_rate: Some(12.0),
            tenure: Some(12.0),
            ..LoanForm::default()
        }
    }

    fn sample_salary_form() -> SalaryForm {
        SalaryForm {
            ctc: Some(1_000_000.0),
            city: Some(CityType::Metro),
            hra: Some(200_000.0),
            bonus: Some(50_000.0),
            tax_regime: Some(TaxRegime::New),
            ..SalaryForm::default()
        }
    }

    #[test]
    fn build_loan_request_applies_defaults() {
        let request = build_loan_request(sample_loan_form()).expect("valid form");
        assert_eq!(request.product, LoanProduct::Product);
        assert_eq!(request.inputs.tenure_months, 12);
        assert_eq!(request.inputs.emi_type, EmiType::Reducing);
        assert_approx(request.inputs.down_payment, 0.0);
        assert_approx(request.inputs.processing_fee, 0.0);
        assert!(request.inputs.start_date.is_none());
        assert!(!request.inputs.no_cost);
        assert!(request.salary_check.is_none());
    }

    #[test]
    fn build_loan_request_converts_years_to_months() {
        let mut form = sample_loan_form();
        form.tenure = Some(2.5);
        form.tenure_unit = Some(TenureUnit::Years);
        let request = build_loan_request(form).expect("valid form");
        assert_eq!(request.inputs.tenure_months, 30);
        assert_approx(request.tenure, 2.5);
    }

    #[test]
    fn build_loan_request_reports_every_invalid_field() {
        let form = LoanForm {
            product_name: Some("   ".to_string()),
            loan_amount: Some(-5.0),
            interest_rate: Some(101.0),
            tenure: Some(31.0),
            tenure_unit: Some(TenureUnit::Years),
            processing_fee: Some(-1.0),
            start_date: Some("15/01/2025".to_string()),
            ..LoanForm::default()
        };
        let errors = build_loan_request(form).expect_err("must reject");
        assert_eq!(errors.get("productName"), Some("Required"));
        assert_eq!(errors.get("loanAmount"), Some("Valid amount required"));
        assert_eq!(errors.get("interestRate"), Some("0-100%"));
        assert_eq!(errors.get("tenure"), Some("1-30 years"));
        assert_eq!(errors.get("processingFee"), Some("Non-negative"));
        assert_eq!(errors.get("startDate"), Some("Use YYYY-MM-DD"));
    }

    #[test]
    fn build_loan_request_rejects_zero_tenure() {
        let mut form = sample_loan_form();
        form.tenure = Some(0.0);
        let errors = build_loan_request(form).expect_err("must reject");
        assert_eq!(errors.get("tenure"), Some("1-360 months"));
    }

    #[test]
    fn build_loan_request_rejects_down_payment_at_or_above_price() {
        let mut form = sample_loan_form();
        form.down_payment = Some(60_000.0);
        let errors = build_loan_request(form).expect_err("must reject");
        assert!(errors.contains("downPayment"));
    }

    #[test]
    fn bank_preset_supplies_rate_unless_rate_is_explicit() {
        let mut form = sample_loan_form();
        form.interest_rate = None;
        form.bank = Some(BankPreset::Pnb);
        let request = build_loan_request(form.clone()).expect("valid form");
        assert_approx(request.inputs.annual_rate_percent, 8.9);

        form.interest_rate = Some(10.5);
        let request = build_loan_request(form).expect("valid form");
        assert_approx(request.inputs.annual_rate_percent, 10.5);
    }

    #[test]
    fn product_default_rate_fills_missing_rate() {
        let form = LoanForm {
            product: Some(LoanProduct::Car),
            loan_amount: Some(800_000.0),
            ..LoanForm::default()
        };
        let request = build_loan_request(form).expect("valid form");
        assert_approx(request.inputs.annual_rate_percent, 7.0);
        assert_eq!(request.product_name, "Car Loan");
    }

    #[test]
    fn salary_product_forces_zero_down_payment_and_checks_share() {
        let form = LoanForm {
            product: Some(LoanProduct::Salary),
            loan_amount: Some(200_000.0),
            down_payment: Some(50_000.0),
            salary: Some(30_000.0),
            desired_emi: Some(15_000.0),
            ..LoanForm::default()
        };
        let errors = build_loan_request(form.clone()).expect_err("must reject");
        assert_eq!(errors.get("desiredEmi"), Some("EMI exceeds 40% of salary"));
        assert!(!errors.contains("downPayment"));

        let ok = LoanForm {
            desired_emi: Some(12_000.0),
            ..form
        };
        let request = build_loan_request(ok).expect("valid form");
        assert_approx(request.inputs.down_payment, 0.0);
        let check = request.salary_check.expect("salary check");
        assert_approx(check.monthly_salary, 30_000.0);
        assert_eq!(check.desired_emi, Some(12_000.0));
    }

    #[test]
    fn salary_product_uses_default_salary_and_emi() {
        let form = LoanForm {
            product: Some(LoanProduct::Salary),
            loan_amount: Some(100_000.0),
            ..LoanForm::default()
        };
        let request = build_loan_request(form).expect("valid form");
        let check = request.salary_check.expect("salary check");
        assert_approx(check.monthly_salary, DEFAULT_MONTHLY_SALARY);
        assert_eq!(check.desired_emi, Some(DEFAULT_DESIRED_EMI));
    }

    #[test]
    fn build_salary_inputs_defaults_hra_from_basic() {
        let mut form = sample_salary_form();
        form.hra = None;
        let inputs = build_salary_inputs(form).expect("valid form");
        assert_approx(inputs.hra, 100_000.0);
        assert_approx(inputs.lta, 0.0);
        assert_eq!(inputs.tax_regime, TaxRegime::New);
    }

    #[test]
    fn build_salary_inputs_rejects_low_ctc() {
        let mut form = sample_salary_form();
        form.ctc = Some(200_000.0);
        let errors = build_salary_inputs(form).expect_err("must reject");
        assert_eq!(errors.get("ctc"), Some("CTC must be at least ₹2,50,000."));
        assert!(!errors.contains("allowances"));

        let errors = build_salary_inputs(SalaryForm::default()).expect_err("must reject");
        assert!(errors.contains("ctc"));
    }

    #[test]
    fn build_salary_inputs_rejects_components_exceeding_residual() {
        let mut form = sample_salary_form();
        form.hra = Some(400_000.0);
        form.bonus = Some(150_000.0);
        let errors = build_salary_inputs(form).expect_err("must reject");
        assert!(errors.contains("allowances"));
    }

    #[test]
    fn build_salary_inputs_rejects_negative_amounts() {
        let mut form = sample_salary_form();
        form.investment_80d = Some(-1.0);
        let errors = build_salary_inputs(form).expect_err("must reject");
        assert_eq!(errors.get("investment80D"), Some("Must be a non-negative amount"));
    }

    #[test]
    fn salary_form_parses_web_keys() {
        let json = r#"{
          "ctc": 1200000,
          "city": "non-metro",
          "hra": 240000,
          "investment80C": 150000,
          "investment80D": 25000,
          "investmentNPS": 50000,
          "taxRegime": "old"
        }"#;
        let form: SalaryForm = serde_json::from_str(json).expect("json should parse");
        let inputs = build_salary_inputs(form).expect("valid form");
        assert_eq!(inputs.city, CityType::NonMetro);
        assert_eq!(inputs.tax_regime, TaxRegime::Old);
        assert_approx(inputs.investment_nps, 50_000.0);
    }

    #[test]
    fn loan_form_parses_web_keys() {
        let json = r#"{
          "product": "home",
          "productName": "Flat in Pune",
          "loanAmount": 5000000,
          "downPayment": 1000000,
          "bank": "SBI",
          "tenure": 20,
          "tenureUnit": "years",
          "emiType": "flat",
          "processingFee": 10000,
          "startDate": "2025-04-01",
          "noCostEmi": false
        }"#;
        let form: LoanForm = serde_json::from_str(json).expect("json should parse");
        let request = build_loan_request(form).expect("valid form");
        assert_eq!(request.product, LoanProduct::Home);
        assert_eq!(request.bank, BankPreset::Sbi);
        assert_approx(request.inputs.annual_rate_percent, 8.75);
        assert_eq!(request.inputs.tenure_months, 240);
        assert_eq!(request.inputs.emi_type, EmiType::Flat);
        assert_eq!(request.inputs.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
    }
}
