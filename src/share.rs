//! Share links: calculator inputs as flat string maps and URL query strings.
//!
//! Maps are built from resolved requests rather than raw forms, so opening a link
//! reproduces the exact figures the sender saw.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::core::{BankPreset, SalaryInputs};
use crate::errors::FieldErrors;
use crate::forms::{DATE_FORMAT, LoanForm, LoanRequest, SalaryForm};

pub type ShareMap = BTreeMap<String, String>;

pub fn loan_to_map(request: &LoanRequest) -> ShareMap {
    let inputs = &request.inputs;
    let mut map = ShareMap::new();
    map.insert("product".into(), request.product.to_string());
    map.insert("productName".into(), request.product_name.clone());
    map.insert("loanAmount".into(), inputs.price.to_string());
    map.insert("downPayment".into(), inputs.down_payment.to_string());
    map.insert("interestRate".into(), inputs.annual_rate_percent.to_string());
    if request.bank != BankPreset::Custom {
        map.insert("bank".into(), request.bank.to_string());
    }
    map.insert("tenure".into(), request.tenure.to_string());
    map.insert("tenureUnit".into(), request.tenure_unit.to_string());
    map.insert("emiType".into(), inputs.emi_type.to_string());
    map.insert("processingFee".into(), inputs.processing_fee.to_string());
    if let Some(date) = inputs.start_date {
        map.insert("startDate".into(), date.format(DATE_FORMAT).to_string());
    }
    map.insert("noCostEmi".into(), inputs.no_cost.to_string());
    if let Some(check) = request.salary_check {
        map.insert("salary".into(), check.monthly_salary.to_string());
        if let Some(desired) = check.desired_emi {
            map.insert("desiredEmi".into(), desired.to_string());
        }
    }
    map
}

pub fn salary_to_map(inputs: &SalaryInputs) -> ShareMap {
    let mut map = ShareMap::new();
    map.insert("ctc".into(), inputs.ctc.to_string());
    map.insert("city".into(), inputs.city.to_string());
    map.insert("hra".into(), inputs.hra.to_string());
    map.insert("bonus".into(), inputs.bonus.to_string());
    map.insert("lta".into(), inputs.lta.to_string());
    map.insert("medical".into(), inputs.medical.to_string());
    map.insert("investment80C".into(), inputs.investment_80c.to_string());
    map.insert("investment80D".into(), inputs.investment_80d.to_string());
    map.insert("investmentNPS".into(), inputs.investment_nps.to_string());
    map.insert("taxRegime".into(), inputs.tax_regime.to_string());
    map
}

/// Reads a loan form back from a share map. Unknown keys are ignored; a value that
/// does not parse is reported against its key.
pub fn loan_from_map(map: &ShareMap) -> Result<LoanForm, FieldErrors> {
    let mut reader = MapReader::new(map);
    let form = LoanForm {
        product: reader.parsed("product"),
        product_name: reader.text("productName"),
        loan_amount: reader.parsed("loanAmount"),
        down_payment: reader.parsed("downPayment"),
        interest_rate: reader.parsed("interestRate"),
        bank: reader.parsed("bank"),
        tenure: reader.parsed("tenure"),
        tenure_unit: reader.parsed("tenureUnit"),
        emi_type: reader.parsed("emiType"),
        processing_fee: reader.parsed("processingFee"),
        start_date: reader.text("startDate"),
        no_cost_emi: reader.parsed("noCostEmi"),
        salary: reader.parsed("salary"),
        desired_emi: reader.parsed("desiredEmi"),
    };
    reader.errors.into_result(form)
}

pub fn salary_from_map(map: &ShareMap) -> Result<SalaryForm, FieldErrors> {
    let mut reader = MapReader::new(map);
    let form = SalaryForm {
        ctc: reader.parsed("ctc"),
        city: reader.parsed("city"),
        hra: reader.parsed("hra"),
        bonus: reader.parsed("bonus"),
        lta: reader.parsed("lta"),
        medical: reader.parsed("medical"),
        investment_80c: reader.parsed("investment80C"),
        investment_80d: reader.parsed("investment80D"),
        investment_nps: reader.parsed("investmentNPS"),
        tax_regime: reader.parsed("taxRegime"),
    };
    reader.errors.into_result(form)
}

pub fn to_query_string(map: &ShareMap) -> Result<String, serde_urlencoded::ser::Error> {
    serde_urlencoded::to_string(map)
}

/// Accepts a bare query string or one with a leading `?`.
pub fn parse_query_string(query: &str) -> Result<ShareMap, serde_urlencoded::de::Error> {
    serde_urlencoded::from_str(query.trim().trim_start_matches('?'))
}

struct MapReader<'a> {
    map: &'a ShareMap,
    errors: FieldErrors,
}

impl<'a> MapReader<'a> {
    fn new(map: &'a ShareMap) -> Self {
        Self {
            map,
            errors: FieldErrors::new(),
        }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.map
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.raw(key).map(str::to_string)
    }

    fn parsed<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        let raw = self.raw(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.insert(key, format!("Unrecognised value '{raw}'"));
                None
            }
        }
    }
}
