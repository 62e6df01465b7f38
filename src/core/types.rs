use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmiType {
    #[default]
    Reducing,
    Flat,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TenureUnit {
    #[default]
    Months,
    Years,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CityType {
    #[default]
    Metro,
    #[serde(alias = "nonMetro", alias = "non_metro")]
    NonMetro,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxRegime {
    #[default]
    New,
    Old,
}

/// Which calculator tab a loan request comes from. Drives defaults and which
/// fields are required.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanProduct {
    #[default]
    Product,
    Home,
    Car,
    Salary,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BankPreset {
    #[serde(alias = "SBI")]
    Sbi,
    #[serde(alias = "PNB")]
    Pnb,
    #[serde(alias = "bankOfBaroda", alias = "Bank of Baroda")]
    BankOfBaroda,
    #[default]
    #[serde(alias = "Custom")]
    Custom,
}

/// Error returned when a share-link or CLI token does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $canonical,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($canonical $(| $alias)* => Ok($ty::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(EmiType {
    Reducing => "reducing",
    Flat => "flat",
});

str_enum!(TenureUnit {
    Months => "months" | "month",
    Years => "years" | "year",
});

str_enum!(CityType {
    Metro => "metro",
    NonMetro => "non-metro" | "nonMetro" | "non_metro",
});

str_enum!(TaxRegime {
    New => "new",
    Old => "old",
});

str_enum!(LoanProduct {
    Product => "product",
    Home => "home",
    Car => "car",
    Salary => "salary",
});

str_enum!(BankPreset {
    Sbi => "sbi" | "SBI",
    Pnb => "pnb" | "PNB",
    BankOfBaroda => "bank-of-baroda" | "bankOfBaroda" | "Bank of Baroda",
    Custom => "custom" | "Custom",
});

impl TenureUnit {
    pub fn to_months(self, value: f64) -> f64 {
        match self {
            TenureUnit::Months => value,
            TenureUnit::Years => value * 12.0,
        }
    }
}

impl LoanProduct {
    pub fn default_rate_percent(self) -> f64 {
        match self {
            LoanProduct::Product | LoanProduct::Home | LoanProduct::Salary => 5.0,
            LoanProduct::Car => 7.0,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            LoanProduct::Product => "Product",
            LoanProduct::Home => "Home Loan",
            LoanProduct::Car => "Car Loan",
            LoanProduct::Salary => "Loan Based on Salary",
        }
    }
}

impl BankPreset {
    /// Published annual rate for the preset; `None` keeps whatever rate the caller typed.
    pub fn rate_percent(self) -> Option<f64> {
        match self {
            BankPreset::Sbi => Some(8.75),
            BankPreset::Pnb => Some(8.9),
            BankPreset::BankOfBaroda => Some(9.0),
            BankPreset::Custom => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BankPreset::Sbi => "SBI",
            BankPreset::Pnb => "PNB",
            BankPreset::BankOfBaroda => "Bank of Baroda",
            BankPreset::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanInputs {
    pub price: f64,
    pub down_payment: f64,
    pub annual_rate_percent: f64,
    /// Forces every rate used by the engine to zero.
    pub no_cost: bool,
    pub tenure_months: u32,
    pub emi_type: EmiType,
    pub start_date: Option<NaiveDate>,
    pub processing_fee: f64,
}

impl LoanInputs {
    pub fn principal(&self) -> f64 {
        self.price - self.down_payment
    }

    pub fn effective_rate_percent(&self) -> f64 {
        if self.no_cost {
            0.0
        } else {
            self.annual_rate_percent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    pub period: u32,
    pub month: String,
    pub emi: f64,
    pub principal: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiResult {
    pub principal: f64,
    pub monthly_emi: f64,
    pub total_interest: f64,
    pub total_processing_fee: f64,
    pub total_amount: f64,
    pub schedule: Vec<ScheduleRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordability {
    pub monthly_salary: f64,
    pub emi: f64,
    pub emi_to_salary_ratio: f64,
    pub affordable: bool,
    pub low_salary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalaryInputs {
    pub ctc: f64,
    pub city: CityType,
    pub hra: f64,
    pub bonus: f64,
    pub lta: f64,
    pub medical: f64,
    pub investment_80c: f64,
    pub investment_80d: f64,
    pub investment_nps: f64,
    pub tax_regime: TaxRegime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSlab {
    pub range: String,
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakup {
    pub tax_regime: TaxRegime,
    pub basic: f64,
    pub hra: f64,
    pub allowances: f64,
    pub bonus: f64,
    pub lta: f64,
    pub medical: f64,
    pub gross_annual: f64,
    pub gross_monthly: f64,

    pub hra_exempt: f64,
    pub lta_exempt: f64,
    pub medical_exempt: f64,
    #[serde(rename = "deduction80C")]
    pub deduction_80c: f64,
    #[serde(rename = "deduction80D")]
    pub deduction_80d: f64,
    #[serde(rename = "deductionNPS")]
    pub deduction_nps: f64,
    pub standard_deduction: f64,

    pub pf_employee: f64,
    pub pf_employer: f64,
    pub esic_employee: f64,
    pub esic_employer: f64,
    pub professional_tax: f64,
    pub gratuity: f64,

    pub taxable_income: f64,
    pub tax_slabs: Vec<TaxSlab>,
    pub tax_before_cess: f64,
    pub cess: f64,
    pub income_tax: f64,

    pub in_hand_annual: f64,
    pub in_hand_monthly: f64,
}
