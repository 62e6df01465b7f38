use super::types::{CityType, SalaryBreakup, SalaryInputs, TaxRegime, TaxSlab};
use crate::format::lakh_label;

pub const MIN_CTC: f64 = 250_000.0;
pub const BASIC_SHARE_OF_CTC: f64 = 0.5;
/// HRA assumed when the caller leaves it unset, as a share of basic pay.
pub const DEFAULT_HRA_SHARE_OF_BASIC: f64 = 0.2;

const PF_RATE: f64 = 0.12;
const PF_WAGE_CEILING_MONTHLY: f64 = 15_000.0;
const ESIC_GROSS_MONTHLY_LIMIT: f64 = 21_000.0;
const ESIC_EMPLOYEE_RATE: f64 = 0.0075;
const ESIC_EMPLOYER_RATE: f64 = 0.0325;
/// Maharashtra slab for salaried employees.
pub const PROFESSIONAL_TAX: f64 = 2_400.0;
const GRATUITY_RATE: f64 = 0.0481;

pub const STANDARD_DEDUCTION: f64 = 50_000.0;
const HRA_METRO_SHARE: f64 = 0.5;
const HRA_NON_METRO_SHARE: f64 = 0.4;
const HRA_BASIC_FLOOR_SHARE: f64 = 0.1;
const LTA_EXEMPTION_CAP: f64 = 20_000.0;
const MEDICAL_EXEMPTION_CAP: f64 = 15_000.0;
pub const SECTION_80C_CAP: f64 = 150_000.0;
pub const SECTION_80D_CAP: f64 = 25_000.0;
pub const NPS_CAP: f64 = 50_000.0;

pub const CESS_RATE: f64 = 0.04;

/// One progressive bracket. Income strictly above `lower` is taxed at `rate` up to the
/// next bracket's lower bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: f64,
    pub rate: f64,
}

const fn bracket(lower: f64, rate: f64) -> Bracket {
    Bracket { lower, rate }
}

// FY 2025-26.
const NEW_REGIME_BRACKETS: [Bracket; 6] = [
    bracket(0.0, 0.0),
    bracket(300_000.0, 0.05),
    bracket(700_000.0, 0.10),
    bracket(1_000_000.0, 0.15),
    bracket(1_200_000.0, 0.20),
    bracket(1_500_000.0, 0.30),
];

const OLD_REGIME_BRACKETS: [Bracket; 4] = [
    bracket(0.0, 0.0),
    bracket(250_000.0, 0.05),
    bracket(500_000.0, 0.20),
    bracket(1_000_000.0, 0.30),
];

pub fn brackets(regime: TaxRegime) -> &'static [Bracket] {
    match regime {
        TaxRegime::New => &NEW_REGIME_BRACKETS,
        TaxRegime::Old => &OLD_REGIME_BRACKETS,
    }
}

pub fn compute_salary_breakup(inputs: &SalaryInputs) -> SalaryBreakup {
    let ctc = inputs.ctc;
    let basic = ctc * BASIC_SHARE_OF_CTC;
    let allowances = ctc - basic - inputs.hra - inputs.bonus - inputs.lta - inputs.medical;
    let gross_annual =
        basic + inputs.hra + allowances + inputs.bonus + inputs.lta + inputs.medical;
    let gross_monthly = gross_annual / 12.0;

    let pf_employee = basic.min(PF_WAGE_CEILING_MONTHLY * 12.0) * PF_RATE;
    let pf_employer = pf_employee;

    let esic_applies = gross_monthly < ESIC_GROSS_MONTHLY_LIMIT;
    let esic_employee = if esic_applies {
        gross_annual * ESIC_EMPLOYEE_RATE
    } else {
        0.0
    };
    let esic_employer = if esic_applies {
        gross_annual * ESIC_EMPLOYER_RATE
    } else {
        0.0
    };

    let gratuity = basic * GRATUITY_RATE;

    let exemptions = Exemptions::for_inputs(inputs, basic);
    let taxable_income = (gross_annual - pf_employee - PROFESSIONAL_TAX - exemptions.total())
        .max(0.0);

    let tax_slabs = tax_slabs(taxable_income, inputs.tax_regime);
    let tax_before_cess: f64 = tax_slabs.iter().map(|slab| slab.amount).sum();
    let income_tax = tax_before_cess * (1.0 + CESS_RATE);

    let in_hand_annual =
        gross_annual - pf_employee - esic_employee - PROFESSIONAL_TAX - income_tax;

    SalaryBreakup {
        tax_regime: inputs.tax_regime,
        basic,
        hra: inputs.hra,
        allowances,
        bonus: inputs.bonus,
        lta: inputs.lta,
        medical: inputs.medical,
        gross_annual,
        gross_monthly,
        hra_exempt: exemptions.hra,
        lta_exempt: exemptions.lta,
        medical_exempt: exemptions.medical,
        deduction_80c: exemptions.section_80c,
        deduction_80d: exemptions.section_80d,
        deduction_nps: exemptions.nps,
        standard_deduction: STANDARD_DEDUCTION,
        pf_employee,
        pf_employer,
        esic_employee,
        esic_employer,
        professional_tax: PROFESSIONAL_TAX,
        gratuity,
        taxable_income,
        tax_slabs,
        tax_before_cess,
        cess: income_tax - tax_before_cess,
        income_tax,
        in_hand_annual,
        in_hand_monthly: in_hand_annual / 12.0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Exemptions {
    hra: f64,
    lta: f64,
    medical: f64,
    section_80c: f64,
    section_80d: f64,
    nps: f64,
}

impl Exemptions {
    fn for_inputs(inputs: &SalaryInputs, basic: f64) -> Self {
        match inputs.tax_regime {
            TaxRegime::New => Self::default(),
            TaxRegime::Old => Self {
                hra: hra_exemption(inputs.hra, basic, inputs.city),
                lta: inputs.lta.clamp(0.0, LTA_EXEMPTION_CAP),
                medical: inputs.medical.clamp(0.0, MEDICAL_EXEMPTION_CAP),
                section_80c: inputs.investment_80c.clamp(0.0, SECTION_80C_CAP),
                section_80d: inputs.investment_80d.clamp(0.0, SECTION_80D_CAP),
                nps: inputs.investment_nps.clamp(0.0, NPS_CAP),
            },
        }
    }

    fn total(self) -> f64 {
        self.hra
            + self.lta
            + self.medical
            + self.section_80c
            + self.section_80d
            + self.nps
            + STANDARD_DEDUCTION
    }
}

pub fn hra_exemption(hra: f64, basic: f64, city: CityType) -> f64 {
    let city_share = match city {
        CityType::Metro => HRA_METRO_SHARE,
        CityType::NonMetro => HRA_NON_METRO_SHARE,
    };
    hra.min(basic * city_share)
        .min(basic * HRA_BASIC_FLOOR_SHARE)
        .max(0.0)
}

/// Walks the regime's table from the highest bracket the income exceeds down to the
/// first taxed bracket. Zero-rate brackets are skipped; the result is ordered from the
/// lowest bracket upward.
pub fn tax_slabs(taxable_income: f64, regime: TaxRegime) -> Vec<TaxSlab> {
    let table = brackets(regime);
    let Some(top) = table.iter().rposition(|b| taxable_income > b.lower) else {
        return Vec::new();
    };

    let mut slabs = Vec::with_capacity(top + 1);
    for index in (0..=top).rev() {
        let current = table[index];
        if current.rate == 0.0 {
            continue;
        }
        let upper = if index == top {
            taxable_income
        } else {
            table[index + 1].lower
        };
        slabs.push(TaxSlab {
            range: range_label(table, index),
            rate: current.rate,
            amount: (upper - current.lower) * current.rate,
        });
    }
    slabs.reverse();
    slabs
}

pub fn income_tax(taxable_income: f64, regime: TaxRegime) -> f64 {
    let base: f64 = tax_slabs(taxable_income, regime)
        .iter()
        .map(|slab| slab.amount)
        .sum();
    base * (1.0 + CESS_RATE)
}

fn range_label(table: &[Bracket], index: usize) -> String {
    match table.get(index + 1) {
        Some(next) => format!(
            "{}-{}",
            lakh_label(table[index].lower),
            lakh_label(next.lower)
        ),
        None => format!("{}+", lakh_label(table[index].lower)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_inputs() -> SalaryInputs {
        SalaryInputs {
            ctc: 1_000_000.0,
            city: CityType::Metro,
            hra: 200_000.0,
            bonus: 50_000.0,
            lta: 0.0,
            medical: 0.0,
            investment_80c: 150_000.0,
            investment_80d: 25_000.0,
            investment_nps: 50_000.0,
            tax_regime: TaxRegime::New,
        }
    }

    #[test]
    fn new_regime_hand_computed_in_hand_pay() {
        let breakup = compute_salary_breakup(&sample_inputs());

        assert_approx(breakup.basic, 500_000.0);
        assert_approx(breakup.allowances, 250_000.0);
        assert_approx(breakup.gross_annual, 1_000_000.0);
        assert_approx(breakup.pf_employee, 21_600.0);
        assert_approx(breakup.pf_employer, 21_600.0);
        assert_approx(breakup.esic_employee, 0.0);
        assert_approx(breakup.taxable_income, 926_000.0);
        assert_approx(breakup.tax_before_cess, 42_600.0);
        assert_approx(breakup.income_tax, 44_304.0);
        assert_approx(breakup.in_hand_annual, 931_696.0);
        assert!((breakup.in_hand_monthly - 77_641.33).abs() < 1.0);
        assert_approx(breakup.hra_exempt, 0.0);
        assert_approx(breakup.deduction_80c, 0.0);
    }

    #[test]
    fn new_regime_slab_breakdown_is_ordered_and_labelled() {
        let slabs = tax_slabs(926_000.0, TaxRegime::New);
        let ranges: Vec<_> = slabs.iter().map(|s| s.range.as_str()).collect();
        assert_eq!(ranges, vec!["3L-7L", "7L-10L"]);
        assert_approx(slabs[0].amount, 20_000.0);
        assert_approx(slabs[1].amount, 22_600.0);
    }

    #[test]
    fn taxable_exactly_on_bound_pays_nothing_at_next_rate() {
        let slabs = tax_slabs(700_000.0, TaxRegime::New);
        assert_eq!(slabs.len(), 1);
        assert_eq!(slabs[0].rate, 0.05);
        assert_approx(
            income_tax(700_000.0, TaxRegime::New),
            (700_000.0 - 300_000.0) * 0.05 * 1.04,
        );
        assert!(tax_slabs(300_000.0, TaxRegime::New).is_empty());
    }

    #[test]
    fn top_brackets_accumulate_fixed_amounts() {
        assert_approx(
            income_tax(2_000_000.0, TaxRegime::New),
            (140_000.0 + 500_000.0 * 0.3) * 1.04,
        );
        assert_approx(
            income_tax(1_200_000.0, TaxRegime::Old),
            (112_500.0 + 200_000.0 * 0.3) * 1.04,
        );
        let top = tax_slabs(2_000_000.0, TaxRegime::New);
        assert_eq!(top.last().map(|s| s.range.as_str()), Some("15L+"));
        let old = tax_slabs(600_000.0, TaxRegime::Old);
        assert_eq!(old[0].range, "2.5L-5L");
    }

    #[test]
    fn metro_hra_exemption_is_capped_by_ten_percent_of_basic() {
        assert_approx(hra_exemption(300_000.0, 500_000.0, CityType::Metro), 50_000.0);

        let mut inputs = sample_inputs();
        inputs.ctc = 1_000_000.0;
        inputs.hra = 300_000.0;
        inputs.bonus = 0.0;
        inputs.tax_regime = TaxRegime::Old;
        let breakup = compute_salary_breakup(&inputs);
        assert_approx(breakup.basic, 500_000.0);
        assert_approx(breakup.hra_exempt, 50_000.0);
    }

    #[test]
    fn old_regime_applies_capped_deductions() {
        let mut inputs = sample_inputs();
        inputs.tax_regime = TaxRegime::Old;
        inputs.lta = 30_000.0;
        inputs.medical = 10_000.0;
        inputs.investment_80c = 400_000.0;
        inputs.investment_80d = 60_000.0;
        inputs.investment_nps = 90_000.0;
        let breakup = compute_salary_breakup(&inputs);

        assert_approx(breakup.lta_exempt, 20_000.0);
        assert_approx(breakup.medical_exempt, 10_000.0);
        assert_approx(breakup.deduction_80c, SECTION_80C_CAP);
        assert_approx(breakup.deduction_80d, SECTION_80D_CAP);
        assert_approx(breakup.deduction_nps, NPS_CAP);

        let expected_taxable = 1_000_000.0
            - 21_600.0
            - PROFESSIONAL_TAX
            - (50_000.0 + 20_000.0 + 10_000.0 + 150_000.0 + 25_000.0 + 50_000.0 + 50_000.0);
        assert_approx(breakup.taxable_income, expected_taxable);
    }

    #[test]
    fn esic_applies_below_monthly_gross_threshold() {
        let mut inputs = sample_inputs();
        inputs.ctc = 250_000.0;
        inputs.hra = 25_000.0;
        inputs.bonus = 0.0;
        let breakup = compute_salary_breakup(&inputs);

        assert!(breakup.gross_monthly < 21_000.0);
        assert_approx(breakup.esic_employee, 250_000.0 * 0.0075);
        assert_approx(breakup.esic_employer, 250_000.0 * 0.0325);
        assert_approx(breakup.pf_employee, 125_000.0 * 0.12);
        assert_approx(breakup.income_tax, 0.0);
        assert!(breakup.tax_slabs.is_empty());
    }

    #[test]
    fn gratuity_is_informational_only() {
        let breakup = compute_salary_breakup(&sample_inputs());
        assert_approx(breakup.gratuity, 500_000.0 * 0.0481);
        assert_approx(
            breakup.in_hand_annual,
            breakup.gross_annual
                - breakup.pf_employee
                - breakup.esic_employee
                - breakup.professional_tax
                - breakup.income_tax,
        );
    }

    #[test]
    fn oversized_components_drive_allowances_negative() {
        let mut inputs = sample_inputs();
        inputs.hra = 400_000.0;
        inputs.bonus = 200_000.0;
        let breakup = compute_salary_breakup(&inputs);
        assert!(breakup.allowances < 0.0);
        assert_approx(breakup.gross_annual, inputs.ctc);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_income_tax_is_monotone_and_below_income(
            taxable in 0u32..5_000_000,
            bump in 1u32..200_000,
            old in proptest::bool::ANY,
        ) {
            let regime = if old { TaxRegime::Old } else { TaxRegime::New };
            let low = income_tax(taxable as f64, regime);
            let high = income_tax((taxable + bump) as f64, regime);
            prop_assert!(low >= 0.0);
            prop_assert!(high + 1e-9 >= low);
            prop_assert!(low <= taxable as f64 * 0.3 * 1.04 + 1e-6);
        }

        #[test]
        fn prop_slab_amounts_match_closed_form_brackets(taxable in 0u32..5_000_000) {
            let t = taxable as f64;
            let expected = if t > 1_500_000.0 {
                (t - 1_500_000.0) * 0.3 + 140_000.0
            } else if t > 1_200_000.0 {
                (t - 1_200_000.0) * 0.2 + 80_000.0
            } else if t > 1_000_000.0 {
                (t - 1_000_000.0) * 0.15 + 50_000.0
            } else if t > 700_000.0 {
                (t - 700_000.0) * 0.1 + 20_000.0
            } else if t > 300_000.0 {
                (t - 300_000.0) * 0.05
            } else {
                0.0
            };
            let actual: f64 = tax_slabs(t, TaxRegime::New).iter().map(|s| s.amount).sum();
            prop_assert!((actual - expected).abs() <= 1e-6, "{actual} vs {expected}");
        }

        #[test]
        fn prop_old_regime_never_taxes_more_when_deductions_grow(
            ctc in 250_000u32..5_000_000,
            extra_80c in 0u32..150_000,
        ) {
            let mut inputs = sample_inputs();
            inputs.tax_regime = TaxRegime::Old;
            inputs.ctc = ctc as f64;
            inputs.hra = ctc as f64 * 0.1;
            inputs.bonus = 0.0;
            inputs.investment_80c = 0.0;
            let base = compute_salary_breakup(&inputs);
            inputs.investment_80c = extra_80c as f64;
            let with_80c = compute_salary_breakup(&inputs);
            prop_assert!(with_80c.income_tax <= base.income_tax + 1e-9);
            prop_assert!(with_80c.in_hand_annual + 1e-9 >= base.in_hand_annual);
        }
    }
}
