mod amortization;
mod payroll;
mod solver;
mod types;

pub use amortization::{
    AFFORDABLE_EMI_SHARE, LOW_SALARY_THRESHOLD, assess_affordability, compute_amortization,
    compute_amortization_from, monthly_rate,
};
pub use payroll::{
    BASIC_SHARE_OF_CTC, Bracket, CESS_RATE, DEFAULT_HRA_SHARE_OF_BASIC, MIN_CTC, NPS_CAP,
    PROFESSIONAL_TAX, SECTION_80C_CAP, SECTION_80D_CAP, STANDARD_DEDUCTION, brackets,
    compute_salary_breakup, hra_exemption, income_tax, tax_slabs,
};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, max_principal_for_emi,
    solve_goal,
};
pub use types::{
    Affordability, BankPreset, CityType, EmiResult, EmiType, LoanInputs, LoanProduct,
    SalaryBreakup, SalaryInputs, ScheduleRow, TaxRegime, TaxSlab, TenureUnit, UnknownVariant,
};
