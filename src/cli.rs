use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api;
use crate::config::Config;
use crate::core::{
    BankPreset, CityType, EmiResult, EmiType, LoanProduct, SalaryBreakup, TaxRegime, TenureUnit,
    assess_affordability, compute_amortization, compute_salary_breakup,
};
use crate::format::{format_inr, format_percent};
use crate::forms::{
    LoanForm, LoanRequest, SalaryForm, build_loan_request, build_salary_inputs,
    salary_form_from_inputs,
};
use crate::share;
use crate::store::{InputStore, JsonFileStore, load_salary_form, save_salary_form};

#[derive(Debug, Parser)]
#[command(name = "rupeekit", version, about = "EMI and in-hand salary calculators")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, help = "Port to listen on; defaults to RUPEEKIT_PORT or 8080")]
        port: Option<u16>,
    },
    /// Loan EMI with a month-by-month schedule.
    Emi(EmiArgs),
    /// Annual CTC to in-hand salary.
    Salary(SalaryArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliProduct {
    Product,
    Home,
    Car,
    Salary,
}

impl From<CliProduct> for LoanProduct {
    fn from(value: CliProduct) -> Self {
        match value {
            CliProduct::Product => LoanProduct::Product,
            CliProduct::Home => LoanProduct::Home,
            CliProduct::Car => LoanProduct::Car,
            CliProduct::Salary => LoanProduct::Salary,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliBank {
    Sbi,
    Pnb,
    BankOfBaroda,
    Custom,
}

impl From<CliBank> for BankPreset {
    fn from(value: CliBank) -> Self {
        match value {
            CliBank::Sbi => BankPreset::Sbi,
            CliBank::Pnb => BankPreset::Pnb,
            CliBank::BankOfBaroda => BankPreset::BankOfBaroda,
            CliBank::Custom => BankPreset::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliEmiType {
    Reducing,
    Flat,
}

impl From<CliEmiType> for EmiType {
    fn from(value: CliEmiType) -> Self {
        match value {
            CliEmiType::Reducing => EmiType::Reducing,
            CliEmiType::Flat => EmiType::Flat,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliTenureUnit {
    Months,
    Years,
}

impl From<CliTenureUnit> for TenureUnit {
    fn from(value: CliTenureUnit) -> Self {
        match value {
            CliTenureUnit::Months => TenureUnit::Months,
            CliTenureUnit::Years => TenureUnit::Years,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliCity {
    Metro,
    NonMetro,
}

impl From<CliCity> for CityType {
    fn from(value: CliCity) -> Self {
        match value {
            CliCity::Metro => CityType::Metro,
            CliCity::NonMetro => CityType::NonMetro,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliTaxRegime {
    New,
    Old,
}

impl From<CliTaxRegime> for TaxRegime {
    fn from(value: CliTaxRegime) -> Self {
        match value {
            CliTaxRegime::New => TaxRegime::New,
            CliTaxRegime::Old => TaxRegime::Old,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct EmiArgs {
    #[arg(long, value_enum)]
    product: Option<CliProduct>,
    #[arg(long)]
    product_name: Option<String>,
    #[arg(long, help = "Price of the item or loan amount before down payment")]
    loan_amount: Option<f64>,
    #[arg(long)]
    down_payment: Option<f64>,
    #[arg(long, help = "Annual interest rate in percent, e.g. 8.75")]
    interest_rate: Option<f64>,
    #[arg(long, value_enum, help = "Bank preset that supplies the interest rate")]
    bank: Option<CliBank>,
    #[arg(long)]
    tenure: Option<f64>,
    #[arg(long, value_enum)]
    tenure_unit: Option<CliTenureUnit>,
    #[arg(long, value_enum)]
    emi_type: Option<CliEmiType>,
    #[arg(long)]
    processing_fee: Option<f64>,
    #[arg(long, help = "First instalment month as YYYY-MM-DD; defaults to today")]
    start_date: Option<String>,
    #[arg(long)]
    no_cost_emi: bool,
    #[arg(long, help = "Monthly salary, enables the affordability check")]
    salary: Option<f64>,
    #[arg(long)]
    desired_emi: Option<f64>,
    #[arg(long, help = "Print every schedule row")]
    schedule: bool,
    #[arg(long)]
    json: bool,
}

impl From<&EmiArgs> for LoanForm {
    fn from(args: &EmiArgs) -> Self {
        LoanForm {
            product: args.product.map(Into::into),
            product_name: args.product_name.clone(),
            loan_amount: args.loan_amount,
            down_payment: args.down_payment,
            interest_rate: args.interest_rate,
            bank: args.bank.map(Into::into),
            tenure: args.tenure,
            tenure_unit: args.tenure_unit.map(Into::into),
            emi_type: args.emi_type.map(Into::into),
            processing_fee: args.processing_fee,
            start_date: args.start_date.clone(),
            no_cost_emi: args.no_cost_emi.then_some(true),
            salary: args.salary,
            desired_emi: args.desired_emi,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SalaryArgs {
    #[arg(long, help = "Annual cost to company")]
    ctc: Option<f64>,
    #[arg(long, value_enum)]
    city: Option<CliCity>,
    #[arg(long, help = "Annual HRA; defaults to 20% of basic")]
    hra: Option<f64>,
    #[arg(long)]
    bonus: Option<f64>,
    #[arg(long)]
    lta: Option<f64>,
    #[arg(long)]
    medical: Option<f64>,
    #[arg(long = "investment-80c")]
    investment_80c: Option<f64>,
    #[arg(long = "investment-80d")]
    investment_80d: Option<f64>,
    #[arg(long = "investment-nps")]
    investment_nps: Option<f64>,
    #[arg(long, value_enum)]
    tax_regime: Option<CliTaxRegime>,
    #[arg(long, help = "Start from the inputs saved by an earlier --save")]
    restore: bool,
    #[arg(long, help = "Remember these inputs for the next --restore")]
    save: bool,
    #[arg(long, help = "Store file; defaults to RUPEEKIT_STORE_PATH")]
    store: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

impl SalaryArgs {
    /// Flags given on the command line win over the saved form.
    fn overlay(&self, base: SalaryForm) -> SalaryForm {
        SalaryForm {
            ctc: self.ctc.or(base.ctc),
            city: self.city.map(Into::into).or(base.city),
            hra: self.hra.or(base.hra),
            bonus: self.bonus.or(base.bonus),
            lta: self.lta.or(base.lta),
            medical: self.medical.or(base.medical),
            investment_80c: self.investment_80c.or(base.investment_80c),
            investment_80d: self.investment_80d.or(base.investment_80d),
            investment_nps: self.investment_nps.or(base.investment_nps),
            tax_regime: self.tax_regime.map(Into::into).or(base.tax_regime),
        }
    }
}

pub async fn run(cli: Cli, config: &Config) -> Result<()> {
    match cli.command {
        Command::Serve { port } => api::run_http_server(port.unwrap_or(config.port))
            .await
            .context("HTTP server failed"),
        Command::Emi(args) => {
            println!("{}", run_emi(&args)?);
            Ok(())
        }
        Command::Salary(args) => {
            let path = args.store.clone().unwrap_or_else(|| config.store_path.clone());
            let store = JsonFileStore::new(path);
            println!("{}", run_salary(&args, &store)?);
            Ok(())
        }
    }
}

pub fn run_emi(args: &EmiArgs) -> Result<String> {
    let request = build_loan_request(LoanForm::from(args))?;
    let result = compute_amortization(&request.inputs);
    let share_query = share::to_query_string(&share::loan_to_map(&request))?;

    if args.json {
        return serde_json::to_string_pretty(&result).context("serializing EMI result");
    }
    Ok(render_emi(&request, &result, args.schedule, &share_query))
}

pub fn run_salary(args: &SalaryArgs, store: &dyn InputStore) -> Result<String> {
    let saved = if args.restore {
        load_salary_form(store).context("loading saved salary inputs")?
    } else {
        None
    };
    let form = args.overlay(saved.unwrap_or_default());
    let inputs = build_salary_inputs(form)?;
    let breakup = compute_salary_breakup(&inputs);

    if args.save {
        save_salary_form(store, &salary_form_from_inputs(&inputs))
            .context("saving salary inputs")?;
        tracing::info!("saved salary inputs");
    }

    if args.json {
        return serde_json::to_string_pretty(&breakup).context("serializing salary breakup");
    }
    let share_query = share::to_query_string(&share::salary_to_map(&inputs))?;
    Ok(render_salary(&breakup, &share_query))
}

fn render_emi(
    request: &LoanRequest,
    result: &EmiResult,
    schedule: bool,
    share_query: &str,
) -> String {
    let inputs = &request.inputs;
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", request.product_name, request.bank.display_name());
    let _ = writeln!(out, "Loan principal:     {}", format_inr(result.principal));
    let _ = writeln!(
        out,
        "Interest rate:      {} {} for {} months",
        format_percent(inputs.effective_rate_percent() / 100.0),
        inputs.emi_type,
        inputs.tenure_months
    );
    let _ = writeln!(out, "Monthly EMI:        {}", format_inr(result.monthly_emi));
    let _ = writeln!(out, "Total interest:     {}", format_inr(result.total_interest));
    let _ = writeln!(out, "Processing fee:     {}", format_inr(result.total_processing_fee));
    let _ = writeln!(out, "Total amount:       {}", format_inr(result.total_amount));

    if let Some(check) = request.salary_check {
        let affordability = assess_affordability(check.monthly_salary, result.monthly_emi);
        let verdict = if affordability.affordable {
            "within 40% of salary"
        } else {
            "above 40% of salary"
        };
        let _ = writeln!(
            out,
            "EMI to salary:      {} ({verdict})",
            format_percent(affordability.emi_to_salary_ratio)
        );
        if affordability.low_salary {
            let _ = writeln!(out, "Tip: salary is below ₹30,000; consider a longer tenure.");
        }
    }

    if schedule {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>4}  {:<8}  {:>16}  {:>16}  {:>16}",
            "#", "Month", "Principal", "Interest", "Balance"
        );
        for row in &result.schedule {
            let _ = writeln!(
                out,
                "{:>4}  {:<8}  {:>16}  {:>16}  {:>16}",
                row.period,
                row.month,
                format_inr(row.principal),
                format_inr(row.interest),
                format_inr(row.balance)
            );
        }
    }

    let _ = write!(out, "\nShare: ?{share_query}");
    out
}

fn render_salary(breakup: &SalaryBreakup, share_query: &str) -> String {
    let mut out = String::new();
    let line = |out: &mut String, label: &str, amount: f64| {
        let _ = writeln!(out, "{label:<22}{:>18}", format_inr(amount));
    };

    let _ = writeln!(out, "Tax regime: {}", breakup.tax_regime);
    line(&mut out, "Basic", breakup.basic);
    line(&mut out, "HRA", breakup.hra);
    line(&mut out, "Special allowances", breakup.allowances);
    line(&mut out, "Bonus", breakup.bonus);
    line(&mut out, "LTA", breakup.lta);
    line(&mut out, "Medical", breakup.medical);
    line(&mut out, "Gross annual", breakup.gross_annual);
    line(&mut out, "PF (employee)", breakup.pf_employee);
    line(&mut out, "ESIC (employee)", breakup.esic_employee);
    line(&mut out, "Professional tax", breakup.professional_tax);
    line(&mut out, "Taxable income", breakup.taxable_income);
    for slab in &breakup.tax_slabs {
        let label = format!("  {} @ {}", slab.range, format_percent(slab.rate));
        line(&mut out, &label, slab.amount);
    }
    line(&mut out, "Cess (4%)", breakup.cess);
    line(&mut out, "Income tax", breakup.income_tax);
    line(&mut out, "In-hand (annual)", breakup.in_hand_annual);
    line(&mut out, "In-hand (monthly)", breakup.in_hand_monthly);
    line(&mut out, "Employer PF", breakup.pf_employer);
    line(&mut out, "Gratuity", breakup.gratuity);
    let _ = write!(out, "\nShare: ?{share_query}");
    out
}
