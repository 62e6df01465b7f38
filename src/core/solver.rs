use super::amortization::{compound_growth_minus_one, flat_total_interest, reducing_emi};
use super::types::EmiType;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GoalType {
    /// Largest principal whose EMI stays at or below the target EMI.
    MaxPrincipal,
    /// Reducing-balance annual rate (percent) whose EMI equals the target EMI.
    ImpliedRate,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub target_emi: f64,
    pub tenure_months: u32,
    /// Fixed rate for `MaxPrincipal`; ignored for `ImpliedRate`.
    pub annual_rate_percent: f64,
    pub emi_type: EmiType,
    /// Fixed principal for `ImpliedRate`; ignored for `MaxPrincipal`.
    pub principal: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl GoalSolveConfig {
    pub fn max_principal(target_emi: f64, annual_rate_percent: f64, tenure_months: u32) -> Self {
        Self {
            goal_type: GoalType::MaxPrincipal,
            target_emi,
            tenure_months,
            annual_rate_percent,
            emi_type: EmiType::Reducing,
            principal: 0.0,
            search_min: 0.0,
            search_max: target_emi * tenure_months as f64,
            tolerance: 0.01,
            max_iterations: 200,
        }
    }

    pub fn implied_rate(principal: f64, target_emi: f64, tenure_months: u32) -> Self {
        Self {
            goal_type: GoalType::ImpliedRate,
            target_emi,
            tenure_months,
            annual_rate_percent: 0.0,
            emi_type: EmiType::Reducing,
            principal,
            search_min: 0.0,
            search_max: 100.0,
            tolerance: 1e-6,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub candidate_emi: f64,
}

#[derive(Debug, Clone)]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub target_emi: f64,
    pub solved_value: Option<f64>,
    pub achieved_emi: Option<f64>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Closed-form inverse of the EMI formulas: the principal that a given EMI repays.
pub fn max_principal_for_emi(
    emi: f64,
    annual_rate_percent: f64,
    tenure_months: u32,
    emi_type: EmiType,
) -> f64 {
    if tenure_months == 0 || emi <= 0.0 {
        return 0.0;
    }
    let n = tenure_months as f64;
    match emi_type {
        EmiType::Reducing => {
            let r = annual_rate_percent / 100.0 / 12.0;
            let growth_minus_one = compound_growth_minus_one(r, tenure_months);
            if r == 0.0 || growth_minus_one == 0.0 {
                emi * n
            } else {
                emi * growth_minus_one / (r * (growth_minus_one + 1.0))
            }
        }
        EmiType::Flat => emi * n / (1.0 + annual_rate_percent / 100.0 * n / 12.0),
    }
}

/// Bisection over a quantity the EMI grows with (principal or rate). Both goals are
/// monotone increasing in the searched value, so one loop serves both.
pub fn solve_goal(config: GoalSolveConfig) -> Result<GoalSolveResult, String> {
    validate_config(config)?;

    let low_emi = evaluate_candidate(config, config.search_min);
    let high_emi = evaluate_candidate(config, config.search_max);

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    if low_emi > config.target_emi + 1e-9 {
        feasible = false;
        message = match config.goal_type {
            GoalType::MaxPrincipal => "Target EMI is below the EMI of the smallest loan searched.",
            GoalType::ImpliedRate => "Quoted EMI is below the zero-interest EMI.",
        }
        .to_string();
    } else if high_emi + 1e-9 < config.target_emi {
        match config.goal_type {
            GoalType::MaxPrincipal => {
                solved_value = Some(config.search_max);
                converged = true;
                feasible = true;
                message =
                    "Upper principal bound is still affordable; increase search max.".to_string();
            }
            GoalType::ImpliedRate => {
                feasible = false;
                message = "Quoted EMI implies a rate above the search bounds.".to_string();
            }
        }
    } else {
        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut it = 0;
        while it < config.max_iterations {
            it += 1;
            let mid = (lo + hi) * 0.5;
            let emi = evaluate_candidate(config, mid);
            iterations.push(GoalSolveIteration {
                iteration: it,
                lower_bound: lo,
                upper_bound: hi,
                candidate_value: mid,
                candidate_emi: emi,
            });

            if emi <= config.target_emi {
                lo = mid;
            } else {
                hi = mid;
            }

            if (hi - lo).abs() <= config.tolerance {
                converged = true;
                break;
            }
        }
        solved_value = Some(lo);
        feasible = true;
        message = match (converged, config.goal_type) {
            (true, GoalType::MaxPrincipal) => "Solved maximum principal.".to_string(),
            (true, GoalType::ImpliedRate) => "Solved implied annual rate.".to_string(),
            (false, _) => {
                "Reached max iterations before tolerance was met; returning best estimate."
                    .to_string()
            }
        };
    }

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        target_emi: config.target_emi,
        achieved_emi: solved_value.map(|value| evaluate_candidate(config, value)),
        solved_value,
        iterations,
        converged,
        feasible,
        message,
    })
}

fn evaluate_candidate(config: GoalSolveConfig, candidate_value: f64) -> f64 {
    let (principal, rate_percent, emi_type) = match config.goal_type {
        GoalType::MaxPrincipal => (
            candidate_value,
            config.annual_rate_percent,
            config.emi_type,
        ),
        GoalType::ImpliedRate => (config.principal, candidate_value, EmiType::Reducing),
    };
    emi_for(principal, rate_percent, config.tenure_months, emi_type)
}

fn emi_for(principal: f64, annual_rate_percent: f64, tenure_months: u32, emi_type: EmiType) -> f64 {
    match emi_type {
        EmiType::Reducing => {
            reducing_emi(principal, annual_rate_percent / 100.0 / 12.0, tenure_months)
        }
        EmiType::Flat => {
            let interest = flat_total_interest(principal, annual_rate_percent, tenure_months);
            (principal + interest) / tenure_months as f64
        }
    }
}

fn validate_config(config: GoalSolveConfig) -> Result<(), String> {
    if config.tenure_months == 0 {
        return Err("tenure_months must be > 0".to_string());
    }
    if !config.target_emi.is_finite() || config.target_emi <= 0.0 {
        return Err("target_emi must be > 0".to_string());
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err("search bounds must be finite".to_string());
    }
    if config.search_min < 0.0 {
        return Err("search_min must be >= 0".to_string());
    }
    if config.search_max <= config.search_min {
        return Err("search_max must be greater than search_min".to_string());
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err("tolerance must be > 0".to_string());
    }
    if config.max_iterations == 0 {
        return Err("max_iterations must be > 0".to_string());
    }
    match config.goal_type {
        GoalType::MaxPrincipal => {
            if !(0.0..=100.0).contains(&config.annual_rate_percent) {
                return Err("annual_rate_percent must be between 0 and 100".to_string());
            }
        }
        GoalType::ImpliedRate => {
            if !config.principal.is_finite() || config.principal <= 0.0 {
                return Err("principal must be > 0".to_string());
            }
        }
    }
    Ok(())
}
