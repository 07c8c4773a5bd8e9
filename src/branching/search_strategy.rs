use crate::branching::Brancher;
use crate::branching::DecisionStrategyBrancher;
use crate::branching::FirstUnassignedVarAtItsMin;
use crate::branching::SchedulingSearchHeuristic;
use crate::branching::SequentialSearch;
use crate::engine::variables::IntegerVariable;
use crate::model::positive_ref;
use crate::model::Constraint;
use crate::model::CpModel;
use crate::model::ModelMapping;
use crate::parameters::SatParameters;
use crate::parameters::SearchBranching;

/// The brancher walking the user-declared decision strategies of the model.
pub fn construct_user_search_strategy(model: &CpModel) -> DecisionStrategyBrancher {
    DecisionStrategyBrancher::new(model.search_strategy.clone())
}

/// The full fixed-search chain: the user strategy (unless partial fixed search asked to skip
/// it), then the scheduling heuristic when the model contains scheduling constraints, and
/// finally first-unassigned-at-minimum over all integer variables when everything must be
/// instantiated. The objective variable is placed first in the tail heuristic so that the
/// search is biased towards small objective values.
pub fn construct_fixed_search_strategy(
    model: &CpModel,
    mapping: &ModelMapping,
    objective_var: Option<IntegerVariable>,
    parameters: &SatParameters,
) -> SequentialSearch {
    let mut heuristics: Vec<Box<dyn Brancher>> = Vec::new();

    if parameters.search_branching != SearchBranching::PartialFixedSearch {
        heuristics.push(Box::new(construct_user_search_strategy(model)));
    }

    if model.has_scheduling_constraints() {
        heuristics.push(Box::new(SchedulingSearchHeuristic::new(
            scheduling_start_variables(model, mapping),
        )));
    }

    if parameters.instantiate_all_variables {
        let mut decisions = Vec::new();
        for var in mapping.integer_variables() {
            // Make sure the objective is tried at its lowest value first.
            match objective_var {
                Some(objective) if var == objective.negation() => decisions.push(objective),
                _ => decisions.push(var),
            }
        }
        heuristics.push(Box::new(FirstUnassignedVarAtItsMin::new(decisions)));
    }

    SequentialSearch::new(heuristics)
}

/// The integer variables referenced by the scheduling constraints, in model order.
fn scheduling_start_variables(model: &CpModel, mapping: &ModelMapping) -> Vec<IntegerVariable> {
    let mut start_variables = Vec::new();
    for constraint in &model.constraints {
        let references = match constraint {
            Constraint::NoOverlap { variables } => variables,
            Constraint::Cumulative { variables } => variables,
        };
        for &reference in references {
            if let Some(var) = mapping.integer(positive_ref(reference)) {
                start_variables.push(var);
            }
        }
    }
    start_variables
}
