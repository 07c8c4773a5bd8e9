use crate::branching::Brancher;
use crate::branching::BranchingDecision;
use crate::branching::SelectionContext;
use crate::model::positive_ref;
use crate::model::ref_is_positive;
use crate::model::DecisionStrategy;
use crate::model::DomainReductionStrategy;
use crate::model::VariableSelectionStrategy;
use crate::metronome_asserts::metronome_assert_simple;

/// One variable reference together with its selection score.
#[derive(Clone, Copy, Debug)]
struct VarValue {
    reference: i32,
    value: i64,
}

/// A [`Brancher`] walking an ordered list of user-declared [`DecisionStrategy`]s.
///
/// On each call, the first strategy with an unfixed candidate scores its variables (under the
/// declared affine transformations, with negated references flipping min and max), keeps the
/// argmin, and reduces the chosen domain as declared. With randomized search enabled, the
/// winner is drawn uniformly among the candidates within the randomization tolerance of the
/// best score.
///
/// The strategies are owned so that the brancher stays valid independently of the lifetime of
/// the model it was constructed from.
#[derive(Debug)]
pub struct DecisionStrategyBrancher {
    strategies: Vec<DecisionStrategy>,
}

impl DecisionStrategyBrancher {
    pub fn new(strategies: Vec<DecisionStrategy>) -> Self {
        DecisionStrategyBrancher { strategies }
    }
}

impl Brancher for DecisionStrategyBrancher {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<BranchingDecision> {
        let randomize = context.parameters().randomize_search;
        let tolerance = context.parameters().search_randomization_tolerance;

        for strategy in &self.strategies {
            let mut candidate: i32 = 0;
            let mut candidate_value = i64::MAX;
            // The equivalent candidates of a randomized search.
            let mut active_refs: Vec<VarValue> = Vec::new();

            {
                let view = context.view();
                let mut t_index = 0;
                for (i, &reference) in strategy.variables.iter().enumerate() {
                    let var = positive_ref(reference);
                    if view.is_fixed(var) || view.is_currently_free(var) {
                        continue;
                    }

                    let mut coeff: i64 = 1;
                    let mut offset: i64 = 0;
                    while t_index < strategy.transformations.len()
                        && strategy.transformations[t_index].index < i
                    {
                        t_index += 1;
                    }
                    if t_index < strategy.transformations.len()
                        && strategy.transformations[t_index].index == i
                    {
                        coeff = strategy.transformations[t_index].positive_coeff;
                        offset = strategy.transformations[t_index].offset;
                    }

                    let mut lb = view.min(var);
                    let mut ub = view.max(var);
                    if !ref_is_positive(reference) {
                        (lb, ub) = (-view.max(var), -view.min(var));
                    }
                    let value = match strategy.variable_selection_strategy {
                        VariableSelectionStrategy::ChooseFirst => 0,
                        VariableSelectionStrategy::ChooseLowestMin => coeff * lb + offset,
                        VariableSelectionStrategy::ChooseHighestMax => -(coeff * ub + offset),
                        VariableSelectionStrategy::ChooseMinDomainSize => coeff * (ub - lb + 1),
                        VariableSelectionStrategy::ChooseMaxDomainSize => -coeff * (ub - lb + 1),
                    };
                    if value < candidate_value {
                        candidate = reference;
                        candidate_value = value;
                    }

                    if strategy.variable_selection_strategy
                        == VariableSelectionStrategy::ChooseFirst
                        && !randomize
                    {
                        break;
                    } else if randomize && value <= candidate_value + tolerance {
                        active_refs.push(VarValue { reference, value });
                    }
                }
            }

            if candidate_value == i64::MAX {
                continue;
            }
            if randomize {
                metronome_assert_simple!(!active_refs.is_empty());
                let threshold = candidate_value + tolerance;
                active_refs.retain(|entry| entry.value <= threshold);
                let winner = context
                    .random()
                    .generate_usize_in_range(0..active_refs.len());
                candidate = active_refs[winner].reference;
            }

            let mut selection = strategy.domain_reduction_strategy;
            if !ref_is_positive(candidate) {
                selection = match selection {
                    DomainReductionStrategy::SelectMinValue => {
                        DomainReductionStrategy::SelectMaxValue
                    }
                    DomainReductionStrategy::SelectMaxValue => {
                        DomainReductionStrategy::SelectMinValue
                    }
                    DomainReductionStrategy::SelectLowerHalf => {
                        DomainReductionStrategy::SelectUpperHalf
                    }
                    DomainReductionStrategy::SelectUpperHalf => {
                        DomainReductionStrategy::SelectLowerHalf
                    }
                    DomainReductionStrategy::SelectMedianValue => {
                        DomainReductionStrategy::SelectMedianValue
                    }
                };
            }

            let var = positive_ref(candidate);
            let view = context.view();
            let lb = view.min(var);
            let ub = view.max(var);
            return match selection {
                DomainReductionStrategy::SelectMinValue => view.lower_or_equal(var, lb),
                DomainReductionStrategy::SelectMaxValue => view.greater_or_equal(var, ub),
                DomainReductionStrategy::SelectLowerHalf => {
                    view.lower_or_equal(var, lb + (ub - lb) / 2)
                }
                DomainReductionStrategy::SelectUpperHalf => {
                    view.greater_or_equal(var, ub - (ub - lb) / 2)
                }
                DomainReductionStrategy::SelectMedianValue => view.median_value(var),
            };
        }
        None
    }
}
