use log::info;

use crate::branching::Brancher;
use crate::branching::BranchingDecision;
use crate::branching::SelectionContext;
use crate::engine::variables::IntegerVariable;
use crate::model::CpModel;
use crate::model::ModelMapping;

/// Wraps a [`Brancher`] with logging: every decision is reported together with the integer
/// literal a Boolean decision encodes, plus the domain deltas of the named model variables
/// since the previous call.
pub struct InstrumentedSearchStrategy {
    inner: Box<dyn Brancher>,
    /// Named model variables with an integer representation, sorted by name.
    display: Vec<DisplayedVariable>,
}

struct DisplayedVariable {
    name: String,
    var: IntegerVariable,
    old_domain: (i64, i64),
}

/// Builds the instrumentation wrapper for the given strategy.
pub fn instrument_search_strategy(
    model: &CpModel,
    mapping: &ModelMapping,
    inner: Box<dyn Brancher>,
) -> InstrumentedSearchStrategy {
    let mut display = Vec::new();
    for (index, description) in model.variables.iter().enumerate() {
        if description.name.is_empty() {
            continue;
        }
        if let Some(var) = mapping.integer(index) {
            display.push(DisplayedVariable {
                name: description.name.clone(),
                var,
                old_domain: (description.lower_bound, description.upper_bound),
            });
        }
    }
    display.sort_by(|a, b| a.name.cmp(&b.name));

    InstrumentedSearchStrategy { inner, display }
}

impl std::fmt::Debug for InstrumentedSearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedSearchStrategy").finish()
    }
}

impl Brancher for InstrumentedSearchStrategy {
    fn next_decision(&mut self, context: &mut SelectionContext) -> Option<BranchingDecision> {
        let decision = self.inner.next_decision(context)?;

        match decision {
            BranchingDecision::Boolean(literal) => {
                info!("Boolean decision {literal}");
                if let Some((var, value)) = context.encoder().decode_literal(literal) {
                    info!(" - associated with [{var} == {value}]");
                }
            }
            BranchingDecision::Integer(integer_literal) => {
                info!("Integer decision {integer_literal}");
            }
        }

        let level = context.boolean_trail().get_decision_level();
        let mut to_display = format!("Diff since last call, level={level}\n");
        for displayed in &mut self.display {
            let new_domain = (
                context.integer_trail().lower_bound(displayed.var),
                context.integer_trail().upper_bound(displayed.var),
            );
            if new_domain != displayed.old_domain {
                to_display.push_str(&format!(
                    "{} [{},{}] -> [{},{}]\n",
                    displayed.name,
                    displayed.old_domain.0,
                    displayed.old_domain.1,
                    new_domain.0,
                    new_domain.1
                ));
                displayed.old_domain = new_domain;
            }
        }
        info!("{to_display}");

        Some(decision)
    }
}
