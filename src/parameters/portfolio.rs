use log::warn;

use crate::basic_types::HashMap;
use crate::basic_types::HashSet;
use crate::model::CpModel;
use crate::parameters::SatParameters;
use crate::parameters::SearchBranching;

/// Enumerates a diverse set of parameter variants of `base_params` for parallel workers.
///
/// A table of named strategies is derived from the base configuration (LP levels, core-guided
/// variants, probing, restarts, ...) and extended with the user-provided overrides. The
/// emission order follows `subsolvers` when given (the meta-name `core_or_no_lp` resolves on
/// the objective arity) and a fixed default list otherwise, extended with `extra_subsolvers`
/// and filtered by `ignore_subsolvers`. Strategies incompatible with the model are dropped,
/// each emitted variant is tagged with its name and a deterministic seed, and on models
/// without an objective the remaining worker slots are padded with alternating randomized
/// quick-restart and automatic variants of increasing tolerance.
///
/// The enumeration is a pure function of its inputs.
pub fn get_diverse_set_of_parameters(
    base_params: &SatParameters,
    cp_model: &CpModel,
) -> Vec<SatParameters> {
    let mut strategies: HashMap<String, SatParameters> = HashMap::default();

    let mut insert = |name: &str, params: SatParameters| {
        let _ = strategies.insert(name.to_owned(), params);
    };

    // The base parameters unchanged.
    insert("default", base_params.clone());

    // Lp variations only.
    {
        let mut new_params = base_params.clone();
        new_params.linearization_level = 0;
        insert("no_lp", new_params.clone());
        new_params.linearization_level = 1;
        insert("default_lp", new_params.clone());
        new_params.linearization_level = 2;
        new_params.add_lp_constraints_lazily = false;
        insert("max_lp", new_params);
    }

    // Core-guided variants. The lp is disabled for the plain one since it tends to be faster
    // that way.
    {
        let mut new_params = base_params.clone();
        new_params.search_branching = SearchBranching::AutomaticSearch;
        new_params.optimize_with_core = true;
        new_params.linearization_level = 0;
        insert("core", new_params.clone());
        new_params.linearization_level = 1;
        insert("core_default_lp", new_params.clone());
        new_params.linearization_level = 2;
        insert("core_max_lp", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.search_branching = SearchBranching::AutomaticSearch;
        new_params.optimize_with_core = true;
        new_params.optimize_with_max_hs = true;
        insert("max_hs", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.optimize_with_lb_tree_search = true;
        new_params.linearization_level = 2;
        if base_params.use_dual_scheduling_heuristics {
            new_params.use_overload_checker_in_cumulative = true;
            new_params.use_timetable_edge_finding_in_cumulative = true;
            new_params.use_hard_precedences_in_cumulative = true;
        }
        // Locally derived objective bounds work better for this algorithm.
        new_params.share_objective_bounds = false;
        insert("lb_tree_search", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.search_branching = SearchBranching::AutomaticSearch;
        new_params.use_probing_search = true;
        if base_params.use_dual_scheduling_heuristics {
            new_params.use_overload_checker_in_cumulative = true;
            new_params.use_timetable_edge_finding_in_cumulative = true;
            new_params.use_hard_precedences_in_cumulative = true;
        }
        insert("probing", new_params.clone());
        new_params.linearization_level = 0;
        insert("probing_no_lp", new_params.clone());
        new_params.linearization_level = 2;
        insert("probing_max_lp", new_params);
    }

    // Search variations.
    {
        let mut new_params = base_params.clone();
        new_params.search_branching = SearchBranching::AutomaticSearch;
        insert("auto", new_params.clone());

        new_params.search_branching = SearchBranching::FixedSearch;
        insert("fixed", new_params.clone());

        new_params.search_branching = SearchBranching::PortfolioWithQuickRestartSearch;
        insert("quick_restart", new_params.clone());

        new_params.linearization_level = 0;
        insert("quick_restart_no_lp", new_params.clone());

        new_params.linearization_level = 2;
        insert("quick_restart_max_lp", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.linearization_level = 2;
        new_params.search_branching = SearchBranching::LpSearch;
        if base_params.use_dual_scheduling_heuristics {
            new_params.use_overload_checker_in_cumulative = true;
            new_params.use_timetable_edge_finding_in_cumulative = true;
            new_params.use_hard_precedences_in_cumulative = true;
            new_params.exploit_all_precedences = true;
        }
        insert("reduced_costs", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.linearization_level = 2;
        new_params.search_branching = SearchBranching::PseudoCostSearch;
        new_params.exploit_best_solution = true;
        insert("pseudo_costs", new_params);
    }

    {
        let mut new_params = base_params.clone();
        new_params.boolean_encoding_level = 0;
        insert("less_encoding", new_params);
    }

    // User defined overrides.
    for params in &base_params.subsolver_params {
        let _ = strategies.insert(params.name.clone(), params.clone());
    }

    // A fixed-search worker only makes sense when a strategy is specified or on a scheduling
    // model.
    let use_fixed_strategy =
        !cp_model.search_strategy.is_empty() || cp_model.has_scheduling_constraints();

    let mut names: Vec<String> = Vec::new();
    if base_params.subsolvers.is_empty() {
        for name in [
            "default_lp",
            "fixed",
            "less_encoding",
            "no_lp",
            "max_lp",
            "core",
            "reduced_costs",
            "pseudo_costs",
            "quick_restart",
            "quick_restart_no_lp",
            "lb_tree_search",
            "probing",
        ] {
            names.push(name.to_owned());
        }
    } else {
        for name in &base_params.subsolvers {
            // At parameter-setting time the objective may not be expanded yet, so the choice
            // between core and no_lp is deferred to this meta-name.
            if name == "core_or_no_lp" {
                let has_multi_term_objective = cp_model
                    .objective
                    .as_ref()
                    .is_some_and(|objective| objective.variables.len() > 1);
                if has_multi_term_objective {
                    names.push("core".to_owned());
                } else {
                    names.push("no_lp".to_owned());
                }
            } else {
                names.push(name.clone());
            }
        }
    }

    for name in &base_params.extra_subsolvers {
        names.push(name.clone());
    }

    let to_ignore: HashSet<&String> = base_params.ignore_subsolvers.iter().collect();
    names.retain(|name| !to_ignore.contains(name));

    // Instantiate the named strategies with their seed.
    let mut result: Vec<SatParameters> = Vec::new();
    for name in names {
        let Some(strategy) = strategies.get(&name) else {
            warn!("unknown parameter name '{name}'");
            continue;
        };
        let mut params = strategy.clone();

        if !use_fixed_strategy && params.search_branching == SearchBranching::FixedSearch {
            continue;
        }
        if let Some(objective) = &cp_model.objective {
            if objective.variables.len() <= 1 && params.optimize_with_core {
                continue;
            }
            if name == "less_encoding" {
                continue;
            }
            if params.optimize_with_lb_tree_search && params.interleave_search {
                continue;
            }
        } else {
            if params.optimize_with_lb_tree_search {
                continue;
            }
            if params.optimize_with_core {
                continue;
            }
            if params.search_branching == SearchBranching::LpSearch {
                continue;
            }
            if params.search_branching == SearchBranching::PseudoCostSearch {
                continue;
            }
        }

        params.name = name;
        params.random_seed = base_params.random_seed + result.len() as i64 + 1;
        result.push(params);
    }

    if cp_model.has_objective() {
        // The extra workers run LNS; keep at least min_num_lns_workers of them.
        let target = 1.max(
            base_params
                .num_workers
                .saturating_sub(base_params.min_num_lns_workers),
        );
        if !base_params.interleave_search && result.len() > target {
            result.truncate(target);
        }
    } else {
        // Without an objective the remaining worker slots are filled with randomized fixed
        // search; strategies which do not need a full worker keep one slot free.
        let mut target = base_params.num_workers;
        if !base_params.interleave_search
            && (base_params.use_rins_lns || base_params.use_feasibility_pump)
        {
            target = 1.max(base_params.num_workers.saturating_sub(1));
        }
        if !base_params.interleave_search && result.len() > target {
            result.truncate(target);
        }

        let mut index: i64 = 1;
        while result.len() < target {
            let mut new_params = base_params.clone();
            if index % 2 == 0 {
                new_params.search_branching = SearchBranching::PortfolioWithQuickRestartSearch;
                new_params.name = format!("random_quick_restart_{index}");
            } else {
                new_params.search_branching = if cp_model.search_strategy.is_empty() {
                    SearchBranching::AutomaticSearch
                } else {
                    SearchBranching::FixedSearch
                };
                new_params.name = format!("random_{index}");
            }
            new_params.randomize_search = true;
            new_params.search_randomization_tolerance = index;
            new_params.random_seed = base_params.random_seed + result.len() as i64 + 1;
            result.push(new_params);
            index += 1;
        }
    }

    result
}
