/// How the search of a worker takes its decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchBranching {
    /// Conflict-driven heuristics decide everything.
    #[default]
    AutomaticSearch,
    /// Follow the fixed search strategy (user strategy plus fallbacks).
    FixedSearch,
    /// Like [`SearchBranching::FixedSearch`] but without the user strategy.
    PartialFixedSearch,
    /// Alternate between automatic and fixed search with quick restarts.
    PortfolioWithQuickRestartSearch,
    /// Branch on the reduced costs of the linear relaxation.
    LpSearch,
    /// Branch following pseudo-cost estimates.
    PseudoCostSearch,
}

/// The tuning knobs of one solver worker. The portfolio enumeration (see
/// [`get_diverse_set_of_parameters`](crate::parameters::get_diverse_set_of_parameters))
/// derives named variants of a base configuration by toggling these fields.
#[derive(Clone, Debug, PartialEq)]
pub struct SatParameters {
    pub name: String,
    pub search_branching: SearchBranching,

    /// 0 disables the linear relaxation, 1 linearises the cheap constraints, 2 everything.
    pub linearization_level: i32,
    pub add_lp_constraints_lazily: bool,
    pub boolean_encoding_level: i32,

    pub optimize_with_core: bool,
    pub optimize_with_max_hs: bool,
    pub optimize_with_lb_tree_search: bool,
    pub use_probing_search: bool,
    pub exploit_best_solution: bool,
    pub share_objective_bounds: bool,

    pub use_dual_scheduling_heuristics: bool,
    pub use_overload_checker_in_cumulative: bool,
    pub use_timetable_edge_finding_in_cumulative: bool,
    pub use_hard_precedences_in_cumulative: bool,
    pub exploit_all_precedences: bool,

    pub randomize_search: bool,
    pub search_randomization_tolerance: i64,
    pub instantiate_all_variables: bool,

    pub random_seed: i64,
    pub num_workers: usize,
    pub min_num_lns_workers: usize,
    pub interleave_search: bool,
    pub use_rins_lns: bool,
    pub use_feasibility_pump: bool,

    /// The worker names to run, in order; empty means the default portfolio.
    pub subsolvers: Vec<String>,
    pub extra_subsolvers: Vec<String>,
    pub ignore_subsolvers: Vec<String>,
    /// Named parameter overrides which extend or replace entries of the strategy table.
    pub subsolver_params: Vec<SatParameters>,
}

impl Default for SatParameters {
    fn default() -> Self {
        SatParameters {
            name: String::new(),
            search_branching: SearchBranching::default(),
            linearization_level: 1,
            add_lp_constraints_lazily: true,
            boolean_encoding_level: 1,
            optimize_with_core: false,
            optimize_with_max_hs: false,
            optimize_with_lb_tree_search: false,
            use_probing_search: false,
            exploit_best_solution: false,
            share_objective_bounds: true,
            use_dual_scheduling_heuristics: false,
            use_overload_checker_in_cumulative: false,
            use_timetable_edge_finding_in_cumulative: false,
            use_hard_precedences_in_cumulative: false,
            exploit_all_precedences: false,
            randomize_search: false,
            search_randomization_tolerance: 0,
            instantiate_all_variables: false,
            random_seed: 1,
            num_workers: 0,
            min_num_lns_workers: 2,
            interleave_search: false,
            use_rins_lns: true,
            use_feasibility_pump: true,
            subsolvers: Vec::new(),
            extra_subsolvers: Vec::new(),
            ignore_subsolvers: Vec::new(),
            subsolver_params: Vec::new(),
        }
    }
}
