//! Subset construction: builds a DFA from an NFA by exploring sets of NFA
//! states, keyed by their sorted id sequence.

use std::collections::HashMap;

use crate::nfa::{self, Nfa, NfaStateId, NfaStateKind};
use crate::range::RangeSet;

pub type DfaStateId = usize;

#[derive(Debug, Clone)]
pub struct DfaEdge {
    pub label: RangeSet,
    pub target: DfaStateId,
}

#[derive(Debug, Clone, Default)]
pub struct DfaState {
    pub accept: bool,
    pub edges: Vec<DfaEdge>,
}

#[derive(Debug, Clone)]
pub struct Dfa {
    states: Vec<DfaState>,
    pub start: DfaStateId,
}

impl Dfa {
    pub fn state(&self, id: DfaStateId) -> &DfaState {
        &self.states[id]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

/// Builds the DFA by subset construction. The bookkeeping table maps a
/// sorted `Vec<NfaStateId>` (the NFA-state-set key) to the DFA state built
/// for it, so re-encountering the same set reuses the existing state
/// instead of duplicating it.
pub fn build(nfa: &Nfa) -> Dfa {
    let mut states: Vec<DfaState> = Vec::new();
    let mut sets: Vec<Vec<NfaStateId>> = Vec::new();
    let mut index: HashMap<Vec<NfaStateId>, DfaStateId> = HashMap::new();
    let mut worklist: Vec<DfaStateId> = Vec::new();

    let start_set = sorted(nfa::epsilon_closure(nfa, nfa.start));
    let start_id = new_state(&mut states, &mut sets, &mut index, &start_set, nfa);
    worklist.push(start_id);
    log::trace!("dfa: start state {} over nfa set {:?}", start_id, start_set);

    while let Some(d) = worklist.pop() {
        let n = sets[d].clone();

        let classes = disjoint_transition_alphabet(nfa, &n);
        for class in classes {
            let rep = match class.ranges().first() {
                Some(r) => r.lo,
                None => continue,
            };
            let next_set = sorted(nfa::advance(nfa, &n, rep));
            if next_set.is_empty() {
                continue;
            }

            let (target, already_existed) = match index.get(&next_set) {
                Some(&id) => (id, true),
                None => {
                    let id = new_state(&mut states, &mut sets, &mut index, &next_set, nfa);
                    (id, false)
                }
            };
            add_edge(&mut states[d], class, target);
            if !already_existed {
                worklist.push(target);
                log::trace!("dfa: state {} over nfa set {:?}", target, next_set);
            }
        }
    }

    Dfa {
        states,
        start: start_id,
    }
}

fn new_state(
    states: &mut Vec<DfaState>,
    sets: &mut Vec<Vec<NfaStateId>>,
    index: &mut HashMap<Vec<NfaStateId>, DfaStateId>,
    set: &[NfaStateId],
    nfa: &Nfa,
) -> DfaStateId {
    let id = states.len();
    states.push(DfaState {
        accept: nfa::accepts(nfa, set),
        edges: Vec::new(),
    });
    sets.push(set.to_vec());
    index.insert(set.to_vec(), id);
    id
}

/// Unions `class` into an existing edge to `target` if one exists;
/// otherwise appends a new edge.
fn add_edge(state: &mut DfaState, class: RangeSet, target: DfaStateId) {
    for edge in &mut state.edges {
        if edge.target == target {
            edge.label.add_set(&class);
            return;
        }
    }
    state.edges.push(DfaEdge { label: class, target });
}

fn sorted(mut v: Vec<NfaStateId>) -> Vec<NfaStateId> {
    v.sort_unstable();
    v.dedup();
    v
}

/// Folds the classes of every non-split, non-accept state in `set` via the
/// three-way diff into a list of pairwise-disjoint `RangeSet`s whose union
/// covers the same code points.
fn disjoint_transition_alphabet(nfa: &Nfa, set: &[NfaStateId]) -> Vec<RangeSet> {
    let classes: Vec<&RangeSet> = set
        .iter()
        .filter_map(|&id| match nfa.state(id) {
            NfaStateKind::Consume { class, .. } => Some(class),
            NfaStateKind::Split { .. } | NfaStateKind::Accept => None,
        })
        .collect();
    RangeSet::disjoint_alphabet(classes)
}

/// Whether the DFA accepts `input` in full. Capture groups are not tracked
/// by the DFA backend: the caller always gets an empty list.
pub fn run(dfa: &Dfa, input: &str) -> bool {
    let mut current = dfa.start;
    for c in input.chars() {
        let code = c as u32;
        let state = dfa.state(current);
        match state.edges.iter().find(|e| e.label.contains(code)) {
            Some(edge) => current = edge.target,
            None => return false,
        }
    }
    dfa.state(current).accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn build_dfa(pattern: &str) -> Dfa {
        let ast = parse(pattern).unwrap();
        let nfa = nfa::build(&ast);
        build(&nfa)
    }

    #[test]
    fn literal_match() {
        let dfa = build_dfa("hello");
        assert!(run(&dfa, "hello"));
        assert!(!run(&dfa, "hell"));
    }

    #[test]
    fn alternation_and_star() {
        let dfa = build_dfa(r"(hello|help)(a|b)*world");
        assert!(run(&dfa, "helloaabbaaworld"));
    }

    #[test]
    fn plus_requires_at_least_one() {
        let dfa = build_dfa(r"x(a|b)+y");
        assert!(!run(&dfa, "xy"));
    }

    #[test]
    fn negated_class() {
        let dfa = build_dfa("[^a-z]");
        assert!(run(&dfa, "X"));
        assert!(!run(&dfa, "x"));
    }

    #[test]
    fn double_star_terminates() {
        let dfa = build_dfa("a**");
        assert!(!run(&dfa, "aaaaab"));
        assert!(run(&dfa, "aaaaa"));
    }

    #[test]
    fn edges_within_one_state_are_pairwise_disjoint() {
        let dfa = build_dfa("[a-z]|[m-z0-9]");
        for state in &dfa.states {
            for i in 0..state.edges.len() {
                for j in (i + 1)..state.edges.len() {
                    let (_, both, _) = RangeSet::diff(&state.edges[i].label, &state.edges[j].label);
                    assert!(both.is_empty());
                }
            }
        }
    }

    #[test]
    fn star_requires_at_least_one_nonempty_iteration() {
        let dfa = build_dfa("a*aa*");
        assert!(!run(&dfa, ""));
        assert!(run(&dfa, "a"));
    }
}
