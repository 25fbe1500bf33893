//! Thompson-style NFA construction and on-line simulation.
//!
//! States live in a single arena (`Vec<NfaStateKind>`) indexed by
//! `NfaStateId`: the graph is cyclic (Star/Plus loop back), which rules out
//! simple `Rc`-owned nodes without weak edges.

use std::collections::HashSet;

use crate::ast::AstNode;
use crate::range::RangeSet;

pub type NfaStateId = usize;

/// One of the three state shapes this automaton needs. A proper tagged
/// variant so split states can't carry a class and accept states can't
/// carry successors, unlike a boolean-flag record would.
#[derive(Debug, Clone)]
pub enum NfaStateKind {
    /// Consumes one character matching `class`, then goes to `next`.
    Consume {
        class: RangeSet,
        caps: Vec<usize>,
        next: NfaStateId,
    },
    /// An epsilon branch point: two successors, no label.
    Split { next1: NfaStateId, next2: NfaStateId },
    /// The unique terminal state.
    Accept,
}

/// An owned NFA graph, reachable in full from `start`.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<NfaStateKind>,
    pub start: NfaStateId,
}

impl Nfa {
    pub fn state(&self, id: NfaStateId) -> &NfaStateKind {
        &self.states[id]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }
}

/// During construction, a fragment is an entry state plus a list of dangling
/// out-pointers (arena indices of the `next`/`next1`/`next2` slot that still
/// needs patching to the downstream entry). A fragment is consumed exactly
/// once by whichever combinator builds on top of it.
struct Frag {
    entry: NfaStateId,
    /// Each dangling pointer names a state and which successor slot of that
    /// state is still unset (`None` placeholder at build time).
    dangling: Vec<Dangling>,
}

#[derive(Clone, Copy)]
enum Dangling {
    ConsumeNext(NfaStateId),
    SplitNext1(NfaStateId),
}

struct Builder {
    states: Vec<NfaStateKind>,
}

impl Builder {
    fn new() -> Self {
        Builder { states: Vec::new() }
    }

    fn push(&mut self, kind: NfaStateKind) -> NfaStateId {
        self.states.push(kind);
        self.states.len() - 1
    }

    fn patch(&mut self, dangling: &[Dangling], target: NfaStateId) {
        for d in dangling {
            match *d {
                Dangling::ConsumeNext(id) => {
                    if let NfaStateKind::Consume { next, .. } = &mut self.states[id] {
                        *next = target;
                    }
                }
                Dangling::SplitNext1(id) => {
                    if let NfaStateKind::Split { next1, .. } = &mut self.states[id] {
                        *next1 = target;
                    }
                }
            }
        }
    }

    /// Structural recursion on the AST, one fragment-building recipe per
    /// node kind. `next` slots are provisionally set to the entry's own id
    /// (any valid placeholder) and corrected by a later `patch` call.
    fn build(&mut self, node: &AstNode) -> Frag {
        match node {
            AstNode::Class(rs, caps) => {
                let id = self.push(NfaStateKind::Consume {
                    class: rs.clone(),
                    caps: caps.clone(),
                    next: 0,
                });
                log::trace!("nfa: class state {} caps={:?} class={}", id, caps, rs);
                Frag {
                    entry: id,
                    dangling: vec![Dangling::ConsumeNext(id)],
                }
            }
            AstNode::Concat(l, r) => {
                let left = self.build(l);
                let right = self.build(r);
                self.patch(&left.dangling, right.entry);
                Frag {
                    entry: left.entry,
                    dangling: right.dangling,
                }
            }
            AstNode::Alt(l, r) => {
                let left = self.build(l);
                let right = self.build(r);
                let split = self.push(NfaStateKind::Split {
                    next1: left.entry,
                    next2: right.entry,
                });
                let mut dangling = left.dangling;
                dangling.extend(right.dangling);
                Frag {
                    entry: split,
                    dangling,
                }
            }
            AstNode::Star(x) => {
                // split.next2 -> x.entry (take the loop), split.next1 -> downstream (skip it).
                let inner = self.build(x);
                let split = self.push(NfaStateKind::Split {
                    next1: 0,
                    next2: inner.entry,
                });
                self.patch(&inner.dangling, split);
                log::trace!("nfa: star split {} wrapping entry {}", split, inner.entry);
                Frag {
                    entry: split,
                    dangling: vec![Dangling::SplitNext1(split)],
                }
            }
            AstNode::Plus(x) => {
                // Like Star, but the fragment's entry is the body itself: the
                // first pass through is mandatory.
                let inner = self.build(x);
                let split = self.push(NfaStateKind::Split {
                    next1: 0,
                    next2: inner.entry,
                });
                self.patch(&inner.dangling, split);
                log::trace!("nfa: plus split {} wrapping entry {}", split, inner.entry);
                Frag {
                    entry: inner.entry,
                    dangling: vec![Dangling::SplitNext1(split)],
                }
            }
            AstNode::Opt(x) => {
                let inner = self.build(x);
                let split = self.push(NfaStateKind::Split {
                    next1: 0,
                    next2: inner.entry,
                });
                let mut dangling = inner.dangling;
                dangling.push(Dangling::SplitNext1(split));
                Frag {
                    entry: split,
                    dangling,
                }
            }
        }
    }
}

/// Builds the full NFA graph for `ast`: structural recursion produces a
/// fragment, then all top-level dangling pointers are patched to a freshly
/// created, unique accept state.
pub fn build(ast: &AstNode) -> Nfa {
    let mut b = Builder::new();
    let frag = b.build(ast);
    let accept = b.push(NfaStateKind::Accept);
    b.patch(&frag.dangling, accept);
    log::trace!("nfa: built {} states, start={}, accept={}", b.states.len(), frag.entry, accept);
    Nfa {
        states: b.states,
        start: frag.entry,
    }
}

/// Reachable-from-`seed` set of consuming/accept states via epsilon-only
/// (split) transitions, depth-first, deduplicated. Split states themselves
/// never appear in the output; only the consuming/accept states they lead
/// to make up a frontier.
pub fn epsilon_closure(nfa: &Nfa, seed: NfaStateId) -> Vec<NfaStateId> {
    let mut visited: HashSet<NfaStateId> = HashSet::new();
    let mut out = Vec::new();
    closure_walk(nfa, seed, &mut visited, &mut out);
    out
}

/// Like [`epsilon_closure`] but seeds from several states at once (used by
/// [`advance`], where each matching consuming state's successor must be
/// closed over and the results deduplicated together).
pub fn epsilon_closure_many(nfa: &Nfa, seeds: impl IntoIterator<Item = NfaStateId>) -> Vec<NfaStateId> {
    let mut visited: HashSet<NfaStateId> = HashSet::new();
    let mut out = Vec::new();
    for seed in seeds {
        closure_walk(nfa, seed, &mut visited, &mut out);
    }
    out
}

fn closure_walk(nfa: &Nfa, id: NfaStateId, visited: &mut HashSet<NfaStateId>, out: &mut Vec<NfaStateId>) {
    if !visited.insert(id) {
        return;
    }
    match nfa.state(id) {
        NfaStateKind::Split { next1, next2 } => {
            closure_walk(nfa, *next1, visited, out);
            closure_walk(nfa, *next2, visited, out);
        }
        NfaStateKind::Consume { .. } | NfaStateKind::Accept => out.push(id),
    }
}

/// Computes the next frontier after consuming `c`: every consuming state in
/// `states` whose class contains `c` contributes its successor's
/// epsilon-closure, all deduplicated together.
pub fn advance(nfa: &Nfa, states: &[NfaStateId], c: u32) -> Vec<NfaStateId> {
    let mut seeds = Vec::new();
    for &id in states {
        if let NfaStateKind::Consume { class, next, .. } = nfa.state(id) {
            if class.contains(c) {
                seeds.push(*next);
            }
        }
    }
    epsilon_closure_many(nfa, seeds)
}

pub fn accepts(nfa: &Nfa, states: &[NfaStateId]) -> bool {
    states.iter().any(|&id| matches!(nfa.state(id), NfaStateKind::Accept))
}

/// The result of a whole-string NFA match: whether it matched, plus the
/// captured substring for each group id `1..=max_group_seen` (empty string
/// for an id that was declared but never filled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfaMatch {
    pub matched: bool,
    pub groups: Vec<String>,
}

/// Runs the simulator over `input`, accumulating captured text per the
/// greedy rule: before each character is consumed, the capture ids common
/// to every non-accept frontier state receive it.
pub fn run(nfa: &Nfa, input: &str) -> NfaMatch {
    let mut frontier = epsilon_closure(nfa, nfa.start);
    let mut captures: Vec<String> = Vec::new();
    let mut max_group_seen = 0usize;

    for c in input.chars() {
        if frontier.is_empty() {
            return NfaMatch { matched: false, groups: Vec::new() };
        }

        for &id in &frontier {
            if let NfaStateKind::Consume { caps, .. } = nfa.state(id) {
                if let Some(&m) = caps.iter().max() {
                    max_group_seen = max_group_seen.max(m);
                }
            }
        }

        let common = common_active_caps(nfa, &frontier);
        if captures.len() < max_group_seen {
            captures.resize(max_group_seen, String::new());
        }
        for &id in &common {
            captures[id - 1].push(c);
        }

        frontier = advance(nfa, &frontier, c as u32);
    }

    if frontier.is_empty() {
        return NfaMatch { matched: false, groups: Vec::new() };
    }

    if captures.len() < max_group_seen {
        captures.resize(max_group_seen, String::new());
    }

    NfaMatch {
        matched: accepts(nfa, &frontier),
        groups: if accepts(nfa, &frontier) { captures } else { Vec::new() },
    }
}

/// The capture ids shared by every consuming state in the frontier (the
/// accept state, having no caps of its own, contributes nothing and is
/// skipped). A disagreement across branches is logged, not an error; the
/// shared subset is used regardless.
fn common_active_caps(nfa: &Nfa, frontier: &[NfaStateId]) -> Vec<usize> {
    let mut sets: Vec<&[usize]> = Vec::new();
    for &id in frontier {
        if let NfaStateKind::Consume { caps, .. } = nfa.state(id) {
            sets.push(caps.as_slice());
        }
    }
    if sets.is_empty() {
        return Vec::new();
    }
    let first: HashSet<usize> = sets[0].iter().copied().collect();
    let mut common = first.clone();
    let mut disagreement = false;
    for caps in &sets[1..] {
        let this: HashSet<usize> = caps.iter().copied().collect();
        if this != first {
            disagreement = true;
        }
        common = common.intersection(&this).copied().collect();
    }
    if disagreement {
        log::warn!(
            "nfa: frontier capture ids disagree across branches ({:?}); using common subset {:?}",
            sets,
            common
        );
    }
    let mut out: Vec<usize> = common.into_iter().collect();
    out.sort_unstable();
    out
}
