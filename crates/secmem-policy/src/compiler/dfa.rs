// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Subset construction: NFA → DFA.
//!
//! DFA states are numbered from 1 in breadth-first discovery order,
//! visiting each state's outgoing symbols in ascending byte order. The
//! empty subset is never materialised; it is the sink (state 0).

use std::collections::{BTreeMap, HashMap, VecDeque};

use super::nfa::{Label, Nfa};
use crate::error::PolicyError;
use crate::{SINK_STATE, START_STATE, StateId};

#[derive(Debug)]
pub(crate) struct Dfa {
    /// Outgoing transitions of state `i + 1`, keyed by raw input byte.
    pub(crate) transitions: Vec<BTreeMap<u8, StateId>>,
    /// Whether state `i + 1` contains the NFA accept state.
    pub(crate) accepting: Vec<bool>,
}

impl Dfa {
    pub(crate) fn from_nfa(nfa: &Nfa, max_states: usize) -> Result<Self, PolicyError> {
        let mut ids: HashMap<Vec<usize>, StateId> = HashMap::new();
        let mut subsets: Vec<Vec<usize>> = Vec::new();
        let mut queue: VecDeque<StateId> = VecDeque::new();

        let mut start = vec![nfa.start];
        nfa.epsilon_closure(&mut start);
        ids.insert(start.clone(), START_STATE);
        subsets.push(start);
        queue.push_back(START_STATE);

        let mut transitions = Vec::new();
        let mut accepting = Vec::new();

        while let Some(id) = queue.pop_front() {
            let subset = subsets[(id - START_STATE) as usize].clone();

            let mut moves: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
            for &state in &subset {
                for &(label, to) in &nfa.edges[state] {
                    if let Label::Symbol(byte) = label {
                        moves.entry(byte).or_default().push(to);
                    }
                }
            }

            let mut row = BTreeMap::new();
            for (byte, mut targets) in moves {
                nfa.epsilon_closure(&mut targets);

                let target = match ids.get(&targets) {
                    Some(&existing) => existing,
                    None => {
                        if subsets.len() >= max_states {
                            return Err(PolicyError::TooManyStates {
                                states: subsets.len() + 1,
                                limit: max_states,
                            });
                        }
                        let fresh = START_STATE + subsets.len() as StateId;
                        ids.insert(targets.clone(), fresh);
                        subsets.push(targets);
                        queue.push_back(fresh);
                        fresh
                    }
                };

                debug_assert_ne!(target, SINK_STATE);
                row.insert(byte, target);
            }

            accepting.push(subset.binary_search(&nfa.accept).is_ok());
            transitions.push(row);
        }

        Ok(Self {
            transitions,
            accepting,
        })
    }

    /// Number of materialised states, excluding the sink.
    pub(crate) fn len(&self) -> usize {
        self.transitions.len()
    }
}
