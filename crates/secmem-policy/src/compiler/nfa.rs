// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Thompson construction: AST → non-deterministic automaton.

use super::parser::Ast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    Epsilon,
    Symbol(u8),
}

/// A non-deterministic automaton with a single start and accept state.
#[derive(Debug)]
pub(crate) struct Nfa {
    /// Outgoing edges per state.
    pub(crate) edges: Vec<Vec<(Label, usize)>>,
    pub(crate) start: usize,
    pub(crate) accept: usize,
}

#[derive(Clone, Copy)]
struct Fragment {
    start: usize,
    accept: usize,
}

#[derive(Default)]
struct Builder {
    edges: Vec<Vec<(Label, usize)>>,
}

impl Builder {
    fn state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn edge(&mut self, from: usize, label: Label, to: usize) {
        self.edges[from].push((label, to));
    }

    fn fragment(&mut self, ast: &Ast) -> Fragment {
        match ast {
            Ast::Symbol(byte) => {
                let start = self.state();
                let accept = self.state();
                self.edge(start, Label::Symbol(*byte), accept);
                Fragment { start, accept }
            }
            Ast::Concatenation(left, right) => {
                let left = self.fragment(left);
                let right = self.fragment(right);
                self.edge(left.accept, Label::Epsilon, right.start);
                Fragment {
                    start: left.start,
                    accept: right.accept,
                }
            }
            Ast::Alternation(left, right) => {
                let left = self.fragment(left);
                let right = self.fragment(right);
                let start = self.state();
                let accept = self.state();
                self.edge(start, Label::Epsilon, left.start);
                self.edge(start, Label::Epsilon, right.start);
                self.edge(left.accept, Label::Epsilon, accept);
                self.edge(right.accept, Label::Epsilon, accept);
                Fragment { start, accept }
            }
            Ast::Star(inner) => {
                let inner = self.fragment(inner);
                let start = self.state();
                let accept = self.state();
                self.edge(start, Label::Epsilon, inner.start);
                self.edge(start, Label::Epsilon, accept);
                self.edge(inner.accept, Label::Epsilon, inner.start);
                self.edge(inner.accept, Label::Epsilon, accept);
                Fragment { start, accept }
            }
            // Union with the automaton accepting only the empty word.
            Ast::Optional(inner) => {
                let inner = self.fragment(inner);
                let start = self.state();
                let accept = self.state();
                self.edge(start, Label::Epsilon, inner.start);
                self.edge(start, Label::Epsilon, accept);
                self.edge(inner.accept, Label::Epsilon, accept);
                Fragment { start, accept }
            }
        }
    }
}

impl Nfa {
    pub(crate) fn from_ast(ast: &Ast) -> Self {
        let mut builder = Builder::default();
        let Fragment { start, accept } = builder.fragment(ast);

        Self {
            edges: builder.edges,
            start,
            accept,
        }
    }

    /// Extends `states` with every state reachable through epsilon edges.
    pub(crate) fn epsilon_closure(&self, states: &mut Vec<usize>) {
        let mut seen = vec![false; self.edges.len()];
        let mut stack = Vec::with_capacity(states.len());

        for &state in states.iter() {
            if !seen[state] {
                seen[state] = true;
                stack.push(state);
            }
        }

        while let Some(state) = stack.pop() {
            for &(label, to) in &self.edges[state] {
                if label == Label::Epsilon && !seen[to] {
                    seen[to] = true;
                    stack.push(to);
                }
            }
        }

        states.clear();
        states.extend(
            seen.iter()
                .enumerate()
                .filter_map(|(state, &reached)| reached.then_some(state)),
        );
    }
}
