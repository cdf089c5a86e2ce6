//! Requirement expressions and their evaluator.
//!
//! A [`Predicate`] is a tagged tree of thresholds, boolean combinators and
//! quantifiers over groups. Evaluation is pure and short-circuits left to right;
//! the skipped work is observable through [`Predicate::evaluate_traced`].
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::state::CollectionState;

/// How a quantified group succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    /// At least `k` members pass; stops at the k-th success.
    Any { k: usize },
    /// Every member passes; stops at the first failure.
    All,
}

impl Quantifier {
    /// `Any` with the default of a single member.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any { k: 1 }
    }

    #[must_use]
    pub const fn at_least(k: usize) -> Self {
        Self::Any { k }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Always,
    Never,
    Threshold { item: String, count: u32 },
    AllOf { terms: Vec<Predicate> },
    AnyOf { terms: Vec<Predicate> },
    Not { term: Box<Predicate> },
    Quantified { mode: Quantifier, members: Vec<Predicate> },
}

/// One threshold probe made during a traced evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEntry {
    pub item: String,
    pub required: u32,
    pub held: u32,
    pub passed: bool,
}

/// Ordered record of the thresholds an evaluation actually probed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    #[must_use]
    pub fn probed(&self, item: &str) -> bool {
        self.entries.iter().any(|entry| entry.item == item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

trait Probe {
    fn record(&mut self, item: &str, required: u32, held: u32, passed: bool);
}

impl Probe for () {
    fn record(&mut self, _item: &str, _required: u32, _held: u32, _passed: bool) {}
}

impl Probe for Trace {
    fn record(&mut self, item: &str, required: u32, held: u32, passed: bool) {
        self.entries.push(TraceEntry {
            item: item.to_string(),
            required,
            held,
            passed,
        });
    }
}

impl Predicate {
    /// `count` copies of `item`. A zero count is always satisfied.
    #[must_use]
    pub fn threshold(item: impl Into<String>, count: u32) -> Self {
        if count == 0 {
            return Self::Always;
        }
        Self::Threshold {
            item: item.into(),
            count,
        }
    }

    /// Every term holds; empty is true.
    #[must_use]
    pub fn all_of(terms: impl IntoIterator<Item = Self>) -> Self {
        Self::AllOf {
            terms: terms.into_iter().collect(),
        }
    }

    /// Some term holds; empty is false.
    #[must_use]
    pub fn any_of(terms: impl IntoIterator<Item = Self>) -> Self {
        Self::AnyOf {
            terms: terms.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn negate(term: Self) -> Self {
        Self::Not {
            term: Box::new(term),
        }
    }

    /// One copy of each item.
    #[must_use]
    pub fn has_all<S: AsRef<str>>(items: &[S]) -> Self {
        Self::all_of(items.iter().map(|item| Self::threshold(item.as_ref(), 1)))
    }

    /// One copy of any item.
    #[must_use]
    pub fn has_any<S: AsRef<str>>(items: &[S]) -> Self {
        Self::any_of(items.iter().map(|item| Self::threshold(item.as_ref(), 1)))
    }

    /// Apply `per_member` to every group member and combine under `mode`.
    #[must_use]
    pub fn quantified<T, I, F>(members: I, per_member: F, mode: Quantifier) -> Self
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Self,
    {
        Self::Quantified {
            mode,
            members: members.into_iter().map(per_member).collect(),
        }
    }

    #[must_use]
    pub fn evaluate<S: CollectionState + ?Sized>(&self, state: &S) -> bool {
        self.eval(state, &mut ())
    }

    /// Evaluate while recording every threshold probe in `trace`.
    pub fn evaluate_traced<S: CollectionState + ?Sized>(
        &self,
        state: &S,
        trace: &mut Trace,
    ) -> bool {
        self.eval(state, trace)
    }

    fn eval<S: CollectionState + ?Sized, P: Probe>(&self, state: &S, probe: &mut P) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Threshold { item, count } => {
                let held = state.count(item);
                let passed = held >= *count;
                probe.record(item, *count, held, passed);
                passed
            }
            Self::AllOf { terms } => terms.iter().all(|term| term.eval(state, probe)),
            Self::AnyOf { terms } => terms.iter().any(|term| term.eval(state, probe)),
            Self::Not { term } => !term.eval(state, probe),
            Self::Quantified { mode, members } => match *mode {
                Quantifier::All => members.iter().all(|member| member.eval(state, probe)),
                Quantifier::Any { k } => {
                    if k == 0 {
                        return true;
                    }
                    let mut passed = 0;
                    for member in members {
                        if member.eval(state, probe) {
                            passed += 1;
                            if passed >= k {
                                return true;
                            }
                        }
                    }
                    false
                }
            },
        }
    }

    #[must_use]
    pub const fn is_trivially_true(&self) -> bool {
        matches!(self, Self::Always)
    }

    /// Fold constants out of the tree. Quantified groups keep their shape so
    /// their evaluation order is preserved.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::AllOf { terms } => {
                let mut kept = Vec::with_capacity(terms.len());
                for term in terms {
                    match term.simplify() {
                        Self::Always => {}
                        Self::Never => return Self::Never,
                        Self::AllOf { terms: nested } => kept.extend(nested),
                        other => kept.push(other),
                    }
                }
                match kept.len() {
                    0 => Self::Always,
                    1 => kept.pop().unwrap_or(Self::Always),
                    _ => Self::AllOf { terms: kept },
                }
            }
            Self::AnyOf { terms } => {
                let mut kept = Vec::with_capacity(terms.len());
                for term in terms {
                    match term.simplify() {
                        Self::Never => {}
                        Self::Always => return Self::Always,
                        Self::AnyOf { terms: nested } => kept.extend(nested),
                        other => kept.push(other),
                    }
                }
                match kept.len() {
                    0 => Self::Never,
                    1 => kept.pop().unwrap_or(Self::Never),
                    _ => Self::AnyOf { terms: kept },
                }
            }
            Self::Not { term } => match term.simplify() {
                Self::Always => Self::Never,
                Self::Never => Self::Always,
                Self::Not { term: inner } => *inner,
                other => Self::negate(other),
            },
            Self::Quantified { mode, members } => {
                let members: Vec<Self> = members.into_iter().map(Self::simplify).collect();
                match mode {
                    Quantifier::Any { k: 0 } => Self::Always,
                    Quantifier::Any { k } if k > members.len() => Self::Never,
                    Quantifier::All if members.is_empty() => Self::Always,
                    _ => Self::Quantified { mode, members },
                }
            }
            leaf => leaf,
        }
    }

    /// Every item name the predicate can probe.
    pub fn collect_items(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Always | Self::Never => {}
            Self::Threshold { item, .. } => {
                out.insert(item.clone());
            }
            Self::AllOf { terms } | Self::AnyOf { terms } => {
                for term in terms {
                    term.collect_items(out);
                }
            }
            Self::Not { term } => term.collect_items(out),
            Self::Quantified { members, .. } => {
                for member in members {
                    member.collect_items(out);
                }
            }
        }
    }

    /// True when the tree contains no negation, so more items never hurt.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        match self {
            Self::Always | Self::Never | Self::Threshold { .. } => true,
            Self::AllOf { terms } | Self::AnyOf { terms } => terms.iter().all(Self::is_monotone),
            Self::Not { .. } => false,
            Self::Quantified { members, .. } => members.iter().all(Self::is_monotone),
        }
    }

    const fn is_compound(&self) -> bool {
        match self {
            Self::AllOf { terms } | Self::AnyOf { terms } => terms.len() > 1,
            Self::Quantified { .. } => true,
            _ => false,
        }
    }
}

impl std::ops::Not for Predicate {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::negate(self)
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &Predicate) -> fmt::Result {
    if term.is_compound() {
        write!(f, "({term})")
    } else {
        write!(f, "{term}")
    }
}

fn write_joined<'a, I>(
    f: &mut fmt::Formatter<'_>,
    terms: I,
    joiner: &str,
    empty: &str,
) -> fmt::Result
where
    I: IntoIterator<Item = &'a Predicate>,
{
    let mut wrote = false;
    for term in terms {
        if wrote {
            f.write_str(joiner)?;
        }
        write_term(f, term)?;
        wrote = true;
    }
    if !wrote {
        f.write_str(empty)?;
    }
    Ok(())
}

/// Renders `k`-of-`n` as an OR over every `k`-sized AND group.
fn write_at_least(f: &mut fmt::Formatter<'_>, members: &[Predicate], k: usize) -> fmt::Result {
    if k == 0 {
        return f.write_str("true");
    }
    if k > members.len() {
        return f.write_str("false");
    }
    if k == 1 {
        return write_joined(f, members, " or ", "false");
    }
    let mut picks: Vec<usize> = (0..k).collect();
    let mut first = true;
    loop {
        if !first {
            f.write_str(" or ")?;
        }
        first = false;
        f.write_str("(")?;
        write_joined(f, picks.iter().map(|&i| &members[i]), " and ", "true")?;
        f.write_str(")")?;

        // Advance to the next combination in lexicographic order.
        let mut slot = k;
        while slot > 0 && picks[slot - 1] == members.len() - k + slot - 1 {
            slot -= 1;
        }
        if slot == 0 {
            return Ok(());
        }
        picks[slot - 1] += 1;
        for next in slot..k {
            picks[next] = picks[next - 1] + 1;
        }
    }
}

/// Host requires-string dialect: `|Item|`, `|Item:N|`, `and`, `or`, parentheses.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("true"),
            Self::Never => f.write_str("false"),
            Self::Threshold { item, count: 1 } => write!(f, "|{item}|"),
            Self::Threshold { item, count } => write!(f, "|{item}:{count}|"),
            Self::AllOf { terms } => write_joined(f, terms, " and ", "true"),
            Self::AnyOf { terms } => write_joined(f, terms, " or ", "false"),
            Self::Not { term } => write!(f, "not ({term})"),
            Self::Quantified { mode, members } => match *mode {
                Quantifier::All => write_joined(f, members, " and ", "true"),
                Quantifier::Any { k } => write_at_least(f, members, k),
            },
        }
    }
}
