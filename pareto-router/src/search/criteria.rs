//! Optimization criteria and their composition.
//!
//! Each criterion tracks the value accumulated so far and an admissible
//! lower bound on the value at the goal. A search is monomorphized over a
//! tuple of criteria; [`CriteriaSet`] folds the per-criterion operations
//! over the tuple.

use std::cmp::Ordering;
use std::fmt;

use crate::timetable::NodeId;

use super::config::SearchConfig;
use super::edge_cost::EdgeCost;
use super::lower_bounds::{INFINITE, LowerBounds};

/// Outcome of comparing one criterion of two labels.
///
/// Both flags false means equal. Both are never set by a single
/// criterion, but merging can set both (incomparable).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DominanceInfo {
    /// `a` is worse than `b` somewhere.
    pub greater: bool,
    /// `a` is better than `b` somewhere.
    pub smaller: bool,
}

impl DominanceInfo {
    pub const EQUAL: DominanceInfo = DominanceInfo {
        greater: false,
        smaller: false,
    };

    pub fn of(a: u32, b: u32) -> Self {
        Self {
            greater: a > b,
            smaller: a < b,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            greater: self.greater || other.greater,
            smaller: self.smaller || other.smaller,
        }
    }

    /// Not worse anywhere, strictly better somewhere.
    pub fn dominates(self) -> bool {
        !self.greater && self.smaller
    }
}

/// What an update needs to know about the successor label.
#[derive(Debug, Clone, Copy)]
pub struct BoundContext<'a> {
    pub node: NodeId,
    pub lower_bounds: &'a LowerBounds,
    /// Label waits on a route node to board.
    pub boarding: bool,
    /// Some connection was used earlier in the chain.
    pub has_connection: bool,
}

/// Fields a journey reports, filled by whichever criteria are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CriteriaSummary {
    pub travel_time: u32,
    pub transfers: u32,
    pub price: u32,
}

/// One minimization criterion.
pub trait Criterion: Copy + fmt::Debug + PartialEq + Send + 'static {
    /// Value for a start label.
    fn init(ctx: &BoundContext<'_>) -> Self;

    /// Accounts for traversing one edge.
    fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>);

    /// Returns true if the label must be discarded.
    fn filter(&self, config: &SearchConfig) -> bool;

    /// Compares `self.current` with `other.lower_bound` (`by_terminal`) or
    /// with `other.current`.
    fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo;

    /// Queue order, on lower bounds.
    fn order(&self, other: &Self) -> Ordering;

    /// Integer key for the bucket queue.
    fn primary(&self) -> u32;

    fn summarize(&self, summary: &mut CriteriaSummary);
}

fn compare_value(current: u32, other_current: u32, other_bound: u32, by_terminal: bool) -> DominanceInfo {
    let b = if by_terminal { other_bound } else { other_current };
    DominanceInfo::of(current, b)
}

/// Minutes since the search start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TravelTime {
    pub current: u32,
    pub lower_bound: u32,
}

impl Criterion for TravelTime {
    fn init(ctx: &BoundContext<'_>) -> Self {
        Self {
            current: 0,
            lower_bound: ctx.lower_bounds.travel_time(ctx.node),
        }
    }

    fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>) {
        self.current = self.current.saturating_add(cost.time);
        self.lower_bound = self
            .current
            .saturating_add(ctx.lower_bounds.travel_time(ctx.node));
    }

    fn filter(&self, config: &SearchConfig) -> bool {
        self.lower_bound == INFINITE || self.lower_bound > config.max_travel_time_mins
    }

    fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo {
        compare_value(self.current, other.current, other.lower_bound, by_terminal)
    }

    fn order(&self, other: &Self) -> Ordering {
        self.lower_bound.cmp(&other.lower_bound)
    }

    fn primary(&self) -> u32 {
        self.lower_bound
    }

    fn summarize(&self, summary: &mut CriteriaSummary) {
        summary.travel_time = self.current;
    }
}

/// Number of changes between vehicles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transfers {
    pub current: u32,
    pub lower_bound: u32,
}

impl Transfers {
    fn bound(current: u32, ctx: &BoundContext<'_>) -> u32 {
        let boardings = ctx.lower_bounds.boardings(ctx.node);
        if boardings == INFINITE {
            return INFINITE;
        }
        // The first boarding of a journey is not a transfer.
        let pending = boardings + u32::from(ctx.boarding);
        let remaining = if ctx.has_connection {
            pending
        } else {
            pending.saturating_sub(1)
        };
        current.saturating_add(remaining)
    }
}

impl Criterion for Transfers {
    fn init(ctx: &BoundContext<'_>) -> Self {
        Self {
            current: 0,
            lower_bound: Self::bound(0, ctx),
        }
    }

    fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>) {
        self.current += u32::from(cost.transfer);
        self.lower_bound = Self::bound(self.current, ctx);
    }

    fn filter(&self, config: &SearchConfig) -> bool {
        self.lower_bound == INFINITE || self.lower_bound > config.max_transfers
    }

    fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo {
        compare_value(self.current, other.current, other.lower_bound, by_terminal)
    }

    fn order(&self, other: &Self) -> Ordering {
        self.lower_bound.cmp(&other.lower_bound)
    }

    fn primary(&self) -> u32 {
        self.lower_bound
    }

    fn summarize(&self, summary: &mut CriteriaSummary) {
        summary.transfers = self.current;
    }
}

/// Accumulated fare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Price {
    pub current: u32,
    pub lower_bound: u32,
}

impl Criterion for Price {
    fn init(ctx: &BoundContext<'_>) -> Self {
        Self {
            current: 0,
            lower_bound: ctx.lower_bounds.price(ctx.node),
        }
    }

    fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>) {
        self.current = self.current.saturating_add(cost.price);
        self.lower_bound = self.current.saturating_add(ctx.lower_bounds.price(ctx.node));
    }

    fn filter(&self, config: &SearchConfig) -> bool {
        self.lower_bound == INFINITE || self.lower_bound > config.price_limit()
    }

    fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo {
        compare_value(self.current, other.current, other.lower_bound, by_terminal)
    }

    fn order(&self, other: &Self) -> Ordering {
        self.lower_bound.cmp(&other.lower_bound)
    }

    fn primary(&self) -> u32 {
        self.lower_bound
    }

    fn summarize(&self, summary: &mut CriteriaSummary) {
        summary.price = self.current;
    }
}

/// A fixed tuple of criteria.
///
/// The first criterion provides the bucket key and must be bounded by
/// `max_travel_time_mins` after filtering.
pub trait CriteriaSet: Copy + fmt::Debug + PartialEq + Send + 'static {
    fn init(ctx: &BoundContext<'_>) -> Self;

    fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>);

    /// True if any criterion rejects the label.
    fn filter(&self, config: &SearchConfig) -> bool;

    fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo;

    /// Lexicographic order over the criteria.
    fn compare(&self, other: &Self) -> Ordering;

    fn bucket(&self) -> usize;

    fn summary(&self) -> CriteriaSummary;

    /// Pareto dominance.
    fn dominates(&self, other: &Self, by_terminal: bool) -> bool {
        self.dominance(other, by_terminal).dominates()
    }

    /// Not worse anywhere, on current values.
    fn weakly_dominates(&self, other: &Self) -> bool {
        !self.dominance(other, false).greater
    }
}

macro_rules! impl_criteria_set {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Criterion),+> CriteriaSet for ($($name,)+) {
            fn init(ctx: &BoundContext<'_>) -> Self {
                ($(<$name as Criterion>::init(ctx),)+)
            }

            fn update(&mut self, cost: &EdgeCost, ctx: &BoundContext<'_>) {
                $(self.$idx.update(cost, ctx);)+
            }

            fn filter(&self, config: &SearchConfig) -> bool {
                false $(|| self.$idx.filter(config))+
            }

            fn dominance(&self, other: &Self, by_terminal: bool) -> DominanceInfo {
                DominanceInfo::EQUAL $(.merge(self.$idx.dominance(&other.$idx, by_terminal)))+
            }

            fn compare(&self, other: &Self) -> Ordering {
                Ordering::Equal $(.then_with(|| self.$idx.order(&other.$idx)))+
            }

            fn bucket(&self) -> usize {
                self.0.primary() as usize
            }

            fn summary(&self) -> CriteriaSummary {
                let mut summary = CriteriaSummary::default();
                $(self.$idx.summarize(&mut summary);)+
                summary
            }
        }
    };
}

impl_criteria_set!(A: 0);
impl_criteria_set!(A: 0, B: 1);
impl_criteria_set!(A: 0, B: 1, C: 2);
impl_criteria_set!(A: 0, B: 1, C: 2, D: 3);

/// Travel time, transfers and price.
pub type DefaultCriteria = (TravelTime, Transfers, Price);
