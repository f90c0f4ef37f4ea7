use crate::table::StateTable;
use log::trace;
use std::collections::{HashSet, VecDeque};

/// Whether two automata have the same shape, ignoring state names.
///
/// Both tables are walked breadth-first in lockstep from their start states.
/// They differ if a level holds a different number of states, or if paired
/// states disagree on acceptance, outgoing symbols, or the number of targets
/// per symbol. Targets are visited in symbol order, so the result does not
/// depend on how either table lists its transitions.
pub fn structurally_equivalent(left: &StateTable, right: &StateTable) -> bool {
    let mut left_walk = Walk::new(left);
    let mut right_walk = Walk::new(right);

    if left.is_accepting(left.start()) != right.is_accepting(right.start()) {
        return false;
    }

    while !left_walk.queue.is_empty() && !right_walk.queue.is_empty() {
        if left_walk.queue.len() != right_walk.queue.len() {
            trace!("level sizes differ: {} vs {}", left_walk.queue.len(), right_walk.queue.len());
            return false;
        }

        for _ in 0..left_walk.queue.len() {
            let (Some(a), Some(b)) = (left_walk.queue.pop_front(), right_walk.queue.pop_front()) else {
                return false;
            };
            if left.is_accepting(a) != right.is_accepting(b) {
                trace!("{a} and {b} differ in acceptance");
                return false;
            }

            let symbols = left.symbols(a);
            if symbols != right.symbols(b) {
                trace!("{a} and {b} differ in outgoing symbols");
                return false;
            }

            for symbol in symbols {
                let (a_targets, b_targets) = (left.targets(a, symbol), right.targets(b, symbol));
                if a_targets.len() != b_targets.len() {
                    trace!("{a} and {b} differ in targets on {symbol:?}");
                    return false;
                }
                left_walk.visit(a_targets);
                right_walk.visit(b_targets);
            }
        }
    }

    left_walk.queue.is_empty() && right_walk.queue.is_empty()
}

struct Walk<'a> {
    seen: HashSet<&'a str>,
    queue: VecDeque<&'a str>,
}

impl<'a> Walk<'a> {
    fn new(table: &'a StateTable) -> Self {
        let start = table.start().as_str();
        Self { seen: HashSet::from([start]), queue: VecDeque::from([start]) }
    }

    fn visit(&mut self, targets: Vec<&'a str>) {
        for target in targets {
            if self.seen.insert(target) {
                self.queue.push_back(target);
            }
        }
    }
}
