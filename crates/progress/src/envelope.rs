//! Deadline-feasibility envelope.
//!
//! Every task contributes one constraint: by its deadline, its whole
//! workload (in hours) must be done. Sorting the constraints by deadline and
//! summing them gives the cumulative work required at each deadline. The
//! envelope is the least steep schedule from the origin that stays on or above
//! every one of those requirements.
//!
//! Work is always "completed work", growing from 0 at the origin. The
//! reduction walks from the current vertex to whichever later node demands the
//! steepest pace, marks it as a key point, and repeats from there. Nodes that
//! fall under a segment between two key points are met automatically once
//! the segment's pace is kept, so they are not key points. The scan is
//! quadratic in the number of deadlines.

use paceline_core::time::{add_hours, hours_between};
use paceline_core::{DeadlineConstraint, EnvelopeNode, Time};
use serde::Serialize;
use tracing::warn;

/// Piecewise-linear minimum-pace schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Envelope {
    nodes: Vec<EnvelopeNode>,
}

/// The constraint that dictates pace from a given position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    /// The envelope node that binds
    pub node: EnvelopeNode,
    /// Work hours per calendar hour needed to meet it, possibly negative
    pub pace: f64,
}

impl Envelope {
    /// Build the envelope from `origin` over the given constraints.
    ///
    /// Constraints with a deadline at or before the origin, or with a
    /// non-positive or non-finite requirement, are dropped. Constraints sharing
    /// a deadline collapse into one node.
    pub fn build(origin: Time, constraints: &[DeadlineConstraint]) -> Self {
        let mut usable: Vec<&DeadlineConstraint> = constraints
            .iter()
            .filter(|c| {
                let ok = c.deadline > origin
                    && c.required_work_hours.is_finite()
                    && c.required_work_hours > 0.0;
                if !ok {
                    warn!(
                        task = %c.name,
                        deadline = %c.deadline,
                        required = c.required_work_hours,
                        "constraint excluded from envelope"
                    );
                }
                ok
            })
            .collect();
        if usable.is_empty() {
            return Self::default();
        }
        usable.sort_by(|a, b| a.deadline.cmp(&b.deadline));

        let mut nodes = vec![EnvelopeNode {
            time: origin,
            cumulative_required_work_hours: 0.0,
            is_key_point: false,
        }];
        let mut required = 0.0;
        for c in usable {
            required += c.required_work_hours;
            match nodes.last_mut() {
                Some(last) if last.time == c.deadline => {
                    last.cumulative_required_work_hours = required;
                }
                _ => nodes.push(EnvelopeNode {
                    time: c.deadline,
                    cumulative_required_work_hours: required,
                    is_key_point: false,
                }),
            }
        }

        mark_key_points(&mut nodes);
        Self { nodes }
    }

    /// Every node, key point or not, in time order.
    pub fn nodes(&self) -> &[EnvelopeNode] {
        &self.nodes
    }

    /// Only the vertices of the reduced envelope.
    pub fn key_points(&self) -> impl Iterator<Item = &EnvelopeNode> + '_ {
        self.nodes.iter().filter(|n| n.is_key_point)
    }

    /// Whether there are no constraints at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Origin of the schedule.
    pub fn origin(&self) -> Option<Time> {
        self.nodes.first().map(|n| n.time)
    }

    /// Work required by the final deadline.
    pub fn total_required(&self) -> f64 {
        self.nodes
            .last()
            .map(|n| n.cumulative_required_work_hours)
            .unwrap_or(0.0)
    }

    /// Work that must be done by `at` to stay on track for every deadline.
    ///
    /// 0 before the origin, the final total after the last deadline, linear
    /// between key points otherwise.
    pub fn required_at(&self, at: Time) -> f64 {
        let keys: Vec<&EnvelopeNode> = self.key_points().collect();
        let Some(first) = keys.first() else {
            return 0.0;
        };
        if at <= first.time {
            return first.cumulative_required_work_hours;
        }
        for seg in keys.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            if at <= b.time {
                let frac = hours_between(a.time, at) / hours_between(a.time, b.time);
                return a.cumulative_required_work_hours
                    + frac * (b.cumulative_required_work_hours - a.cumulative_required_work_hours);
            }
        }
        self.total_required()
    }

    /// Inverse of [`required_at`](Self::required_at): the instant by which
    /// `work` hours are required.
    ///
    /// Work beyond the final requirement maps to the final deadline.
    pub fn time_for(&self, work: f64) -> Option<Time> {
        let keys: Vec<&EnvelopeNode> = self.key_points().collect();
        let first = keys.first()?;
        if work <= first.cumulative_required_work_hours {
            return Some(first.time);
        }
        for seg in keys.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            if work <= b.cumulative_required_work_hours {
                let rise = b.cumulative_required_work_hours - a.cumulative_required_work_hours;
                if rise <= 0.0 {
                    return Some(a.time);
                }
                let frac = (work - a.cumulative_required_work_hours) / rise;
                return add_hours(a.time, frac * hours_between(a.time, b.time));
            }
        }
        keys.last().map(|n| n.time)
    }

    /// The node that dictates the pace from position `(at, work)`.
    ///
    /// Only deadlines after `at` are considered. When `horizon` is given,
    /// deadlines up to it are preferred; if none falls inside, the steepest
    /// of all remaining deadlines binds.
    pub fn binding_from(&self, at: Time, work: f64, horizon: Option<Time>) -> Option<Binding> {
        let ahead: Vec<&EnvelopeNode> = self.nodes.iter().filter(|n| n.time > at).collect();
        let within: Vec<&EnvelopeNode> = match horizon {
            Some(h) => ahead.iter().copied().filter(|n| n.time <= h).collect(),
            None => Vec::new(),
        };
        let candidates = if within.is_empty() { &ahead } else { &within };

        candidates
            .iter()
            .map(|n| Binding {
                node: **n,
                pace: slope(at, work, n),
            })
            .fold(None, |best: Option<Binding>, b| match best {
                Some(cur) if cur.pace > b.pace => Some(cur),
                _ => Some(b),
            })
    }
}

/// Work hours per calendar hour needed to get from `(at, work)` to `node`.
fn slope(at: Time, work: f64, node: &EnvelopeNode) -> f64 {
    (node.cumulative_required_work_hours - work) / hours_between(at, node.time)
}

/// Greedy steepest-pace scan. The farthest node wins ties, so a deadline is
/// only kept when it is strictly steeper than every later one.
fn mark_key_points(nodes: &mut [EnvelopeNode]) {
    if nodes.is_empty() {
        return;
    }
    nodes[0].is_key_point = true;

    let mut i = 0;
    while i + 1 < nodes.len() {
        let from = nodes[i];
        let mut next = i + 1;
        let mut steepest = slope(from.time, from.cumulative_required_work_hours, &nodes[next]);
        for (j, node) in nodes.iter().enumerate().skip(i + 2) {
            let s = slope(from.time, from.cumulative_required_work_hours, node);
            if s >= steepest {
                steepest = s;
                next = j;
            }
        }
        nodes[next].is_key_point = true;
        i = next;
    }
}
