//! Greedy closest-match cover over a single category's pool.

use thiserror::Error;
use uuid::Uuid;

/// A hero as the picker sees it: an id and the capacity it contributes.
/// Compatibility scaling, if enabled, has already been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: Uuid,
    pub effective_capacity: f64,
}

impl Candidate {
    pub fn new(id: Uuid, effective_capacity: f64) -> Self {
        Self {
            id,
            effective_capacity,
        }
    }
}

/// The pool ran out before the target was covered. Nothing is selected.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("pool exhausted with {remaining} demand uncovered")]
pub struct Unsatisfied {
    pub remaining: f64,
}

struct Scored {
    id: Uuid,
    capacity: f64,
    dev: f64,
    abs_dev: f64,
}

impl Scored {
    fn rescore(&mut self, remaining: f64) {
        self.dev = self.capacity - remaining;
        self.abs_dev = self.dev.abs();
    }
}

/// Select candidates until their combined capacity covers `target`.
///
/// Repeated closest-match greedy: each round takes the candidate whose
/// capacity deviates least (in absolute value) from the remaining target,
/// tie-broken toward the more negative deviation — an equal-magnitude
/// undershoot beats an overshoot. Overshoot ends the run as success;
/// undershoot subtracts and continues with deviations recomputed against
/// the new remainder.
///
/// Deterministic: the sort is stable and candidates with fully equal
/// scores keep their input order.
///
/// # Errors
/// `Unsatisfied` if the pool is exhausted first; a partial selection is
/// never returned.
pub fn pick(target: f64, pool: &[Candidate]) -> Result<Vec<Uuid>, Unsatisfied> {
    if target <= 0.0 {
        return Ok(Vec::new());
    }
    let mut scored: Vec<Scored> = pool
        .iter()
        .map(|c| {
            let dev = c.effective_capacity - target;
            Scored {
                id: c.id,
                capacity: c.effective_capacity,
                dev,
                abs_dev: dev.abs(),
            }
        })
        .collect();

    let mut remaining = target;
    let mut selected = Vec::new();
    while remaining > 0.0 {
        // Largest mismatch first, best match last; then take the tail.
        scored.sort_by(|a, b| {
            b.abs_dev
                .total_cmp(&a.abs_dev)
                .then_with(|| b.dev.total_cmp(&a.dev))
        });
        let Some(best) = scored.pop() else {
            return Err(Unsatisfied { remaining });
        };
        selected.push(best.id);
        remaining -= best.capacity;
        if remaining <= 0.0 {
            break;
        }
        for s in &mut scored {
            s.rescore(remaining);
        }
    }
    Ok(selected)
}
