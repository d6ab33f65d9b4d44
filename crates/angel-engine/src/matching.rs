//! Restricted cyclic matching within a group.

use rand::{CryptoRng, Rng};
use tracing::debug;

use crate::error::EngineError;
use crate::restriction::RestrictionSet;
use crate::shuffle::shuffle;

/// Default number of shuffles tried before a group is declared infeasible.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// One giver/receiver pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub giver: String,
    pub receiver: String,
}

/// Pair every member of a group with a receiver.
///
/// Each attempt shuffles the group and links every member to the next one,
/// wrapping around, which gives a single cycle with no fixed point. The
/// attempt is discarded if any link hits a restriction. Groups with fewer
/// than two members produce no pairings.
pub fn match_group<R>(
    group_label: &str,
    members: &[String],
    restrictions: &RestrictionSet,
    max_attempts: usize,
    rng: &mut R,
) -> Result<Vec<Pairing>, EngineError>
where
    R: Rng + CryptoRng + ?Sized,
{
    let n = members.len();
    if n < 2 {
        return Ok(Vec::new());
    }

    let mut order = members.to_vec();
    for attempt in 1..=max_attempts {
        shuffle(&mut order, rng);

        let pairings: Option<Vec<Pairing>> = (0..n)
            .map(|i| {
                let giver = &order[i];
                let receiver = &order[(i + 1) % n];
                if giver == receiver || restrictions.forbids(giver, receiver) {
                    None
                } else {
                    Some(Pairing {
                        giver: giver.clone(),
                        receiver: receiver.clone(),
                    })
                }
            })
            .collect();

        if let Some(pairings) = pairings {
            debug!("Matched {} on attempt {}", group_label, attempt);
            return Ok(pairings);
        }
    }

    Err(EngineError::AssignmentInfeasible {
        group: group_label.to_string(),
        attempts: max_attempts,
    })
}
