//! Partitioning participants into groups.

use rand::{CryptoRng, Rng};

use crate::error::EngineError;
use crate::shuffle::shuffle;

/// Shuffle `members` and split them into `group_count` contiguous groups.
///
/// Group sizes are `P / N` or `P / N + 1`, with the larger groups first.
/// An empty member list yields no groups whatever the count; otherwise the
/// count must be within `1..=P`.
pub fn partition<T, R>(
    members: &[T],
    group_count: usize,
    rng: &mut R,
) -> Result<Vec<Vec<T>>, EngineError>
where
    T: Clone,
    R: Rng + CryptoRng + ?Sized,
{
    let total = members.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    if group_count == 0 || group_count > total {
        return Err(EngineError::InvalidGroupCount {
            requested: group_count,
            participants: total,
        });
    }

    let mut shuffled = members.to_vec();
    shuffle(&mut shuffled, rng);

    let base = total / group_count;
    let extra = total % group_count;

    let mut groups = Vec::with_capacity(group_count);
    let mut rest = shuffled.as_slice();
    for index in 0..group_count {
        let size = if index < extra { base + 1 } else { base };
        let (group, tail) = rest.split_at(size);
        rest = tail;
        if !group.is_empty() {
            groups.push(group.to_vec());
        }
    }

    Ok(groups)
}
