//! Chunk planning for batch runs.
//!
//! A run of `total` records is processed in fixed-size chunks. Each chunk is
//! one generate → publish → insert cycle. The plan is computed from the
//! requested sizes only, so the number of generator calls is always
//! `ceil(total / chunk_size)` regardless of what the generator returns.

/// Records requested from the generator per chunk.
pub const CHUNK_SIZE: usize = 20;

/// Records returned to the caller as a sample of a finished run.
pub const SAMPLE_SIZE: usize = 5;

/// Requested size of every chunk for a run of `total` records.
///
/// `total <= 0` produces an empty plan. A `chunk_size` of zero is treated
/// as one.
pub fn plan_chunks(total: i64, chunk_size: usize) -> ChunkPlan {
    ChunkPlan {
        remaining: u64::try_from(total).unwrap_or(0),
        chunk_size: chunk_size.max(1) as u64,
    }
}

/// Iterator over requested chunk sizes, see [`plan_chunks`].
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    remaining: u64,
    chunk_size: u64,
}

impl ChunkPlan {
    /// Number of chunks still to be yielded.
    pub fn chunk_count(&self) -> usize {
        self.remaining.div_ceil(self.chunk_size) as usize
    }
}

impl Iterator for ChunkPlan {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let size = self.remaining.min(self.chunk_size);
        self.remaining -= size;
        Some(size as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.chunk_count();
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlan {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_records_split_into_twenty_and_five() {
        let plan: Vec<_> = plan_chunks(25, CHUNK_SIZE).collect();
        assert_eq!(plan, [20, 5]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_chunk() {
        let plan: Vec<_> = plan_chunks(40, CHUNK_SIZE).collect();
        assert_eq!(plan, [20, 20]);
    }

    #[test]
    fn small_total_is_a_single_short_chunk() {
        let plan: Vec<_> = plan_chunks(3, CHUNK_SIZE).collect();
        assert_eq!(plan, [3]);
    }

    #[test]
    fn zero_and_negative_totals_plan_nothing() {
        assert_eq!(plan_chunks(0, CHUNK_SIZE).count(), 0);
        assert_eq!(plan_chunks(-10, CHUNK_SIZE).count(), 0);
    }

    #[test]
    fn chunk_count_is_ceiling_of_total_over_size() {
        for total in 1..=101_i64 {
            let plan = plan_chunks(total, CHUNK_SIZE);
            let expected = (total as usize).div_ceil(CHUNK_SIZE);
            assert_eq!(plan.chunk_count(), expected, "total = {total}");
            assert_eq!(plan.len(), expected);
            assert!(plan.clone().all(|size| size <= CHUNK_SIZE));
            assert_eq!(plan.sum::<usize>(), total as usize);
        }
    }

    #[test]
    fn zero_chunk_size_does_not_loop_forever() {
        let plan: Vec<_> = plan_chunks(2, 0).collect();
        assert_eq!(plan, [1, 1]);
    }
}
