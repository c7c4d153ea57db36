//! Row fan-out for transforms with no cross-row dependency.
//!
//! With the `threads` feature rows are distributed over the rayon pool;
//! the call returns only after every row is written.

/// Run `f(row_index, row)` over every `row_len`-byte row of `out`.
pub(crate) fn for_each_row<F>(out: &mut [u8], row_len: usize, f: F)
where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }

    #[cfg(feature = "threads")]
    {
        use rayon::prelude::*;
        out.par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }

    #[cfg(not(feature = "threads"))]
    {
        out.chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}
