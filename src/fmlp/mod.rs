/*! Blocking bounds for the FMLP and FMLP+

The global FMLP uses plain FIFO queues, so every other task blocks
at most once per issued request. The partitioned FMLP+ analysis
additionally distinguishes *direct* blocking (jobs enqueued ahead of
the job under analysis) from *boost* blocking (delays inherited
because some lower-priority job is priority-boosted), which can
propagate transitively from remote partitions.
*/

mod global;
mod partitioned;

pub use global::global;
pub use partitioned::partitioned;

#[cfg(test)]
mod tests;
