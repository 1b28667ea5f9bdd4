mod common;

mod concurrency;
mod convergence;
mod degeneracy;
mod end_to_end;
mod properties;
