//! Error data types shared by the Agora crates.
//!
//! - RFC 9457 Problem Details (`Problem`), the only error shape that leaves
//!   the HTTP edge
//! - Static catalog entries (`ErrDef`) that modules use to build problems with
//!   stable codes

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};

/// Attach the request instance and an optional trace id to a problem.
pub fn finalize(mut p: Problem, instance: &str, trace_id: Option<String>) -> Problem {
    p = p.with_instance(instance);
    if let Some(tid) = trace_id {
        p = p.with_trace_id(tid);
    }
    p
}
