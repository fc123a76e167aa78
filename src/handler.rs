//! Ordered handler stages run ahead of the engine's built-in processing.
//!
//! A registration may carry a [`HandlerChain`]: an explicit, ordered list
//! of stages the engine invokes before its default request handling. Each
//! stage either passes the request on, declares it fully handled, or
//! short-circuits the whole chain with an SNMP error status.
//!
//! # Example
//!
//! ```rust
//! use subagent::error::ErrorStatus;
//! use subagent::handler::{HandlerChain, RequestKind, StageOutcome, SubagentRequest};
//! use subagent::{Value, oid};
//!
//! let chain = HandlerChain::new()
//!     .stage(|request: &mut SubagentRequest| {
//!         // reject writes below a locked subtree
//!         if request.kind == RequestKind::Set && request.oid.starts_with(&oid!(1, 3, 6, 1, 4)) {
//!             return Err(ErrorStatus::NotWritable);
//!         }
//!         Ok(StageOutcome::Continue)
//!     });
//!
//! let mut request = SubagentRequest {
//!     kind: RequestKind::Set,
//!     oid: oid!(1, 3, 6, 1, 4, 1, 9999),
//!     value: Some(Value::Integer32(1)),
//! };
//! assert_eq!(chain.run(&mut request), Err(ErrorStatus::NotWritable));
//! ```

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::value::Value;

/// The request operation a stage is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    GetNext,
    Set,
}

/// One in-flight request as seen by handler stages.
///
/// Stages may rewrite the value of a SET before built-in processing
/// stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubagentRequest {
    /// The request operation.
    pub kind: RequestKind,
    /// Target OID.
    pub oid: Oid,
    /// The value carried by a SET; `None` for reads.
    pub value: Option<Value>,
}

/// What a stage decided about the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Pass the request to the next stage (and ultimately to the
    /// engine's built-in processing).
    Continue,
    /// The request is fully handled; skip remaining stages.
    Done,
}

/// A single handler stage.
///
/// Returning `Err(status)` terminates the chain and the engine answers
/// the request with that status. Closures with the matching signature
/// implement this trait directly.
pub trait HandlerStage: Send + Sync + 'static {
    fn handle(&self, request: &mut SubagentRequest) -> Result<StageOutcome, ErrorStatus>;
}

impl<F> HandlerStage for F
where
    F: Fn(&mut SubagentRequest) -> Result<StageOutcome, ErrorStatus> + Send + Sync + 'static,
{
    fn handle(&self, request: &mut SubagentRequest) -> Result<StageOutcome, ErrorStatus> {
        self(request)
    }
}

/// An explicit ordered list of handler stages with a
/// short-circuit-on-error contract.
#[derive(Default)]
pub struct HandlerChain {
    stages: Vec<Box<dyn HandlerStage>>,
}

impl HandlerChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn stage(mut self, stage: impl HandlerStage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the chain has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the stages in order.
    ///
    /// Stops at the first `Err` (returned to the caller) or the first
    /// [`StageOutcome::Done`]; otherwise every stage runs and the engine
    /// continues with built-in processing.
    pub fn run(&self, request: &mut SubagentRequest) -> Result<(), ErrorStatus> {
        for stage in &self.stages {
            match stage.handle(request)? {
                StageOutcome::Continue => {}
                StageOutcome::Done => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn get_request() -> SubagentRequest {
        SubagentRequest {
            kind: RequestKind::Get,
            oid: oid!(1, 3, 6, 1, 4, 1, 8072, 1),
            value: None,
        }
    }

    #[test]
    fn test_empty_chain_continues() {
        let chain = HandlerChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.run(&mut get_request()), Ok(()));
    }

    #[test]
    fn test_stages_run_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = calls.clone();
        let second = calls.clone();
        let chain = HandlerChain::new()
            .stage(move |_req: &mut SubagentRequest| {
                assert_eq!(first.fetch_add(1, Ordering::SeqCst), 0);
                Ok(StageOutcome::Continue)
            })
            .stage(move |_req: &mut SubagentRequest| {
                assert_eq!(second.fetch_add(1, Ordering::SeqCst), 1);
                Ok(StageOutcome::Continue)
            });

        assert_eq!(chain.run(&mut get_request()), Ok(()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_short_circuits() {
        let reached = Arc::new(AtomicUsize::new(0));
        let tail = reached.clone();
        let chain = HandlerChain::new()
            .stage(|_req: &mut SubagentRequest| Err(ErrorStatus::NoAccess))
            .stage(move |_req: &mut SubagentRequest| {
                tail.fetch_add(1, Ordering::SeqCst);
                Ok(StageOutcome::Continue)
            });

        assert_eq!(chain.run(&mut get_request()), Err(ErrorStatus::NoAccess));
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_done_skips_remaining_stages() {
        let reached = Arc::new(AtomicUsize::new(0));
        let tail = reached.clone();
        let chain = HandlerChain::new()
            .stage(|_req: &mut SubagentRequest| Ok(StageOutcome::Done))
            .stage(move |_req: &mut SubagentRequest| {
                tail.fetch_add(1, Ordering::SeqCst);
                Ok(StageOutcome::Continue)
            });

        assert_eq!(chain.run(&mut get_request()), Ok(()));
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stage_may_rewrite_set_value() {
        let chain = HandlerChain::new().stage(|request: &mut SubagentRequest| {
            if request.kind == RequestKind::Set {
                request.value = Some(Value::Integer32(99));
            }
            Ok(StageOutcome::Continue)
        });

        let mut request = SubagentRequest {
            kind: RequestKind::Set,
            oid: oid!(1, 3, 6, 1),
            value: Some(Value::Integer32(1)),
        };
        chain.run(&mut request).unwrap();
        assert_eq!(request.value, Some(Value::Integer32(99)));
    }
}
