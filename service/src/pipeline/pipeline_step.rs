use crate::error::Error;

/// The action to take after a step completes.
///
/// Steps return this enum to control pipeline flow:
/// - `Continue`: Proceed to the next step normally
/// - `Skip`: Successfully exit early without running remaining steps
/// - `Abort`: Stop the pipeline with an error
#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    /// Continue to the next step
    Continue,
    /// Skip all remaining steps (successful early exit)
    Skip,
    /// Abort the pipeline with an error
    Abort(Error),
}

/// A trait for defining pipeline steps.
///
/// Each step receives a mutable reference to the context and can:
/// - Read from the context to access collaborators and request data
/// - Record its results in the context
/// - Return a `StepAction` to control pipeline execution flow
#[async_trait::async_trait]
pub trait PipelineStep<T>: Send + Sync {
    /// Returns the name of this step for logging and debugging.
    fn name(&self) -> &'static str;

    /// Determines if this step should execute based on current context.
    ///
    /// Steps that return `false` are skipped without affecting the pipeline flow.
    fn should_execute(&self, _context: &T) -> bool {
        true
    }

    /// Execute the step, modifying the context and returning the next action.
    async fn execute(&self, context: &mut T) -> StepAction;
}
