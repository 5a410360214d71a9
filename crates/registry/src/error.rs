use crate::tag::Tag;

/// Failure to resolve or run an operation for one operand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
	/// Neither the operand's concrete type nor the root has a slot for the requested
	/// (context, return type) pair.
	#[error("no `{context}` operation returning `{ret}` for `{operand}` (tag {tag}) in hierarchy `{root}`, and no fallback")]
	UnregisteredOperand {
		context: &'static str,
		root: &'static str,
		ret: &'static str,
		operand: &'static str,
		tag: Tag,
	},
	/// The stored instance is not of the operation type the resolved callable expects.
	#[error("operation instance resolved for tag {tag} is not a `{expected}`")]
	OperationMismatch { expected: &'static str, tag: Tag },
	/// The operand's concrete type does not match the callable registered for its tag.
	#[error("operand reporting tag {tag} is not a `{expected}`")]
	OperandMismatch { expected: &'static str, tag: Tag },
}

impl DispatchError {
	/// Returns true if the failure comes from missing registrations rather than a type mismatch.
	pub fn is_unregistered(&self) -> bool {
		matches!(self, Self::UnregisteredOperand { .. })
	}
}

/// Errors raised while setting up the process-wide registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
	#[error("operation registry already initialized")]
	AlreadyInitialized,
}
