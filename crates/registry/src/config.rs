//! Registry build configuration.

/// What to do when a (context, root, return type, operand) tuple is registered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
	/// Panic with the conflicting operation names.
	Panic,
	/// Keep the first registration seen.
	FirstWins,
	/// Overwrite with the last registration seen.
	#[default]
	LastWins,
}

impl std::fmt::Display for DuplicatePolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Panic => write!(f, "panic"),
			Self::FirstWins => write!(f, "first-wins"),
			Self::LastWins => write!(f, "last-wins"),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryConfig {
	pub duplicate_policy: DuplicatePolicy,
}

impl RegistryConfig {
	pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.duplicate_policy = policy;
		self
	}
}
