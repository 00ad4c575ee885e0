use thiserror::Error;

/// Failure conditions raised by the engine or by a [`Dom`](`crate::dom::Dom`) implementation.
///
/// None of these are retried anywhere: a failed reconciliation aborts the rest of its
/// subtree and leaves the host tree in whatever partially updated state it reached.
#[derive(Debug, Error)]
pub enum Error {
	#[error("host driver rejected element <{tag}>: {message}")]
	CreateElement { tag: String, message: String },

	#[error("portal target {target:?} did not resolve to a host node")]
	UnresolvedPortalTarget { target: String },

	#[error("host driver rejected data entry {key:?}: {message}")]
	RejectedData { key: String, message: String },

	#[error("host tree operation failed: {message}")]
	Structure { message: String },

	/// A `ChildList::Many` with an empty vector. The tree-construction helper is
	/// expected to normalize such lists to `ChildList::None` before handing them over.
	#[error("a multi-child list must contain at least one child")]
	EmptyChildList,

	/// A virtual node was patched, moved or detached before mount assigned its host handle.
	#[error("virtual node was reconciled before it was mounted")]
	NotMounted,

	#[error("component instance outlived the virtual node that owned it")]
	OrphanedComponent,

	#[error("a component handle was attached to a virtual node of a different kind")]
	MisplacedHandle,
}
