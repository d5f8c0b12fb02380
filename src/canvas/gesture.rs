//! Pointer gesture state machine.
//!
//! `Idle -> Dragging(kind) -> {Dropped, Cancelled} -> Idle`. The pointer is
//! exclusive, so at most one gesture is ever active; a second `begin` while
//! dragging is refused rather than queued.

/// Current phase of a gesture carrying payload `K`.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture<K> {
	/// No gesture in progress.
	Idle,
	/// The pointer is held and carries `K`.
	Dragging(K),
}

impl<K> Default for Gesture<K> {
	fn default() -> Self {
		Gesture::Idle
	}
}

/// How a gesture finished. Either way the machine is back to `Idle`.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEnd<K> {
	/// Released over a valid target.
	Dropped(K),
	/// Abandoned (Escape, pointer left, invalid target).
	Cancelled(K),
}

impl<K> Gesture<K> {
	/// Whether no gesture is in progress.
	pub fn is_idle(&self) -> bool {
		matches!(self, Gesture::Idle)
	}

	/// Payload of the gesture in progress.
	pub fn active(&self) -> Option<&K> {
		match self {
			Gesture::Idle => None,
			Gesture::Dragging(k) => Some(k),
		}
	}

	/// Mutable payload of the gesture in progress, for tracking updates.
	pub fn active_mut(&mut self) -> Option<&mut K> {
		match self {
			Gesture::Idle => None,
			Gesture::Dragging(k) => Some(k),
		}
	}

	/// Starts a gesture. Returns `false` (and changes nothing) if one is
	/// already in progress.
	pub fn begin(&mut self, kind: K) -> bool {
		if !self.is_idle() {
			return false;
		}
		*self = Gesture::Dragging(kind);
		true
	}

	/// Completes the active gesture over a valid target.
	pub fn drop_gesture(&mut self) -> Option<GestureEnd<K>> {
		match std::mem::replace(self, Gesture::Idle) {
			Gesture::Idle => None,
			Gesture::Dragging(k) => Some(GestureEnd::Dropped(k)),
		}
	}

	/// Abandons the active gesture; callers must not mutate the model.
	pub fn cancel(&mut self) -> Option<GestureEnd<K>> {
		match std::mem::replace(self, Gesture::Idle) {
			Gesture::Idle => None,
			Gesture::Dragging(k) => Some(GestureEnd::Cancelled(k)),
		}
	}
}
