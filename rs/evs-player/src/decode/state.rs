/// The lifecycle of a [crate::Decoder].
///
/// `ConfiguringSoftware` without an open session means a software fallback is pending:
/// the next frame opens a software session regardless of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
	/// No session; the next frame opens one using the preferred acceleration.
	#[default]
	Idle,
	ConfiguringHardware,
	ConfiguringSoftware,
	Ready,

	/// A failure with no fallback left. Only `close` leaves this state.
	Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
	Configure { hardware: bool },
	Configured,
	Failed { fallback: bool },
	Close,
}

impl DecoderState {
	/// The transition table. `None` for transitions that should never happen.
	pub(crate) fn next(self, transition: Transition) -> Option<Self> {
		use DecoderState::*;
		use Transition::*;

		let next = match (self, transition) {
			(_, Close) => Idle,
			(_, Failed { fallback: false }) => Closed,
			(ConfiguringHardware | Ready, Failed { fallback: true }) => ConfiguringSoftware,
			(ConfiguringSoftware, Configure { .. }) => ConfiguringSoftware,
			(Idle | Ready, Configure { hardware: true }) => ConfiguringHardware,
			(Idle | Ready, Configure { hardware: false }) => ConfiguringSoftware,
			(ConfiguringHardware | ConfiguringSoftware, Configured) => Ready,
			_ => return None,
		};

		Some(next)
	}
}
