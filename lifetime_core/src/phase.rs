/// Tick phases, in execution order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickPhase {
    /// running -> waiting
    Expire,
    /// starting -> running
    Promote,
    /// waiting -> starting
    Launch,
}

impl TickPhase {
    pub const ALL: [TickPhase; 3] = [TickPhase::Expire, TickPhase::Promote, TickPhase::Launch];

    pub fn as_str(self) -> &'static str {
        match self {
            TickPhase::Expire => "Expire",
            TickPhase::Promote => "Promote",
            TickPhase::Launch => "Launch",
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            TickPhase::Expire => 0,
            TickPhase::Promote => 1,
            TickPhase::Launch => 2,
        }
    }
}
