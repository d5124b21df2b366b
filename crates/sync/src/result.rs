//! End-of-match summary and ranking.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Why the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Every safe square uncovered.
    Cleared,
    /// A mine was revealed.
    HitMine,
    OpponentCleared,
    OpponentHitMine,
    OpponentExited,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cleared => "board cleared",
            Self::HitMine => "hit a mine",
            Self::OpponentCleared => "opponent cleared their board",
            Self::OpponentHitMine => "opponent hit a mine",
            Self::OpponentExited => "opponent left the game",
        })
    }
}

/// Result surfaced once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub outcome: Outcome,
    pub reason: Reason,
    pub flags_left: i32,
    pub total_flags: usize,
    /// Seconds.
    pub time_played: u32,
}

impl MatchResult {
    pub fn won(&self) -> bool {
        self.outcome == Outcome::Won
    }

    /// Letter rank from flag usage and time.
    ///
    /// Each flag sixth used and each 30 s played costs half a grade.
    /// A loss is always `F`; a perfect game (no flags, under 30 s) is `???`.
    pub fn rank(&self) -> String {
        let used = (self.total_flags as i64 - self.flags_left as i64).max(0);
        let flag_rank = if self.total_flags == 0 {
            0
        } else {
            used * 6 / self.total_flags as i64
        };
        let time_rank = i64::from(self.time_played) / 30;
        let final_rank = (flag_rank + time_rank + 1) / 2;

        if final_rank >= 6 || !self.won() {
            "F".to_string()
        } else if final_rank == 0 {
            "???".to_string()
        } else {
            char::from(b'A' + (final_rank - 1) as u8).to_string()
        }
    }
}

/// `MM:SS`, or `HH:MM:SS` once an hour has passed.
pub fn format_time(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = seconds % 3600 / 60;
    let secs = seconds % 60;
    if hours != 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}
