//! x86 privilege classification for paging.
//!
//! Paging only distinguishes two levels: CPL 3 is user, CPL 0-2 are supervisor.
//! Implicit supervisor accesses (descriptor table loads and the like) are
//! presented as [`Privilege::Supervisor`] regardless of the current CPL.

use std::fmt;

/// Effective privilege of an access, as seen by the paging unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    /// CPL 0, 1 or 2.
    Supervisor = 0,

    /// CPL 3.
    User = 1,
}

impl Privilege {
    /// Classifies a current privilege level.
    ///
    /// # Arguments
    ///
    /// * `cpl` - The current privilege level (0-3). Only the low two bits are used.
    pub const fn from_cpl(cpl: u8) -> Self {
        if cpl & 3 == 3 { Self::User } else { Self::Supervisor }
    }

    /// Returns `true` for user-level accesses.
    #[inline(always)]
    pub const fn is_user(self) -> bool {
        matches!(self, Self::User)
    }

    /// Returns the human-readable name of the privilege level.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Supervisor => "Supervisor",
            Self::User => "User",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
