//! Page-level protection checks.
//!
//! Combines the directory- and table-level R/W and U/S bits with the accessor's
//! privilege and CR0.WP into one verdict:
//! 1. **User/supervisor:** The effective U/S bit is the AND of both levels; a
//!    user access to a supervisor page is always denied.
//! 2. **Writability:** The effective R/W bit is the AND of both levels. A user
//!    page is writable exactly when R/W is set. A supervisor page is writable
//!    unless a supervisor accessor runs with CR0.WP honoured, in which case
//!    R/W decides. Supervisor writes without WP are always granted.
//! 3. **Caching:** The verdict also says whether the translation may be cached
//!    as writable, so a read never leaves behind an entry that would let a
//!    later write skip the check.
//!
//! For large pages the directory entry is the leaf; callers pass its bits for
//! both levels.

/// The inputs of one protection check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AccessCheck {
    /// The access is a write.
    pub write: bool,
    /// The accessor runs at user level (CPL 3).
    pub user: bool,
    /// Directory-level R/W.
    pub dir_rw: bool,
    /// Directory-level U/S.
    pub dir_us: bool,
    /// Table-level R/W.
    pub table_rw: bool,
    /// Table-level U/S.
    pub table_us: bool,
    /// CR0.WP is set and honoured by the emulated processor.
    pub write_protect: bool,
}

/// Outcome of a protection check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Verdict {
    /// The access may proceed.
    pub granted: bool,
    /// The translation may be cached as writable.
    pub writable_for_cache: bool,
}

impl Verdict {
    const DENIED: Self = Self {
        granted: false,
        writable_for_cache: false,
    };
}

/// Applies the x86 page protection rules.
///
/// | page       | accessor   | access | result                                  |
/// |------------|------------|--------|-----------------------------------------|
/// | supervisor | user       | any    | denied                                  |
/// | user       | any        | read   | granted; cached writable iff R/W        |
/// | supervisor | supervisor | read   | granted; cached writable iff R/W or !WP |
/// | any        | user       | write  | granted iff R/W                         |
/// | any        | supervisor | write  | granted iff R/W or !WP; cached writable |
pub const fn verify(check: &AccessCheck) -> Verdict {
    let user_page = check.dir_us && check.table_us;
    let rw = check.dir_rw && check.table_rw;

    if check.user && !user_page {
        return Verdict::DENIED;
    }

    let writable = if user_page || (!check.user && check.write_protect) { rw } else { true };

    if check.write && !writable {
        if check.user || check.write_protect {
            return Verdict::DENIED;
        }
        return Verdict {
            granted: true,
            writable_for_cache: true,
        };
    }

    Verdict {
        granted: true,
        writable_for_cache: writable,
    }
}
