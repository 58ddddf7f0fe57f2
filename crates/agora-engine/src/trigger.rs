//! Profile refresh cadence, driven only by the participant-message count.

/// Participant messages needed before the first profile
pub const FIRST_PROFILE_AT: u64 = 6;

/// Participant messages between refreshes after the first profile
pub const REFRESH_EVERY: u64 = 3;

/// Whether reaching `count` participant messages should (re)generate the profile
pub fn should_generate(count: u64) -> bool {
    count == FIRST_PROFILE_AT || (count > FIRST_PROFILE_AT && count % REFRESH_EVERY == 0)
}

/// Participant messages still missing before the next generation.
///
/// Counts down 6..1 before the first profile, then cycles 3, 2, 1.
pub fn messages_until_next_update(count: u64) -> u64 {
    if count < FIRST_PROFILE_AT {
        return FIRST_PROFILE_AT - count;
    }
    match count % REFRESH_EVERY {
        0 => REFRESH_EVERY,
        rem => REFRESH_EVERY - rem,
    }
}
