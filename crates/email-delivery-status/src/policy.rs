//! Status ordering policy for out-of-order webhooks.

use partyhaus_config_and_utils::EmailStatusPolicy;
use partyhaus_database::EmailStatus;

/// Status to store when an event proposing `proposed` arrives for a log
/// currently at `current`.
///
/// `LastWriteWins` applies every event in arrival order. `ForwardOnly`
/// keeps the higher-ranked status and never leaves bounced or complained.
pub fn resolve_status(
    policy: EmailStatusPolicy,
    current: EmailStatus,
    proposed: EmailStatus,
) -> EmailStatus {
    match policy {
        EmailStatusPolicy::LastWriteWins => proposed,
        EmailStatusPolicy::ForwardOnly => {
            if current.is_terminal() || proposed.rank() < current.rank() {
                current
            } else {
                proposed
            }
        }
    }
}
