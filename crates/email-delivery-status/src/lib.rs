//! Email delivery status reducer.
//!
//! Inbound provider webhooks are applied to durable Email Log records as an
//! idempotent state transition, each call leaving one Email Event audit row.
//! The reducer is storage-agnostic: [`DeliveryStore`] has a local SQLite
//! implementation and a Supabase REST implementation.
//!
//! The crate also owns the outbound half of the lifecycle: sending an
//! invitation through Resend and recording the Email Log that later webhooks
//! resolve against.

mod error;
mod event;
mod invitation;
mod policy;
mod reducer;
mod resend;
mod store;

#[cfg(test)]
mod test_support;

pub use error::{DeliveryError, DeliveryResult};
pub use event::{DeliveryEvent, DeliveryEventType};
pub use invitation::{render_invitation, InvitationDispatcher};
pub use policy::resolve_status;
pub use reducer::{DeliveryOutcome, DeliveryReducer};
pub use resend::{OutboundEmail, ResendClient, DEFAULT_RESEND_API_URL};
pub use store::{DeliveryStore, SqliteDeliveryStore, SupabaseDeliveryStore};
