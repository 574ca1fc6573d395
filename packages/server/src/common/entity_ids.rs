//! Typed ID aliases for the domain entities.
//!
//! Each alias wraps a UUID in `Id<T>` so the compiler rejects a mixed-up
//! `EventId`/`WorkshopId` argument.

pub use super::id::Id;

/// Marker type for Member entities (fest attendees).
pub struct Member;

/// Marker type for catalog events.
pub struct FestEvent;

/// Marker type for catalog workshops.
pub struct Workshop;

/// Marker type for payment orders.
pub struct PaymentOrder;

/// Typed ID for Member entities.
pub type MemberId = Id<Member>;

/// Typed ID for catalog events.
pub type EventId = Id<FestEvent>;

/// Typed ID for catalog workshops.
pub type WorkshopId = Id<Workshop>;

/// Typed ID for payment orders.
pub type OrderId = Id<PaymentOrder>;
