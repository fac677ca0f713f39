//! Lazy, memoizing beatmap previews.

pub mod hash;
pub mod memo;
mod record;

pub use hash::level_id_to_hash;
pub use memo::{MemoSlot, SingleFlight};
pub use record::{Downloadability, PreviewContext, PreviewRecord};
