//! # Predicates
//!
//! Native predicate behaviours and the address registry that dispatches to them.
//!
//! | Predicate | State words | Deprecation witness |
//! |-----------|-------------|---------------------|
//! | Ownership | `[owner]` | a signature by `owner` |
//! | PaymentChannel | `[hash, participant1, participant2, stateIndex]` | signatures by both participants, in order |

pub mod manager;
pub mod native;
pub mod ownership;
pub mod payment_channel;

pub use manager::PredicatesManager;
pub use native::NativePredicate;
pub use ownership::OwnershipPredicate;
pub use payment_channel::{ChannelState, PaymentChannelPredicate};
