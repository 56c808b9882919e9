//! Natural-language intent handling for Azure Copilot.
//!
//! Turns one line of operator text into a typed [`Intent`] and then into a
//! [`ResolvedIntent`] whose required slots are filled:
//!
//! 1. [`classify`] picks the [`IntentKind`] and extracts slots from the text.
//!    It never fails; anything unrecognized becomes `UNKNOWN`.
//! 2. [`resolve`] fills missing required slots from configuration defaults,
//!    or reports exactly which slots are still missing.
//!
//! Classification sits behind the [`IntentClassifier`] trait. The keyword
//! matcher here is a baseline; a model-backed classifier can replace it
//! without changes to resolution, planning or execution.
//!
//! [`Intent`]: azcopilot_core::Intent
//! [`IntentKind`]: azcopilot_core::IntentKind
//! [`ResolvedIntent`]: azcopilot_core::ResolvedIntent

pub mod classifier;
pub mod error;
pub mod extract;
pub mod resolver;

pub use classifier::{IntentClassifier, KeywordClassifier, classify, classify_kind};
pub use error::UnresolvedSlotError;
pub use resolver::{describe_slot, resolve, resolve_with_answers};
