pub mod decoders;
pub mod hand;
pub mod odds;
pub mod registry;
pub mod types;

pub use decoders::{decoder_for, BatchDecode, DecodeError, DecodeFailure, EventOutcome, SettlementDecoder};
pub use registry::{GameDescriptor, GameRegistry};
pub use types::*;
