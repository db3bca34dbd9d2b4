// crates/snapqueue-core/src/runtime/mod.rs
// ============================================================================
// Module: Snapqueue Runtime
// Description: Pure runtime logic shared by the sync worker and foreground.
// Purpose: Group codec, protocol, classification, catalog, gallery, and memory store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! Pure runtime logic shared by the sync worker and foreground.

pub mod catalog;
pub mod codec;
pub mod delivery;
pub mod gallery;
pub mod protocol;
pub mod store;

pub use catalog::CatalogError;
pub use catalog::parse_catalog;
pub use codec::CodecError;
pub use codec::DecodedPayload;
pub use codec::DeliveryForm;
pub use codec::MAX_CAPTURE_BYTES;
pub use codec::RawCapture;
pub use delivery::DeliveryOutcome;
pub use delivery::classify_response;
pub use protocol::PROTOCOL_VERSION;
pub use protocol::ProtocolEnvelope;
pub use protocol::ProtocolError;
pub use protocol::SyncMessage;
pub use store::InMemoryQueueStore;
