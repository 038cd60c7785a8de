//! The payment-gated upload lifecycle.
//!
//! Two paths redeem a quote:
//!
//! 1. The client uploads directly to storage with the write credential
//!    from [`UploadAuthorizer`]; the storage notification then drives the
//!    advertisement trigger.
//! 2. The client posts the bytes to the service itself; [`PaymentGate`]
//!    validates payment and runs the same hash/advertise sequence inline.

mod authorizer;
mod gate;
mod verify;

pub use authorizer::{
    generate_object_identifier, AuthorizeError, AuthorizedUpload, QuoteInput, UploadAuthorizer,
};
pub use gate::{GateError, PaymentGate, UploadReceipt};
pub use verify::{PaymentVerifier, RawTxVerifier};
