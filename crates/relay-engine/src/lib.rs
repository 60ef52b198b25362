//! Relay Engine
//!
//! Generates delegation on classes of a [`relay_core::Runtime`]:
//! - Forwarding members that pass calls to a target expression (`forwarder`)
//!   with a per-request null policy and an inferred parameter shape
//!   (`signature`)
//! - Target resolution for class and expression targets (`resolver`,
//!   `receiver`, `reserved`)
//! - A catch-all proxy for members the owner does not define (`proxy`)
//!
//! ```ignore
//! let rt = Runtime::new();
//! let delegator = Delegator::new(&rt);
//! delegator.delegate(&post, DelegationRequest::new(["name"]).to("author").prefix(true))?;
//! delegator.delegate_missing_to(&wrapper, MissingRequest::new("inner"))?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod delegator;
pub mod error;
pub mod forwarder;
pub mod proxy;
pub mod receiver;
pub mod request;
pub mod reserved;
pub mod resolver;
pub mod signature;

pub use delegator::{DelegationPlan, Delegator};
pub use error::{ConfigError, ConfigResult};
pub use forwarder::{ForwardedMember, Forwarder, NullPolicy};
pub use proxy::MissingProxy;
pub use receiver::ReceiverExpr;
pub use request::{DelegationRequest, MissingRequest, Prefix, TargetDescriptor, SERIALIZATION_HOOKS};
pub use reserved::ReservedNames;
pub use resolver::{CapabilitySource, ResolvedTarget, Surface};
pub use signature::ParamShape;
