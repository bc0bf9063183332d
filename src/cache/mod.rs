//! Cache key derivation for intercepted method calls.
//!
//! Keys nest in four levels, each a prefix of the next:
//!
//! - **Type**: `Repo`
//! - **Component**: `Repo|c1`
//! - **Signature**: `Repo|c1|Find|Int32`
//! - **Full**: `Repo|c1|Find|Int32|$7|tenant-a`
//!
//! [`KeyBuilder`] produces them, [`ParameterEncoder`] and [`ScopeProvider`] are the
//! extension points, and [`ancestor_keys`] derives every invalidation key of a full key.
//!
//! ## Configuration
//!
//! ```toml
//! [keys]
//! encoder = "display"
//! scope = "tenant-a"
//! diagnostics = true
//! ```

mod ancestors;
mod builder;
mod config;
mod diagnostics;
mod encoder;
mod identity;
mod keys;
mod lock;
pub mod scope;

pub use ancestors::{AncestorKeys, KeyAndAncestors, ancestor_keys};
pub use builder::KeyBuilder;
pub use config::{EncoderKind, KeyConfig};
pub use diagnostics::{
    DiagnosticListener, DiagnosticNotifier, RecordingListener, TracingListener,
    suspicious_parameter_message,
};
pub use encoder::{DebugEncoder, DisplayEncoder, NULL_ARGUMENT, ParameterEncoder};
pub use identity::{
    Argument, CachingComponent, CallIdentity, ComponentId, ComponentType, MethodSignature,
};
pub use keys::{ARGUMENT_SEPARATOR, KEY_SEPARATOR, KeyLevel};
pub use scope::{FixedScope, NoScope, ScopeProvider, TaskScope};
