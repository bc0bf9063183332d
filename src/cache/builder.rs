//! Key hierarchy builder.
//!
//! Builds the four nested key levels for an intercepted call and the combined
//! key-plus-ancestors value used by the interception layer.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, trace};

use super::ancestors::KeyAndAncestors;
use super::config::{EncoderKind, KeyConfig};
use super::diagnostics::{DiagnosticListener, DiagnosticNotifier, TracingListener};
use super::encoder::{DebugEncoder, DisplayEncoder, ParameterEncoder};
use super::identity::{Argument, CachingComponent, CallIdentity, ComponentType, MethodSignature};
use super::keys::{ARGUMENT_SEPARATOR, KEY_SEPARATOR};
use super::scope::{NoScope, ScopeProvider, TaskScope};

const METRIC_KEYS_BUILT: &str = "callkey_keys_built_total";
const METRIC_KEY_OPT_OUT: &str = "callkey_key_opt_out_total";

/// Builds cache keys for intercepted calls.
///
/// The encoder, scope provider and listener set are fixed once the builder is
/// constructed, so a single builder can be shared across threads. Nothing is memoized
/// between calls.
///
/// ```
/// use callkey::cache::{
///     Argument, ComponentId, ComponentType, DisplayEncoder, KeyBuilder, MethodSignature,
/// };
///
/// let builder = KeyBuilder::new(DisplayEncoder);
/// let repo = ComponentType::new("Repo");
/// let component = ComponentId::new("c1");
/// let find = MethodSignature::new("Find").with_parameter("Int32");
/// let arguments = [Some(Argument::display(&7))];
///
/// let key = builder.arguments_key(&repo, &component, &find, &arguments);
/// assert_eq!(key.as_deref(), Some("Repo|c1|Find|Int32|$7"));
/// ```
#[derive(Clone)]
pub struct KeyBuilder {
    encoder: Arc<dyn ParameterEncoder>,
    scope: Arc<dyn ScopeProvider>,
    notifier: DiagnosticNotifier,
}

impl KeyBuilder {
    /// A builder without scope and without diagnostic listeners.
    pub fn new(encoder: impl ParameterEncoder + 'static) -> Self {
        Self {
            encoder: Arc::new(encoder),
            scope: Arc::new(NoScope),
            notifier: DiagnosticNotifier::default(),
        }
    }

    /// Wire a builder from configuration.
    ///
    /// The scope provider is a [`TaskScope`] defaulting to the configured scope.
    pub fn from_config(config: &KeyConfig) -> Self {
        let builder = match config.encoder {
            EncoderKind::Display => Self::new(DisplayEncoder),
            EncoderKind::Debug => Self::new(DebugEncoder),
        }
        .with_scope(TaskScope::with_default(
            config.default_scope().map(str::to_string),
        ));

        if config.diagnostics {
            builder.with_listeners([Arc::new(TracingListener) as Arc<dyn DiagnosticListener>])
        } else {
            builder
        }
    }

    pub fn with_scope(mut self, scope: impl ScopeProvider + 'static) -> Self {
        self.scope = Arc::new(scope);
        self
    }

    /// Register additional diagnostic listeners.
    pub fn with_listeners(
        mut self,
        listeners: impl IntoIterator<Item = Arc<dyn DiagnosticListener>>,
    ) -> Self {
        self.notifier = self.notifier.with_listeners(listeners);
        self
    }

    pub fn notifier(&self) -> &DiagnosticNotifier {
        &self.notifier
    }

    /// Level 0: the type name verbatim.
    pub fn type_key(&self, component_type: &ComponentType) -> String {
        component_type.name().to_string()
    }

    /// Level 1: `Type|Component`.
    pub fn component_key(
        &self,
        component_type: &ComponentType,
        component: &dyn CachingComponent,
    ) -> String {
        let mut key = self.type_key(component_type);
        key.push(KEY_SEPARATOR);
        key.push_str(component.unique_id());
        key
    }

    /// Level 2: `Type|Component|Method|ParamType1|ParamType2...`.
    pub fn signature_key(
        &self,
        component_type: &ComponentType,
        component: &dyn CachingComponent,
        method: &MethodSignature,
    ) -> String {
        let mut key = self.component_key(component_type, component);
        key.push(KEY_SEPARATOR);
        key.push_str(method.name());
        for parameter_type in method.parameter_types() {
            key.push(KEY_SEPARATOR);
            key.push_str(parameter_type);
        }
        key
    }

    /// Level 3 without scope: the signature key followed by `|$Value1$Value2...`.
    ///
    /// Returns `None` as soon as one argument fails to encode; no partial key is
    /// produced.
    pub fn arguments_key(
        &self,
        component_type: &ComponentType,
        component: &dyn CachingComponent,
        method: &MethodSignature,
        arguments: &[Option<Argument<'_>>],
    ) -> Option<String> {
        let mut key = self.signature_key(component_type, component, method);
        key.push(KEY_SEPARATOR);

        for (position, argument) in arguments.iter().copied().enumerate() {
            let Some(encoded) = self.encoder.encode(argument) else {
                debug!(
                    component_type = component_type.name(),
                    method = method.name(),
                    position,
                    "Cache key skipped: argument opted out"
                );
                counter!(METRIC_KEY_OPT_OUT).increment(1);
                return None;
            };
            self.notifier.check_argument(argument, &encoded);
            key.push(ARGUMENT_SEPARATOR);
            key.push_str(&encoded);
        }

        Some(key)
    }

    /// Level 3: the arguments key plus `|Scope` when the scope provider returns a
    /// non-empty scope.
    pub fn full_key(&self, call: &CallIdentity<'_>) -> Option<String> {
        let mut key = self.arguments_key(
            call.component_type,
            call.component,
            call.method,
            call.arguments,
        )?;

        if let Some(scope) = self.scope.scope().filter(|scope| !scope.is_empty()) {
            key.push(KEY_SEPARATOR);
            key.push_str(&scope);
        }

        counter!(METRIC_KEYS_BUILT).increment(1);
        trace!(key = %key, "Cache key built");
        Some(key)
    }

    /// The full key of `call` with lazy access to its ancestors.
    pub fn key_and_ancestors(&self, call: &CallIdentity<'_>) -> KeyAndAncestors {
        KeyAndAncestors::from(self.full_key(call))
    }
}

impl fmt::Debug for KeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBuilder")
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}
