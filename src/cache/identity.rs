//! Call identity types.
//!
//! Everything here is supplied by the interception layer and only borrowed by the
//! key builder.

use std::any::{Any, type_name};
use std::fmt;

/// The intercepted component's type, rendered by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentType {
    name: String,
}

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Use the Rust type name of `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(type_name::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A component instance that owns cached methods.
///
/// The unique id separates cache entries of two instances of the same type. It must
/// not contain the key separator `|`.
pub trait CachingComponent: Send + Sync {
    fn unique_id(&self) -> &str;
}

/// Plain string identity for components that carry no other state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl CachingComponent for ComponentId {
    fn unique_id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Method name plus its declared parameter types, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    name: String,
    parameter_types: Vec<String>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
        }
    }

    /// Append a declared parameter type by name.
    pub fn with_parameter(mut self, parameter_type: impl Into<String>) -> Self {
        self.parameter_types.push(parameter_type.into());
        self
    }

    /// Append a declared parameter type using the Rust type name of `T`.
    pub fn with_parameter_of<T: ?Sized>(self) -> Self {
        self.with_parameter(type_name::<T>())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }
}

/// A borrowed, present argument value.
///
/// A null argument is represented by `None` in the argument list, never by an
/// `Argument`. The runtime type name is captured at construction so encoders and the
/// suspicious-parameter check can compare against it.
#[derive(Clone, Copy)]
pub struct Argument<'a> {
    value: &'a dyn Any,
    debug: &'a dyn fmt::Debug,
    display: Option<&'a dyn fmt::Display>,
    type_name: &'static str,
}

impl<'a> Argument<'a> {
    /// Wrap a value that only exposes `Debug`.
    pub fn new<T: Any + fmt::Debug>(value: &'a T) -> Self {
        Self {
            value,
            debug: value,
            display: None,
            type_name: type_name::<T>(),
        }
    }

    /// Wrap a value that also has a `Display` rendering.
    pub fn display<T: Any + fmt::Debug + fmt::Display>(value: &'a T) -> Self {
        Self {
            value,
            debug: value,
            display: Some(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn as_debug(&self) -> &'a dyn fmt::Debug {
        self.debug
    }

    pub fn as_display(&self) -> Option<&'a dyn fmt::Display> {
        self.display
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        let value: &'a dyn Any = self.value;
        value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Argument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("type_name", &self.type_name)
            .field("value", self.debug)
            .finish()
    }
}

/// Everything the key builder reads about one intercepted call.
#[derive(Clone, Copy)]
pub struct CallIdentity<'a> {
    pub component_type: &'a ComponentType,
    pub component: &'a dyn CachingComponent,
    pub method: &'a MethodSignature,
    pub arguments: &'a [Option<Argument<'a>>],
}

impl<'a> CallIdentity<'a> {
    pub fn new(
        component_type: &'a ComponentType,
        component: &'a dyn CachingComponent,
        method: &'a MethodSignature,
        arguments: &'a [Option<Argument<'a>>],
    ) -> Self {
        Self {
            component_type,
            component,
            method,
            arguments,
        }
    }
}

impl fmt::Debug for CallIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallIdentity")
            .field("component_type", self.component_type)
            .field("component", &self.component.unique_id())
            .field("method", self.method)
            .field("arguments", &self.arguments)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_of_uses_rust_type_name() {
        assert_eq!(ComponentType::of::<String>().name(), "alloc::string::String");
        assert_eq!(ComponentType::new("Repo").to_string(), "Repo");
    }

    #[test]
    fn method_signature_keeps_declaration_order() {
        let method = MethodSignature::new("Save")
            .with_parameter("Int32")
            .with_parameter_of::<u64>()
            .with_parameter("String");

        assert_eq!(method.name(), "Save");
        assert_eq!(method.parameter_types(), ["Int32", "u64", "String"]);
    }

    #[test]
    fn argument_captures_runtime_type_name() {
        let id = 42_u32;
        let argument = Argument::display(&id);

        assert_eq!(argument.type_name(), "u32");
        assert_eq!(argument.downcast_ref::<u32>(), Some(&42));
        assert!(argument.downcast_ref::<i64>().is_none());
        assert_eq!(
            argument.as_display().map(|value| value.to_string()).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn debug_only_argument_has_no_display_view() {
        let values = vec![1, 2, 3];
        let argument = Argument::new(&values);

        assert!(argument.as_display().is_none());
        assert_eq!(format!("{:?}", argument.as_debug()), "[1, 2, 3]");
        assert_eq!(argument.type_name(), "alloc::vec::Vec<i32>");
    }
}
