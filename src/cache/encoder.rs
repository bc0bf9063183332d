//! Argument encoding.
//!
//! One encoder is installed per [`KeyBuilder`](super::KeyBuilder). Returning `None`
//! opts the whole call out of caching; it is not an error.

use super::identity::Argument;

/// Fragment used by the built-in encoders for a null argument.
pub const NULL_ARGUMENT: &str = "null";

/// Turns one argument into its key fragment.
///
/// Implementations must be pure: equal arguments encode identically. A null argument
/// (`None`) should encode to a fixed sentinel rather than opt out. The fragment must
/// not contain `|`.
pub trait ParameterEncoder: Send + Sync {
    fn encode(&self, argument: Option<Argument<'_>>) -> Option<String>;
}

impl<F> ParameterEncoder for F
where
    F: Fn(Option<Argument<'_>>) -> Option<String> + Send + Sync,
{
    fn encode(&self, argument: Option<Argument<'_>>) -> Option<String> {
        self(argument)
    }
}

/// Encodes through `Display`; arguments registered without one opt out.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayEncoder;

impl ParameterEncoder for DisplayEncoder {
    fn encode(&self, argument: Option<Argument<'_>>) -> Option<String> {
        match argument {
            None => Some(NULL_ARGUMENT.to_string()),
            Some(argument) => argument.as_display().map(|value| value.to_string()),
        }
    }
}

/// Encodes through `Debug`. Never opts out.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugEncoder;

impl ParameterEncoder for DebugEncoder {
    fn encode(&self, argument: Option<Argument<'_>>) -> Option<String> {
        match argument {
            None => Some(NULL_ARGUMENT.to_string()),
            Some(argument) => Some(format!("{:?}", argument.as_debug())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_encoder_renders_value() {
        let value = 7_i32;
        assert_eq!(
            DisplayEncoder.encode(Some(Argument::display(&value))).as_deref(),
            Some("7")
        );
    }

    #[test]
    fn display_encoder_opts_out_without_display() {
        let values = vec![1, 2];
        assert!(DisplayEncoder.encode(Some(Argument::new(&values))).is_none());
    }

    #[test]
    fn null_argument_encodes_to_sentinel() {
        assert_eq!(DisplayEncoder.encode(None).as_deref(), Some(NULL_ARGUMENT));
        assert_eq!(DebugEncoder.encode(None).as_deref(), Some(NULL_ARGUMENT));
    }

    #[test]
    fn debug_encoder_quotes_strings() {
        let name = "ada".to_string();
        assert_eq!(
            DebugEncoder.encode(Some(Argument::display(&name))).as_deref(),
            Some("\"ada\"")
        );
    }

    #[test]
    fn closures_are_encoders() {
        let encoder = |argument: Option<Argument<'_>>| {
            argument
                .and_then(|argument| argument.downcast_ref::<u64>().copied())
                .map(|id| format!("id-{id}"))
        };
        let id = 9_u64;

        assert_eq!(encoder.encode(Some(Argument::new(&id))).as_deref(), Some("id-9"));
        assert!(encoder.encode(None).is_none());
    }
}
