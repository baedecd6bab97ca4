//! Command registry mapping operation names to typed handlers.
//!
//! Each operation implements [`Command`] with its own argument struct. The
//! registry erases the argument type behind [`ErasedCommand`], so the dispatch
//! machinery only ever sees a name, a JSON argument map, and a reply map.
//! Registration happens once through [`CommandRegistryBuilder`]; the built
//! [`CommandRegistry`] is immutable.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::context::CommandContext;
use super::errors::DispatchError;

/// Success fields returned by a command.
pub type Reply = Map<String, Value>;

/// A named operation with a typed argument schema.
///
/// Argument structs should use `#[serde(deny_unknown_fields)]` so extra
/// request fields are rejected alongside missing or mistyped ones.
pub trait Command: Send + Sync + 'static {
    /// Wire name of the operation.
    const NAME: &'static str;

    /// Arguments decoded from the request's remaining fields.
    type Args: DeserializeOwned;

    /// Runs the operation.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] describing why the operation failed.
    fn execute(&self, args: Self::Args, context: &CommandContext) -> Result<Reply, DispatchError>;
}

/// Object-safe view of a registered command.
pub trait ErasedCommand: Send + Sync {
    /// Wire name of the operation.
    fn name(&self) -> &'static str;

    /// Decodes `arguments` and runs the operation.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::InvalidArguments` when decoding fails, or the
    /// command's own error when execution fails.
    fn invoke(
        &self,
        arguments: Map<String, Value>,
        context: &CommandContext,
    ) -> Result<Reply, DispatchError>;
}

struct Registered<C>(C);

impl<C: Command> ErasedCommand for Registered<C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn invoke(
        &self,
        arguments: Map<String, Value>,
        context: &CommandContext,
    ) -> Result<Reply, DispatchError> {
        let args = serde_json::from_value::<C::Args>(Value::Object(arguments))
            .map_err(|error| DispatchError::invalid_arguments(C::NAME, error.to_string()))?;
        self.0.execute(args, context)
    }
}

/// Converts a serializable reply struct into a [`Reply`] map.
///
/// # Errors
///
/// Returns `DispatchError::SerializeResponse` if encoding fails, or
/// `DispatchError::Internal` if the value does not encode to a JSON object.
pub fn into_reply<T: Serialize>(value: &T) -> Result<Reply, DispatchError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DispatchError::internal(format!(
            "reply must encode to an object, got {other}"
        ))),
    }
}

/// Errors raised while assembling the registry at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two commands claimed the same name.
    #[error("command '{name}' is already registered")]
    DuplicateCommand { name: String },
    /// The command name is empty or contains whitespace.
    #[error("invalid command name '{name}'")]
    InvalidName { name: String },
}

/// Collects commands before the transport starts.
#[derive(Default)]
pub struct CommandRegistryBuilder {
    commands: HashMap<&'static str, Box<dyn ErasedCommand>>,
}

impl CommandRegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its [`Command::NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] for empty or whitespace-bearing
    /// names and [`RegistryError::DuplicateCommand`] when the name is taken.
    pub fn register<C: Command>(mut self, command: C) -> Result<Self, RegistryError> {
        let name = C::NAME;
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RegistryError::InvalidName {
                name: name.to_owned(),
            });
        }
        if self.commands.contains_key(name) {
            return Err(RegistryError::DuplicateCommand {
                name: name.to_owned(),
            });
        }
        self.commands.insert(name, Box::new(Registered(command)));
        Ok(self)
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            commands: self.commands,
        }
    }
}

/// Immutable name → handler table shared by every dispatch unit.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ErasedCommand>>,
}

impl CommandRegistry {
    /// Starts a new registry.
    #[must_use]
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::new()
    }

    /// Looks up a command by name.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownCommand` when nothing is registered
    /// under `name`.
    pub fn lookup(&self, name: &str) -> Result<&dyn ErasedCommand, DispatchError> {
        self.commands
            .get(name)
            .map(|command| &**command)
            .ok_or_else(|| DispatchError::unknown_command(name))
    }

    /// Registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests;
