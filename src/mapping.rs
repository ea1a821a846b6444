//! Environment variable mappings and command line splitting.
//!
//! A mapping argument has the form `NAME=SECRET_KEY`: the secret identified
//! by `SECRET_KEY` is exported to the target command as `NAME`.

use crate::loader::SecretMap;
use crate::{Result, SetSecretsError};
use std::collections::HashSet;

/// Ordered `(variable, secret key)` pairs requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMapping {
    entries: Vec<(String, String)>,
}

impl EnvMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `variable` ← `key`, rejecting a variable that is already mapped.
    pub fn insert(&mut self, variable: impl Into<String>, key: impl Into<String>) -> Result<()> {
        let variable = variable.into();
        if self.entries.iter().any(|(existing, _)| *existing == variable) {
            return Err(SetSecretsError::DuplicateVariable(variable));
        }
        self.entries.push((variable, key.into()));
        Ok(())
    }

    /// Parses one `NAME=SECRET_KEY` argument and adds it.
    pub fn insert_arg(&mut self, arg: &str) -> Result<()> {
        let (variable, key) = parse_assignment(arg)?;
        self.insert(variable, key)
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct secret keys to retrieve, in first-mapped order.
    pub fn keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .filter(|(_, key)| seen.insert(key.as_str()))
            .map(|(_, key)| key.clone())
            .collect()
    }
}

fn parse_assignment(arg: &str) -> Result<(&str, &str)> {
    let (variable, key) = arg
        .split_once('=')
        .ok_or_else(|| {
            SetSecretsError::InvalidMapping(arg.to_string(), "expected NAME=SECRET_KEY")
        })?;

    if variable.is_empty() {
        return Err(SetSecretsError::InvalidMapping(
            arg.to_string(),
            "environment variable name is missing",
        ));
    }
    if variable.contains('\0') {
        return Err(SetSecretsError::InvalidMapping(
            arg.to_string(),
            "environment variable name contains a NUL byte",
        ));
    }
    if key.is_empty() {
        return Err(SetSecretsError::InvalidMapping(
            arg.to_string(),
            "secret key is missing",
        ));
    }

    Ok((variable, key))
}

/// A parsed `[NAME=SECRET_KEY]... [--] COMMAND [ARGS]...` argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mapping: EnvMapping,
    pub command: Vec<String>,
}

impl Invocation {
    /// Splits positional arguments into mappings and the target command.
    ///
    /// Leading arguments containing `=` are mappings. `--` ends the mappings
    /// explicitly; otherwise the first argument without `=` starts the
    /// command. An argument starting with `=` is a mapping without a name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping = EnvMapping::new();
        let mut args = args.into_iter().map(Into::into).peekable();

        while let Some(arg) = args.peek() {
            if arg == "--" {
                args.next();
                break;
            }
            if !arg.contains('=') {
                break;
            }
            mapping.insert_arg(arg)?;
            args.next();
        }

        let command: Vec<String> = args.collect();
        if command.is_empty() {
            return Err(SetSecretsError::NoCommand);
        }

        Ok(Self { mapping, command })
    }
}

/// Builds the variable assignments for the target command.
///
/// Every mapped variable receives the value of its secret key; a key absent
/// from `secrets` is a [`SetSecretsError::LostSecret`]. Nothing is written to
/// the current process environment.
pub fn apply(secrets: &SecretMap, mapping: &EnvMapping) -> Result<Vec<(String, String)>> {
    mapping
        .entries()
        .iter()
        .map(|(variable, key)| {
            secrets
                .get(key)
                .map(|value| (variable.clone(), value.clone()))
                .ok_or_else(|| SetSecretsError::LostSecret(key.clone()))
        })
        .collect()
}
