//! Replacing the current process with the target command.

use crate::{Result, SetSecretsError};
use std::convert::Infallible;
use std::path::PathBuf;
use std::process::Command;

/// Resolves `program` the way a shell would.
pub fn resolve_program(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| SetSecretsError::CommandNotFound(program.to_string()))
}

/// Builds the command for `argv`, with `envs` added on top of the inherited
/// environment.
pub fn build_command(argv: &[String], envs: &[(String, String)]) -> Result<Command> {
    let (program, args) = argv.split_first().ok_or(SetSecretsError::NoCommand)?;
    let path = resolve_program(program)?;

    let mut cmd = Command::new(path);
    cmd.args(args);
    cmd.envs(envs.iter().map(|(k, v)| (k, v)));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.arg0(program);
    }

    Ok(cmd)
}

/// Replaces the current process image with `argv`.
///
/// Only returns on failure. On platforms without `exec`, the command is run
/// as a child and the current process exits with its status.
pub fn replace_process(argv: &[String], envs: &[(String, String)]) -> Result<Infallible> {
    let mut cmd = build_command(argv, envs)?;

    tracing::debug!(program = %argv[0], variables = envs.len(), "Executing command");

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        return Err(cmd.exec().into());
    }

    #[cfg(not(unix))]
    {
        let status = cmd.status()?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program() {
        let argv = vec!["setsecrets-test-no-such-program".to_string()];
        match build_command(&argv, &[]) {
            Err(SetSecretsError::CommandNotFound(name)) => {
                assert_eq!(name, "setsecrets-test-no-such-program")
            }
            other => panic!("Expected CommandNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_argv() {
        assert!(matches!(
            build_command(&[], &[]),
            Err(SetSecretsError::NoCommand)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_sees_assigned_variables() {
        let argv = vec![
            "sh".to_string(),
            "-c".to_string(),
            "printf '%s' \"$SETSECRETS_TEST_VALUE\"".to_string(),
        ];
        let envs = vec![("SETSECRETS_TEST_VALUE".to_string(), "s3cr3t".to_string())];

        let output = build_command(&argv, &envs).unwrap().output().unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8(output.stdout).unwrap(), "s3cr3t");
    }
}
