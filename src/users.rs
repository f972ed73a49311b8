//! User account provisioning
//!
//! Thin glue over idempotent helper shell scripts, one invocation per user
//! property. An unrecognized property is fatal for the whole run: silently
//! ignoring it would silently skip intended provisioning.
//!
//! When not running as root, only the invoking user's declaration is
//! processed; other users are skipped.

use crate::config::{ConfigDocument, UpstreamSpec, UserProperty};
use crate::error::Result;
use crate::exec::Runner;
use crate::paths::helpers_dir;

/// Provision every declared user of the document tree.
pub fn sync(doc: &ConfigDocument, runner: &Runner) -> Result<()> {
    let invoking = current_user();

    for (owner, user, raw) in doc.merged_users() {
        if user != invoking && invoking != "root" {
            continue;
        }

        let properties = owner.user_properties(user, raw)?;

        prepare(user, runner)?;
        for property in &properties {
            apply(user, property, runner)?;
        }
    }

    Ok(())
}

/// Diffing user state against the declaration is not implemented.
pub fn diff(_doc: &ConfigDocument) {
    println!("Not yet implemented");
}

fn prepare(user: &str, runner: &Runner) -> Result<()> {
    let helper = helpers_dir().join("user-prepare.sh");
    runner.run(&format!("{} {user}", helper.display()))?;
    Ok(())
}

fn apply(user: &str, property: &UserProperty, runner: &Runner) -> Result<()> {
    match property {
        UserProperty::Setup(commands) => {
            for command in commands {
                runner.run(&format!("sudo -u {user} {command}"))?;
            }
        }
        UserProperty::Environment(vars) => {
            let env_file = format!("{}/.config/env", home_dir(user));
            runner.run(&format!("echo > {env_file}"))?;
            for (key, value) in vars {
                runner.run(&format!("echo export {key}='{value}' >> {env_file}"))?;
            }
        }
        UserProperty::Dotfiles(spec) => run_dotfiles_helper("dotfiles", user, spec, runner)?,
        UserProperty::Scripts(spec) => run_dotfiles_helper("scripts", user, spec, runner)?,
        UserProperty::Home(spec) => run_dotfiles_helper("home", user, spec, runner)?,
    }
    Ok(())
}

fn run_dotfiles_helper(mode: &str, user: &str, spec: &UpstreamSpec, runner: &Runner) -> Result<()> {
    let helper = helpers_dir().join("dotfiles.sh");
    runner.run(&format!(
        "{} {mode} \"{user}\" \"{}\" \"{}\"",
        helper.display(),
        spec.upstream,
        spec.prefix
    ))?;
    Ok(())
}

fn home_dir(user: &str) -> String {
    if user == "root" {
        "/root".to_string()
    } else {
        format!("/home/{user}")
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeclarchError;

    fn doc(json: &str) -> ConfigDocument {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_home_dir_mapping() {
        assert_eq!(home_dir("root"), "/root");
        assert_eq!(home_dir("alice"), "/home/alice");
    }

    #[test]
    fn test_dry_sync_runs_nothing() {
        let json = format!(
            r#"{{"users": {{"{}": {{
                "setup": ["mkdir -p ~/src"],
                "environment": {{"EDITOR": "vim"}}
            }}}}}}"#,
            current_user()
        );
        let d = doc(&json);
        let runner = Runner::new(true, false);
        sync(&d, &runner).unwrap();
    }

    #[test]
    fn test_invalid_property_halts_run() {
        let json = format!(
            r#"{{"users": {{"{}": {{"wallpaper": "sunset.png"}}}}}}"#,
            current_user()
        );
        let d = doc(&json);
        let runner = Runner::new(true, false);
        let err = sync(&d, &runner).unwrap_err();
        assert!(matches!(err, DeclarchError::InvalidUserProperty { .. }));
    }
}
