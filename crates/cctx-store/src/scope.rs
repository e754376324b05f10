//! Settings scopes and where each one keeps its files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const CLAUDE_DIR: &str = ".claude";
const CONTEXTS_DIR: &str = "settings";
const STATE_FILE: &str = ".cctx-state.json";
const LOCAL_STATE_FILE: &str = ".cctx-state.local.json";
const SETTINGS_FILE: &str = "settings.json";
const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

/// Which settings document a store manages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The per-user settings under the home directory.
    #[default]
    User,
    /// Shared project settings under the working directory.
    Project,
    /// Uncommitted per-checkout project settings.
    Local,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Project => "project",
            Scope::Local => "local",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            "local" => Ok(Scope::Local),
            other => Err(format!(
                "unknown scope {other:?} (expected user, project, or local)"
            )),
        }
    }
}

/// The three locations a scope is made of.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopePaths {
    pub scope: Scope,
    /// Directory holding `<name>.json` context documents and their history.
    pub contexts_dir: PathBuf,
    /// The document the tool actually reads.
    pub active_document: PathBuf,
    /// The `{ current, previous }` pointer file.
    pub state_file: PathBuf,
}

impl ScopePaths {
    /// Resolve the paths of `scope` for a user with home directory `home`
    /// working in `cwd`. Touches nothing on disk.
    pub fn resolve(scope: Scope, home: &Path, cwd: &Path) -> Self {
        let base = match scope {
            Scope::User => home.join(CLAUDE_DIR),
            Scope::Project | Scope::Local => cwd.join(CLAUDE_DIR),
        };
        let contexts_dir = base.join(CONTEXTS_DIR);
        let (active, state) = match scope {
            Scope::User | Scope::Project => (SETTINGS_FILE, STATE_FILE),
            Scope::Local => (LOCAL_SETTINGS_FILE, LOCAL_STATE_FILE),
        };
        Self {
            scope,
            active_document: base.join(active),
            state_file: contexts_dir.join(state),
            contexts_dir,
        }
    }

    /// The user-scope active document, the `user` merge source.
    pub fn user_settings(home: &Path) -> PathBuf {
        home.join(CLAUDE_DIR).join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_scope_lives_in_home() {
        let p = ScopePaths::resolve(Scope::User, Path::new("/home/u"), Path::new("/w"));
        assert_eq!(p.contexts_dir, PathBuf::from("/home/u/.claude/settings"));
        assert_eq!(p.active_document, PathBuf::from("/home/u/.claude/settings.json"));
        assert_eq!(
            p.state_file,
            PathBuf::from("/home/u/.claude/settings/.cctx-state.json")
        );
        assert_eq!(p.active_document, ScopePaths::user_settings(Path::new("/home/u")));
    }

    #[test]
    fn project_scope_lives_in_cwd() {
        let p = ScopePaths::resolve(Scope::Project, Path::new("/home/u"), Path::new("/w"));
        assert_eq!(p.contexts_dir, PathBuf::from("/w/.claude/settings"));
        assert_eq!(p.active_document, PathBuf::from("/w/.claude/settings.json"));
        assert_eq!(p.state_file, PathBuf::from("/w/.claude/settings/.cctx-state.json"));
    }

    #[test]
    fn local_scope_uses_local_files() {
        let p = ScopePaths::resolve(Scope::Local, Path::new("/home/u"), Path::new("/w"));
        assert_eq!(p.contexts_dir, PathBuf::from("/w/.claude/settings"));
        assert_eq!(p.active_document, PathBuf::from("/w/.claude/settings.local.json"));
        assert_eq!(
            p.state_file,
            PathBuf::from("/w/.claude/settings/.cctx-state.local.json")
        );
    }

    #[test]
    fn scope_parses_and_displays() {
        for scope in [Scope::User, Scope::Project, Scope::Local] {
            assert_eq!(scope.to_string().parse::<Scope>().unwrap(), scope);
        }
        assert!("global".parse::<Scope>().is_err());
        assert_eq!(Scope::default(), Scope::User);
    }
}
