//! Home-directory expansion for config file paths.

use std::path::{Component, Path, PathBuf};

use crate::env::Env;

/// Expand a leading `~` in `path` to the user's home directory.
///
/// - `""` is returned unchanged.
/// - `"~"` becomes the home directory.
/// - `"~/rest"` becomes `<home>/rest`, joined component by component so
///   redundant separators collapse and `..` steps out of the directory
///   before it.
/// - Anything else, including `"~user"`, is returned as-is.
pub fn expand_home(path: &str, env: &Env) -> PathBuf {
    if path == "~" {
        return env.home_dir();
    }

    match path.strip_prefix("~/") {
        Some(rest) => {
            let mut expanded = env.home_dir();
            for component in Path::new(rest).components() {
                match component {
                    Component::Normal(part) => expanded.push(part),
                    Component::ParentDir => parent_dir(&mut expanded),
                    _ => {}
                }
            }
            expanded
        }
        None => PathBuf::from(path),
    }
}

/// Apply one `..` lexically. `..` above the root stays at the root; above
/// a relative start it is kept.
fn parent_dir(path: &mut PathBuf) {
    let can_pop = matches!(path.components().next_back(), Some(Component::Normal(_)));
    if can_pop {
        path.pop();
    } else if !path.has_root() {
        path.push("..");
    }
}
