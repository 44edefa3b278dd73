//! Command lookup over a tree of named handlers.
//!
//! The positional words under `_` select a handler one word at a time.
//! Lookup is pure: it returns the handler and the leftover words, and the
//! caller decides how to invoke it. [`run`] does resolve + lookup + invoke
//! in one step.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{ConfigError, ResolveOptions, resolve};
use crate::constants::ARGS_KEY;

/// Word under which a tree may provide its own fallback handler.
pub const HELP_COMMAND: &str = "help";

/// Errors from command dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid arguments")]
    InvalidArguments { args: Vec<String> },
}

/// Errors from [`run`].
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// One node of a command tree.
#[derive(Debug)]
pub enum Node<H> {
    Command(H),
    Tree(CommandTree<H>),
}

/// Nested mapping of command words to handlers.
#[derive(Debug)]
pub struct CommandTree<H> {
    children: IndexMap<String, Node<H>>,
}

impl<H> Default for CommandTree<H> {
    fn default() -> Self {
        Self {
            children: IndexMap::new(),
        }
    }
}

impl<H> CommandTree<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf handler under `word`.
    pub fn command(mut self, word: impl Into<String>, handler: H) -> Self {
        self.children.insert(word.into(), Node::Command(handler));
        self
    }

    /// Add a nested tree under `word`.
    pub fn subtree(mut self, word: impl Into<String>, tree: CommandTree<H>) -> Self {
        self.children.insert(word.into(), Node::Tree(tree));
        self
    }

    pub fn get(&self, word: &str) -> Option<&Node<H>> {
        self.children.get(word)
    }

    /// Words available at this level, in insertion order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// The `help` handler at this level, if it is a leaf.
    pub fn help(&self) -> Option<&H> {
        match self.children.get(HELP_COMMAND) {
            Some(Node::Command(handler)) => Some(handler),
            _ => None,
        }
    }
}

/// Outcome of a command lookup.
#[derive(Debug)]
pub enum CommandMatch<'a, H> {
    /// The words named a handler.
    Matched { handler: &'a H, args: Vec<String> },
    /// No handler matched; the fallback applies.
    Fallback { handler: &'a H, args: Vec<String> },
}

impl<'a, H> CommandMatch<'a, H> {
    pub fn handler(&self) -> &'a H {
        match self {
            CommandMatch::Matched { handler, .. } | CommandMatch::Fallback { handler, .. } => *handler,
        }
    }

    /// Words left over after the consumed command words.
    pub fn args(&self) -> &[String] {
        match self {
            CommandMatch::Matched { args, .. } | CommandMatch::Fallback { args, .. } => args,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CommandMatch::Fallback { .. })
    }
}

/// Look up the handler named by `words`.
///
/// Each word descends one level while the current node is a tree; consumed
/// words are removed from the returned arguments. When nothing matches,
/// `fallback` (or else the root `help` command) is returned.
pub fn find_command<'a, H>(
    tree: &'a CommandTree<H>,
    words: &[String],
    fallback: Option<&'a H>,
) -> Result<CommandMatch<'a, H>, DispatchError> {
    let mut current = tree;
    let mut consumed = 0;

    let found = loop {
        let Some(word) = words.get(consumed) else {
            break None;
        };
        consumed += 1;
        match current.get(word) {
            Some(Node::Command(handler)) => break Some(handler),
            Some(Node::Tree(subtree)) => current = subtree,
            None => break None,
        }
    };

    let args = words[consumed..].to_vec();
    match found {
        Some(handler) => Ok(CommandMatch::Matched { handler, args }),
        None => match fallback.or_else(|| tree.help()) {
            Some(handler) => Ok(CommandMatch::Fallback { handler, args }),
            None => Err(DispatchError::InvalidArguments { args }),
        },
    }
}

/// The positional words of a resolved configuration.
///
/// Numbers are rendered as their decimal text so `cmd 2` can match a word.
pub fn command_words(config: &Map<String, Value>) -> Vec<String> {
    match config.get(ARGS_KEY) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolve configuration, find the command named by `_`, and invoke it.
pub fn run<H, R>(
    options: &ResolveOptions,
    tree: &CommandTree<H>,
    fallback: Option<&H>,
) -> Result<R, RunError>
where
    H: Fn(&Map<String, Value>, &[String]) -> R,
{
    let config = resolve(options)?;
    let words = command_words(&config);
    let found = find_command(tree, &words, fallback)?;
    tracing::debug!(fallback = found.is_fallback(), args = ?found.args(), "dispatching command");
    Ok((found.handler())(&config, found.args()))
}
