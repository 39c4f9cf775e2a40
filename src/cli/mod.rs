//! Command-line interface.

pub mod env;
pub mod fetch;
pub mod files;
pub mod init;
pub mod login;
pub mod member;
pub mod output;
pub mod push;
pub mod run;
pub mod secrets;

use clap::{Parser, Subcommand};

use crate::core::config::AccountConfig;
use crate::core::store::EnvStore;
use crate::error::Result;

/// Satchel - team secrets, scoped per deployment environment.
#[derive(Parser)]
#[command(
    name = "satchel",
    about = "Team secrets, scoped per deployment environment",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a satchel project in the current directory
    Init {
        /// Project name
        name: String,
        /// Server-side project identifier, when the project already exists
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Log in through the identity provider
    Login,

    /// Manage environments
    Env {
        #[command(subcommand)]
        action: EnvAction,
    },

    /// Manage secrets
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Manage tracked files
    File {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Manage project members
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Pull pending changes for an environment
    Fetch {
        /// Environment to fetch (default: current)
        #[arg(long)]
        env: Option<String>,
    },

    /// Send the current environment's content to all members
    Push {
        /// Environment to push (default: current)
        #[arg(long)]
        env: Option<String>,
    },

    /// Run a command with the current environment's secrets injected
    Run {
        /// Command and arguments
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum EnvAction {
    /// List environments, marking the current one
    List,
    /// Create an environment
    New { name: String },
    /// Remove an environment and its cached content
    Rm { name: String },
    /// Switch the current environment
    Switch { name: String },
}

#[derive(Subcommand)]
pub enum SecretAction {
    /// Set a secret value
    Set {
        key: String,
        value: String,
        /// Environments to set the value in (default: all)
        #[arg(short, long = "env")]
        envs: Vec<String>,
        /// Mark the secret as required
        #[arg(long)]
        required: bool,
    },
    /// Show a secret's value in every environment
    Show { key: String },
    /// Remove a secret from every environment
    Rm { key: String },
    /// List declared secrets
    List,
    /// Mark a secret as required
    Require { key: String },
    /// Mark a secret as optional
    Optional { key: String },
}

#[derive(Subcommand)]
pub enum FileAction {
    /// Track a file
    Add { path: String },
    /// Stop tracking a file
    Rm {
        path: String,
        /// Delete the working-tree copy before restoring from cache
        #[arg(long)]
        force: bool,
    },
    /// List tracked files
    List,
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// List project members
    List,
    /// Add a member with a role
    Add {
        /// User identifier, e.g. alice@github
        user_id: String,
        /// Role to assign (admin, devops, lead-dev, developer)
        #[arg(long)]
        role: String,
        /// Environment scope the invite applies to
        #[arg(long)]
        env: Option<String>,
    },
    /// Remove a member
    Rm {
        /// User identifier, e.g. alice@github
        user_id: String,
    },
}

/// Execute a parsed command.
pub fn execute(command: Command) -> Result<()> {
    match command {
        Command::Init { name, project_id } => init::init(&name, project_id.as_deref()),
        Command::Login => login::login(),
        Command::Env { action } => match action {
            EnvAction::List => env::list(),
            EnvAction::New { name } => env::new(&name),
            EnvAction::Rm { name } => env::rm(&name),
            EnvAction::Switch { name } => env::switch(&name),
        },
        Command::Secret { action } => match action {
            SecretAction::Set {
                key,
                value,
                envs,
                required,
            } => secrets::set(&key, &value, &envs, required),
            SecretAction::Show { key } => secrets::show(&key),
            SecretAction::Rm { key } => secrets::rm(&key),
            SecretAction::List => secrets::list(),
            SecretAction::Require { key } => secrets::set_required(&key, true),
            SecretAction::Optional { key } => secrets::set_required(&key, false),
        },
        Command::File { action } => match action {
            FileAction::Add { path } => files::add(&path),
            FileAction::Rm { path, force } => files::rm(&path, force),
            FileAction::List => files::list(),
        },
        Command::Member { action } => match action {
            MemberAction::List => member::list(),
            MemberAction::Add { user_id, role, env } => {
                member::add(&user_id, &role, env.as_deref())
            }
            MemberAction::Rm { user_id } => member::rm(&user_id),
        },
        Command::Fetch { env } => fetch::fetch(env.as_deref()),
        Command::Push { env } => push::push(env.as_deref()),
        Command::Run { command } => run::run(&command),
    }
}

/// Store rooted at the working directory.
pub(crate) fn store() -> Result<EnvStore> {
    Ok(EnvStore::new(std::env::current_dir()?))
}

/// Client carrying the saved session token.
pub(crate) fn authed_client(config: &AccountConfig) -> Result<crate::core::api::Client> {
    let token = config.auth_token()?;
    crate::core::api::Client::with_token(&config.server_url, token)
}
