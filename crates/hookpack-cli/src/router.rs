// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use heck::ToKebabCase;
use hookpack_core::{
    HookManager, HooksConfig, InstallOptions, UninstallOptions, UpdateOptions,
};

use crate::error::CliResult;
use crate::output;

/// Hookpack - hook lifecycle manager
#[derive(Parser, Debug)]
#[command(name = "hookpack")]
#[command(bin_name = "hookpack")]
#[command(about = "Install, update and manage hooks for your application")]
#[command(version)]
#[command(author = "Hookpack Contributors")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Application root (default: current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Register the hooks registry in the project package file
    Setup {
        /// Registry url (default: the built-in registry)
        #[arg(long)]
        url: Option<String>,
    },

    /// Download and install a hook
    Install {
        /// Hook name
        name: String,

        /// Version constraint (default: latest)
        version: Option<String>,

        /// Enable the hook right after installing
        #[arg(long)]
        enable: bool,

        /// Skip running the hook's migrations
        #[arg(long)]
        no_migrate: bool,

        /// Skip running the hook's seeders
        #[arg(long)]
        no_seed: bool,

        /// Skip publishing the hook's assets
        #[arg(long)]
        no_publish: bool,
    },

    /// Uninstall a hook
    Uninstall {
        /// Hook name
        name: String,

        /// Also delete the hook directory (local hooks only)
        #[arg(long)]
        delete: bool,

        /// Skip rolling the hook's migrations back
        #[arg(long)]
        no_unmigrate: bool,

        /// Skip running the hook's unseeders
        #[arg(long)]
        no_unseed: bool,

        /// Keep the hook's published assets
        #[arg(long)]
        no_unpublish: bool,
    },

    /// Update a hook to a newer version
    Update {
        /// Hook name
        name: String,

        /// Version constraint (default: latest)
        version: Option<String>,

        /// Overwrite deployed assets even if modified
        #[arg(long)]
        force: bool,

        /// Skip running the hook's migrations
        #[arg(long)]
        no_migrate: bool,

        /// Skip running the hook's seeders
        #[arg(long)]
        no_seed: bool,

        /// Skip publishing the hook's assets
        #[arg(long)]
        no_publish: bool,
    },

    /// Enable an installed hook
    Enable {
        /// Hook name
        name: String,
    },

    /// Disable an enabled hook
    Disable {
        /// Hook name
        name: String,
    },

    /// Scaffold a new local hook
    Make {
        /// Hook name (normalized to kebab-case)
        name: String,
    },

    /// List all known hooks
    List,

    /// Show details for one hook
    Info {
        /// Hook name
        name: String,
    },

    /// Check all installed hooks for available updates
    Check,
}

/// Parse-free entry point: dispatch an already-parsed invocation.
pub async fn run(cli: Cli) -> CliResult<()> {
    let base_path = match cli.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let mut config = HooksConfig::new(base_path);
    if let Commands::Setup { url: Some(url) } = &cli.command {
        config.remote_url = url.clone();
    }
    let mut manager = HookManager::new(config)?;

    match cli.command {
        Commands::Setup { .. } => {
            manager.setup()?;
            output::print_success("Hooks are now ready to use.");
        }

        Commands::Install {
            name,
            version,
            enable,
            no_migrate,
            no_seed,
            no_publish,
        } => {
            let options = InstallOptions {
                migrate: !no_migrate,
                seed: !no_seed,
                publish: !no_publish,
            };
            manager.install(&name, version.as_deref(), options).await?;
            if enable {
                manager.enable(&name).await?;
            }
            output::print_success(&format!("Hook [{name}] has been installed."));
        }

        Commands::Uninstall {
            name,
            delete,
            no_unmigrate,
            no_unseed,
            no_unpublish,
        } => {
            let options = UninstallOptions {
                delete,
                unmigrate: !no_unmigrate,
                unseed: !no_unseed,
                unpublish: !no_unpublish,
            };
            manager.uninstall(&name, options).await?;
            output::print_success(&format!("Hook [{name}] has been uninstalled."));
        }

        Commands::Update {
            name,
            version,
            force,
            no_migrate,
            no_seed,
            no_publish,
        } => {
            let options = UpdateOptions {
                migrate: !no_migrate,
                seed: !no_seed,
                publish: !no_publish,
                force,
            };
            if manager.update(&name, version.as_deref(), options).await? {
                output::print_success(&format!("Hook [{name}] has been updated."));
            } else {
                output::print_info(&format!("Hook [{name}] is already up to date."));
            }
        }

        Commands::Enable { name } => {
            manager.enable(&name).await?;
            output::print_success(&format!("Hook [{name}] has been enabled."));
        }

        Commands::Disable { name } => {
            manager.disable(&name).await?;
            output::print_success(&format!("Hook [{name}] has been disabled."));
        }

        Commands::Make { name } => {
            let name = name.to_kebab_case();
            manager.make(&name)?;
            output::print_success(&format!("Hook [{name}] has been created."));
        }

        Commands::List => {
            let hooks = manager.hooks();
            if hooks.is_empty() {
                output::print_info("No hooks found.");
            }
            for hook in hooks {
                let record = hook.record();
                let state = if record.enabled {
                    "enabled"
                } else if record.installed {
                    "disabled"
                } else {
                    "downloaded"
                };
                let version = record.version.as_deref().unwrap_or("-");
                println!("{}  {}  {}", record.name, version, state);
            }
        }

        Commands::Info { name } => {
            let hook = manager.hook(&name)?;
            let record = hook.record();
            println!("Name:        {}", record.name);
            println!("Description: {}", record.description);
            println!(
                "Version:     {}",
                record.version.as_deref().unwrap_or("-")
            );
            if let Some(kind) = record.kind {
                println!("Type:        {kind:?}");
            }
            println!(
                "State:       {}",
                if record.enabled { "enabled" } else { "disabled" }
            );
            if let Some(latest) = manager.outdated(&name) {
                if record.version.as_deref() != Some(latest) {
                    output::print_warning(&format!("Version {latest} is available."));
                }
            }
            for provider in hook.providers() {
                println!("Provider:    {provider}");
            }
        }

        Commands::Check => {
            let outdated = manager.check_for_updates(None).await?;
            if outdated.is_empty() {
                output::print_info("All hooks are up to date.");
            }
            for hook in &outdated {
                let installed = hook.record().version.as_deref().unwrap_or("-");
                let latest = manager.outdated(hook.name()).unwrap_or("-");
                output::print_warning(&format!(
                    "Hook [{}] has an update available: {installed} -> {latest}",
                    hook.name()
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_flags_parse() {
        let cli = Cli::parse_from([
            "hookpack",
            "install",
            "acme/themer",
            "v1.0.0",
            "--enable",
            "--no-seed",
        ]);
        match cli.command {
            Commands::Install {
                name,
                version,
                enable,
                no_migrate,
                no_seed,
                no_publish,
            } => {
                assert_eq!(name, "acme/themer");
                assert_eq!(version.as_deref(), Some("v1.0.0"));
                assert!(enable);
                assert!(!no_migrate);
                assert!(no_seed);
                assert!(!no_publish);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn uninstall_delete_parses() {
        let cli = Cli::parse_from(["hookpack", "uninstall", "greeting-hook", "--delete"]);
        match cli.command {
            Commands::Uninstall { name, delete, .. } => {
                assert_eq!(name, "greeting-hook");
                assert!(delete);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_path_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["hookpack", "list", "--path", "/srv/app"]);
        assert_eq!(cli.path.as_deref(), Some(std::path::Path::new("/srv/app")));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn make_names_are_normalized() {
        assert_eq!("MyFirstHook".to_kebab_case(), "my-first-hook");
        assert_eq!("my_first_hook".to_kebab_case(), "my-first-hook");
    }

    #[test]
    fn setup_url_parses() {
        let cli = Cli::parse_from(["hookpack", "setup", "--url", "http://registry.localdomain"]);
        match cli.command {
            Commands::Setup { url } => {
                assert_eq!(url.as_deref(), Some("http://registry.localdomain"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_runs_against_an_empty_application_root() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["hookpack", "list", "--path", dir.path().to_str().unwrap()]);
        run(cli).await.unwrap();
        assert!(dir.path().join("hooks/hooks.json").is_file());
    }
}
