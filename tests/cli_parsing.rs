use std::path::PathBuf;

use clap::Parser;
use suture::cli::commands::{
    backups::BackupsCommands, learnings::LearningsCommands, sessions::SessionsCommands,
};
use suture::cli::{Cli, Commands};

#[test]
fn test_parse_heal_defaults() {
    let cli = Cli::try_parse_from(vec!["suture", "heal"]).unwrap();

    assert!(!cli.json);
    assert!(!cli.verbose);
    match cli.command {
        Commands::Heal(args) => {
            assert!(args.targets.is_empty());
            assert_eq!(args.mode, "interactive");
            assert!(args.max_iterations.is_none());
            assert!(!args.batch);
            assert!(args.batch_size.is_none());
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_heal_with_targets_and_options() {
    let cli = Cli::try_parse_from(vec![
        "suture",
        "heal",
        "tests/users.test.ts",
        "tests/orders.test.ts",
        "-m",
        "auto",
        "--max-iterations",
        "5",
        "--batch",
        "--batch-size",
        "4",
    ])
    .unwrap();

    match cli.command {
        Commands::Heal(args) => {
            assert_eq!(args.targets, vec!["tests/users.test.ts", "tests/orders.test.ts"]);
            assert_eq!(args.mode, "auto");
            assert_eq!(args.max_iterations, Some(5));
            assert!(args.batch);
            assert_eq!(args.batch_size, Some(4));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(vec!["suture", "heal", "--json", "--verbose"]).unwrap();

    assert!(cli.json);
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Heal(_)));
}

#[test]
fn test_parse_sessions_list() {
    let cli = Cli::try_parse_from(vec!["suture", "sessions", "list"]).unwrap();

    match cli.command {
        Commands::Sessions(args) => match args.command {
            SessionsCommands::List { limit } => assert!(limit.is_none()),
            _ => panic!("Wrong sessions command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_sessions_list_with_limit() {
    let cli = Cli::try_parse_from(vec!["suture", "sessions", "list", "--limit", "10"]).unwrap();

    match cli.command {
        Commands::Sessions(args) => match args.command {
            SessionsCommands::List { limit } => assert_eq!(limit, Some(10)),
            _ => panic!("Wrong sessions command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_sessions_show() {
    let cli = Cli::try_parse_from(vec!["suture", "sessions", "show", "1b2c3d4e"]).unwrap();

    match cli.command {
        Commands::Sessions(args) => match args.command {
            SessionsCommands::Show { id } => assert_eq!(id, "1b2c3d4e"),
            _ => panic!("Wrong sessions command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_sessions_show_requires_id() {
    assert!(Cli::try_parse_from(vec!["suture", "sessions", "show"]).is_err());
}

#[test]
fn test_parse_backups_list_default_root() {
    let cli = Cli::try_parse_from(vec!["suture", "backups", "list"]).unwrap();

    match cli.command {
        Commands::Backups(args) => match args.command {
            BackupsCommands::List { root } => assert_eq!(root, PathBuf::from(".")),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_backups_list_explicit_root() {
    let cli = Cli::try_parse_from(vec!["suture", "backups", "list", "web/src"]).unwrap();

    match cli.command {
        Commands::Backups(args) => match args.command {
            BackupsCommands::List { root } => assert_eq!(root, PathBuf::from("web/src")),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_rollback_single_file() {
    let cli = Cli::try_parse_from(vec!["suture", "rollback", "src/components/Header.tsx"]).unwrap();

    match cli.command {
        Commands::Rollback(args) => {
            assert_eq!(args.file, Some(PathBuf::from("src/components/Header.tsx")));
            assert!(!args.all);
            assert_eq!(args.root, PathBuf::from("."));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_rollback_all_with_root() {
    let cli = Cli::try_parse_from(vec!["suture", "rollback", "--all", "--root", "web"]).unwrap();

    match cli.command {
        Commands::Rollback(args) => {
            assert!(args.file.is_none());
            assert!(args.all);
            assert_eq!(args.root, PathBuf::from("web"));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_rollback_file_conflicts_with_all() {
    assert!(Cli::try_parse_from(vec!["suture", "rollback", "src/a.ts", "--all"]).is_err());
}

#[test]
fn test_parse_learnings_analyze_all_sessions() {
    let cli = Cli::try_parse_from(vec!["suture", "learnings", "analyze"]).unwrap();

    match cli.command {
        Commands::Learnings(args) => match args.command {
            LearningsCommands::Analyze { id } => assert!(id.is_none()),
            _ => panic!("Wrong learnings command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_learnings_analyze_one_session() {
    let cli = Cli::try_parse_from(vec!["suture", "learnings", "analyze", "9f8e"]).unwrap();

    match cli.command {
        Commands::Learnings(args) => match args.command {
            LearningsCommands::Analyze { id } => assert_eq!(id.as_deref(), Some("9f8e")),
            _ => panic!("Wrong learnings command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_learnings_aggregate_publish() {
    let cli = Cli::try_parse_from(vec![
        "suture",
        "learnings",
        "aggregate",
        "--publish",
        "--team",
        "ENG",
    ])
    .unwrap();

    match cli.command {
        Commands::Learnings(args) => match args.command {
            LearningsCommands::Aggregate { publish, team } => {
                assert!(publish);
                assert_eq!(team.as_deref(), Some("ENG"));
            }
            _ => panic!("Wrong learnings command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_learnings_aggregate_defaults() {
    let cli = Cli::try_parse_from(vec!["suture", "learnings", "aggregate"]).unwrap();

    match cli.command {
        Commands::Learnings(args) => match args.command {
            LearningsCommands::Aggregate { publish, team } => {
                assert!(!publish);
                assert!(team.is_none());
            }
            _ => panic!("Wrong learnings command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_init_with_force_and_path() {
    let cli = Cli::try_parse_from(vec!["suture", "init", "--force", "apps/web"]).unwrap();

    match cli.command {
        Commands::Init(args) => {
            assert!(args.force);
            assert_eq!(args.path, PathBuf::from("apps/web"));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_init_defaults() {
    let cli = Cli::try_parse_from(vec!["suture", "init"]).unwrap();

    match cli.command {
        Commands::Init(args) => {
            assert!(!args.force);
            assert_eq!(args.path, PathBuf::from("."));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(vec!["suture", "destroy"]).is_err());
}

#[test]
fn test_parse_requires_a_subcommand() {
    assert!(Cli::try_parse_from(vec!["suture"]).is_err());
}
