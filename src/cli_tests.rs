use clap::Parser;

use super::{
    Cli, Commands, FollowSubcommands, InviteSubcommands, RequestSubcommands,
    ScheduleSubcommands, UserSubcommands,
};

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn user_register_parses_optional_profile_fields() {
    let cli = parse(&[
        "huddle",
        "user",
        "register",
        "--name",
        "Dana",
        "--email",
        "dana@campus.test",
        "--password",
        "pw",
        "--student-id",
        "S-1",
        "--json",
    ]);
    match cli.command {
        Commands::User(args) => match args.command {
            UserSubcommands::Register(register) => {
                assert_eq!(register.name, "Dana");
                assert_eq!(register.student_id.as_deref(), Some("S-1"));
                assert!(register.role.is_none());
                assert!(register.json);
            }
            other => panic!("expected Register, got {:?}", other),
        },
        other => panic!("expected User, got {:?}", other),
    }
}

#[test]
fn verbosity_flags_count() {
    let cli = parse(&["huddle", "-vv", "user", "list"]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.quiet, 0);
    assert!(matches!(
        cli.command,
        Commands::User(args) if matches!(args.command, UserSubcommands::List(_))
    ));
}

#[test]
fn follow_and_request_pairs_parse_positionally() {
    let cli = parse(&["huddle", "follow", "add", "a", "b"]);
    match cli.command {
        Commands::Follow(args) => match args.command {
            FollowSubcommands::Add(pair) => {
                assert_eq!(pair.from, "a");
                assert_eq!(pair.to, "b");
            }
            other => panic!("expected Add, got {:?}", other),
        },
        other => panic!("expected Follow, got {:?}", other),
    }

    let cli = parse(&["huddle", "request", "list", "a", "--direction", "outgoing"]);
    match cli.command {
        Commands::Request(args) => match args.command {
            RequestSubcommands::List(list) => assert_eq!(list.direction, "outgoing"),
            other => panic!("expected List, got {:?}", other),
        },
        other => panic!("expected Request, got {:?}", other),
    }
}

#[test]
fn schedule_create_collects_participants() {
    let cli = parse(&[
        "huddle",
        "schedule",
        "create",
        "--owner",
        "o",
        "--start",
        "2024-01-01T10:00:00",
        "--end",
        "2024-01-01T11:00:00",
        "--title",
        "Lab",
        "--type",
        "class",
        "--until",
        "2024-01-15",
        "-p",
        "a,b",
        "--participant",
        "c",
    ]);
    match cli.command {
        Commands::Schedule(args) => match args.command {
            ScheduleSubcommands::Create(create) => {
                assert_eq!(create.participants, vec!["a", "b", "c"]);
                assert_eq!(create.kind.as_deref(), Some("class"));
                assert_eq!(create.until.as_deref(), Some("2024-01-15"));
                assert_eq!(create.location, "");
            }
            other => panic!("expected Create, got {:?}", other),
        },
        other => panic!("expected Schedule, got {:?}", other),
    }
}

#[test]
fn invite_for_schedule_uses_kebab_case() {
    let cli = parse(&["huddle", "invite", "for-schedule", "s1"]);
    match cli.command {
        Commands::Invite(args) => match args.command {
            InviteSubcommands::ForSchedule(id) => assert_eq!(id.id, "s1"),
            other => panic!("expected ForSchedule, got {:?}", other),
        },
        other => panic!("expected Invite, got {:?}", other),
    }
}
