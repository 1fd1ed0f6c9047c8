mod app;
mod cli;
mod config;
mod db;
mod domain;
mod ids;
mod relations;
mod scheduling;

use log::LevelFilter;

use app::{AppError, UserView};
use cli::{
    FollowSubcommands, InviteSubcommands, RequestSubcommands, ScheduleSubcommands,
    UserSubcommands,
};
use relations::{FollowRequestView, FollowView};
use scheduling::{InvitationView, ParticipantView, ScheduleView};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

const LEVELS: [LevelFilter; 6] = [
    LevelFilter::Off,
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

/// Each `-v` raises and each `-q` lowers the configured level by one step.
fn effective_level(base: LevelFilter, verbose: u8, quiet: u8) -> LevelFilter {
    let index = LEVELS.iter().position(|level| *level == base).unwrap_or(2) as i32;
    let shifted = (index + i32::from(verbose) - i32::from(quiet)).clamp(0, 5);
    LEVELS[shifted as usize]
}

fn start_logger(level: LevelFilter) -> Result<(), AppError> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr())
        .apply()
        .map_err(|err| AppError::InvalidArgument(format!("logger setup failed: {}", err)))
}

fn run() -> Result<(), AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    let settings = config::Settings::load(cli.config.as_deref(), cli.db.as_deref())?;
    start_logger(effective_level(settings.log_level, cli.verbose, cli.quiet))?;
    log::debug!("using database {}", settings.db_path);

    let app = app::App::open(&settings.db_path, settings.max_occurrences)?;

    match cli.command {
        Commands::User(args) => run_user(&app, args.command),
        Commands::Follow(args) => run_follow(&app, args.command),
        Commands::Request(args) => run_request(&app, args.command),
        Commands::Schedule(args) => run_schedule(&app, args.command),
        Commands::Invite(args) => run_invite(&app, args.command),
    }
}

fn run_user(app: &app::App, command: UserSubcommands) -> Result<(), AppError> {
    match command {
        UserSubcommands::Register(args) => {
            let user = app.register_user(app::NewUser {
                name: args.name,
                email: args.email,
                password: args.password,
                role: args.role,
                major: args.major,
                student_id: args.student_id,
                profile_picture: args.profile_picture,
            })?;
            render_user(&user, args.json);
        }
        UserSubcommands::Login(args) => {
            let user = app.login(&args.email, &args.password)?;
            render_user(&user, args.json);
        }
        UserSubcommands::Show(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_user(&app.get_user(&id)?, args.json);
        }
        UserSubcommands::List(args) => {
            let users = app.list_users()?;
            if args.json {
                print_json(&users);
            } else {
                render_user_lines(&users);
            }
        }
        UserSubcommands::Update(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            let user = app.update_user(
                &id,
                app::UserPatch {
                    name: args.name,
                    email: args.email,
                    password: args.password,
                    role: args.role,
                    major: args.major,
                    student_id: args.student_id,
                    profile_picture: args.profile_picture,
                    is_active: args.active,
                },
            )?;
            render_user(&user, args.json);
        }
        UserSubcommands::Delete(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            app.delete_user(&id)?;
            render_ack("deleted", &id, args.json);
        }
        UserSubcommands::Deactivate(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_user(&app.deactivate_user(&id)?, args.json);
        }
        UserSubcommands::Summary(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            let summary = app.follow_summary(&id)?;
            if args.json {
                print_json(&summary);
            } else {
                render_user(&summary.user, false);
                println!("followers ({}):", summary.followers.len());
                render_user_lines(&summary.followers);
                println!("following ({}):", summary.following.len());
                render_user_lines(&summary.following);
                println!("pending requests ({}):", summary.pending.len());
                render_user_lines(&summary.pending);
            }
        }
    }
    Ok(())
}

fn run_follow(app: &app::App, command: FollowSubcommands) -> Result<(), AppError> {
    let relations = app.relations();
    match command {
        FollowSubcommands::Add(args) => {
            let from = app::parse_id_arg(&args.from, "follower id")?;
            let to = app::parse_id_arg(&args.to, "followee id")?;
            let edge = relations.follow(&from, &to)?;
            render_follows(&[edge], args.json);
        }
        FollowSubcommands::Remove(args) => {
            let from = app::parse_id_arg(&args.from, "follower id")?;
            let to = app::parse_id_arg(&args.to, "followee id")?;
            relations.unfollow(&from, &to)?;
            render_ack("unfollowed", &to, args.json);
        }
        FollowSubcommands::Followers(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_follows(&relations.followers(&id)?, args.json);
        }
        FollowSubcommands::Following(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_follows(&relations.following(&id)?, args.json);
        }
    }
    Ok(())
}

fn run_request(app: &app::App, command: RequestSubcommands) -> Result<(), AppError> {
    let relations = app.relations();
    match command {
        RequestSubcommands::Send(args) => {
            let from = app::parse_id_arg(&args.from, "requester id")?;
            let to = app::parse_id_arg(&args.to, "requestee id")?;
            let request = relations.create_request(&from, &to)?;
            render_requests(&[request], args.json);
        }
        RequestSubcommands::Accept(args) => {
            let id = app::parse_id_arg(&args.id, "request id")?;
            let edge = relations.accept_request(&id)?;
            render_follows(&[edge], args.json);
        }
        RequestSubcommands::Reject(args) => {
            let id = app::parse_id_arg(&args.id, "request id")?;
            let request = relations.reject_request(&id)?;
            render_requests(&[request], args.json);
        }
        RequestSubcommands::Cancel(args) => {
            let from = app::parse_id_arg(&args.from, "requester id")?;
            let to = app::parse_id_arg(&args.to, "requestee id")?;
            relations.cancel_request(&from, &to)?;
            render_ack("cancelled", &to, args.json);
        }
        RequestSubcommands::List(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_requests(&relations.list_requests(&id, &args.direction)?, args.json);
        }
        RequestSubcommands::Pending(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_requests(&relations.pending_requests(&id)?, args.json);
        }
    }
    Ok(())
}

fn run_schedule(app: &app::App, command: ScheduleSubcommands) -> Result<(), AppError> {
    let service = app.scheduling();
    match command {
        ScheduleSubcommands::Create(args) => {
            let owner_id = app::parse_id_arg(&args.owner, "owner id")?;
            let participants = args
                .participants
                .iter()
                .map(|raw| app::parse_id_arg(raw, "participant id"))
                .collect::<Result<Vec<_>, _>>()?;
            let created = service.create_schedule(scheduling::NewSchedule {
                owner_id,
                start_time: args.start,
                end_time: args.end,
                title: args.title,
                description: args.description,
                location: args.location,
                category: args.category,
                color: args.color,
                kind: args.kind,
                status: args.status,
                recurring_until: args.until,
                participants,
            })?;
            if args.json {
                print_json(&created);
            } else {
                render_schedule_lines(&created.schedules);
                render_participant_lines(&created.participants);
            }
        }
        ScheduleSubcommands::Show(args) => {
            let id = app::parse_id_arg(&args.id, "schedule id")?;
            let schedule = service.get_schedule(&id)?;
            if args.json {
                print_json(&schedule);
            } else {
                render_schedule_lines(&[schedule]);
            }
        }
        ScheduleSubcommands::List(args) => {
            let id = app::parse_id_arg(&args.id, "owner id")?;
            let schedules = service.list_schedules(&id)?;
            if args.json {
                print_json(&schedules);
            } else {
                render_schedule_lines(&schedules);
            }
        }
        ScheduleSubcommands::Update(args) => {
            let id = app::parse_id_arg(&args.id, "schedule id")?;
            let schedule = service.update_schedule(
                &id,
                scheduling::SchedulePatch {
                    start_time: args.start,
                    end_time: args.end,
                    title: args.title,
                    description: args.description,
                    location: args.location,
                    category: args.category,
                    color: args.color,
                    kind: args.kind,
                    status: args.status,
                },
            )?;
            if args.json {
                print_json(&schedule);
            } else {
                render_schedule_lines(&[schedule]);
            }
        }
        ScheduleSubcommands::Delete(args) => {
            let id = app::parse_id_arg(&args.id, "schedule id")?;
            let removed = service.delete_schedule(&id)?;
            if args.json {
                print_json(&serde_json::json!({
                    "deleted": id,
                    "invitations_removed": removed,
                }));
            } else {
                println!("deleted {} ({} invitation(s) removed)", id, removed);
            }
        }
    }
    Ok(())
}

fn run_invite(app: &app::App, command: InviteSubcommands) -> Result<(), AppError> {
    let service = app.scheduling();
    match command {
        InviteSubcommands::Accept(args) => {
            let id = app::parse_id_arg(&args.id, "invitation id")?;
            let participant = service.accept_invitation(&id)?;
            render_participants(&[participant], args.json);
        }
        InviteSubcommands::Reject(args) => {
            let id = app::parse_id_arg(&args.id, "invitation id")?;
            let participant = service.reject_invitation(&id)?;
            render_participants(&[participant], args.json);
        }
        InviteSubcommands::ForUser(args) => {
            let id = app::parse_id_arg(&args.id, "user id")?;
            render_invitations(&service.requests_for_user(&id)?, args.json);
        }
        InviteSubcommands::ForSchedule(args) => {
            let id = app::parse_id_arg(&args.id, "schedule id")?;
            render_invitations(&service.requests_for_schedule(&id)?, args.json);
        }
        InviteSubcommands::Accepted(args) => {
            let id = app::parse_id_arg(&args.id, "schedule id")?;
            render_invitations(&service.accepted_for_schedule(&id)?, args.json);
        }
    }
    Ok(())
}

fn render_ack(action: &str, id: &str, json: bool) {
    if json {
        print_json(&serde_json::json!({ "action": action, "id": id }));
    } else {
        println!("{} {}", action, id);
    }
}

fn render_user(user: &UserView, json: bool) {
    if json {
        print_json(user);
        return;
    }
    println!("{}  {} <{}>", user.id, user.name, user.email);
    println!("  role: {}", user.role);
    if !user.major.is_empty() {
        println!("  major: {}", user.major);
    }
    if !user.student_id.is_empty() {
        println!("  student id: {}", user.student_id);
    }
    if !user.is_active {
        println!("  inactive");
    }
}

fn render_user_lines(users: &[UserView]) {
    for user in users {
        println!("{}  {} <{}>", user.id, user.name, user.email);
    }
}

fn render_follows(edges: &[FollowView], json: bool) {
    if json {
        print_json(&edges);
        return;
    }
    for edge in edges {
        println!("{} -> {}", edge.follower_id, edge.followee_id);
    }
}

fn render_requests(requests: &[FollowRequestView], json: bool) {
    if json {
        print_json(&requests);
        return;
    }
    for request in requests {
        println!(
            "{}  {} -> {}  [{}]",
            request.id, request.requester_id, request.requestee_id, request.status
        );
    }
}

fn render_schedule_lines(schedules: &[ScheduleView]) {
    for schedule in schedules {
        println!(
            "{}  {} .. {}  {}",
            schedule.id, schedule.start_time, schedule.end_time, schedule.title
        );
    }
}

fn render_participant_lines(participants: &[ParticipantView]) {
    for participant in participants {
        println!(
            "  invite {}  user {}  [{}]",
            participant.id, participant.user_id, participant.status
        );
    }
}

fn render_participants(participants: &[ParticipantView], json: bool) {
    if json {
        print_json(&participants);
    } else {
        render_participant_lines(participants);
    }
}

fn render_invitations(invitations: &[InvitationView], json: bool) {
    if json {
        print_json(&invitations);
        return;
    }
    for invitation in invitations {
        println!(
            "{}  {} ({})  {}  {}  [{}]",
            invitation.participant_id,
            invitation.user.name,
            invitation.user.id,
            invitation.schedule.start_time,
            invitation.schedule.title,
            invitation.status
        );
    }
}
