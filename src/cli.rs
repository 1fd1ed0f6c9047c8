use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Args, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "huddle")]
#[command(bin_name = "huddle")]
#[command(version)]
#[command(about = "Campus social graph and shared scheduling")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "HUDDLE_DB_PATH",
        help = "Path to the SQLite database (default .huddle/huddle.sqlite)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'c',
        long,
        env = "HUDDLE_CONFIG",
        help = "Optional TOML config file."
    )]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, action = ArgAction::Count, help = "More log output; repeatable.")]
    pub verbose: u8,

    #[arg(short = 'q', long, action = ArgAction::Count, help = "Less log output; repeatable.")]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register, inspect, and manage users.")]
    User(UserArgs),
    #[command(about = "Follow and unfollow users directly.")]
    Follow(FollowArgs),
    #[command(about = "Send and answer follow requests.")]
    Request(RequestArgs),
    #[command(about = "Create and manage schedules.")]
    Schedule(ScheduleArgs),
    #[command(about = "Answer and inspect schedule invitations.")]
    Invite(InviteArgs),
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum UserSubcommands {
    #[command(about = "Register a new user.")]
    Register(UserRegisterArgs),
    #[command(about = "Check a user's email and password.")]
    Login(UserLoginArgs),
    #[command(about = "Show one user.")]
    Show(IdArgs),
    #[command(about = "List all users.")]
    List(JsonArgs),
    #[command(about = "Update user fields.")]
    Update(UserUpdateArgs),
    #[command(about = "Delete a user.")]
    Delete(IdArgs),
    #[command(about = "Mark a user inactive.")]
    Deactivate(IdArgs),
    #[command(about = "Show followers, following, and pending requesters.")]
    Summary(IdArgs),
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(help = "Record id.")]
    pub id: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UserRegisterArgs {
    #[arg(long, help = "Display name.")]
    pub name: String,

    #[arg(long, help = "Email address; stored lowercased.")]
    pub email: String,

    #[arg(long, help = "Password.")]
    pub password: String,

    #[arg(long, help = "Role (defaults to User).")]
    pub role: Option<String>,

    #[arg(long, help = "Major or department.")]
    pub major: Option<String>,

    #[arg(long = "student-id", help = "Student number.")]
    pub student_id: Option<String>,

    #[arg(long = "profile-picture", help = "Profile picture URL.")]
    pub profile_picture: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UserLoginArgs {
    #[arg(long, help = "Email address.")]
    pub email: String,

    #[arg(long, help = "Password.")]
    pub password: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UserUpdateArgs {
    #[arg(help = "User id.")]
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub role: Option<String>,

    #[arg(long)]
    pub major: Option<String>,

    #[arg(long = "student-id")]
    pub student_id: Option<String>,

    #[arg(long = "profile-picture")]
    pub profile_picture: Option<String>,

    #[arg(long, help = "Set the active flag (true|false).")]
    pub active: Option<bool>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FollowArgs {
    #[command(subcommand)]
    pub command: FollowSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum FollowSubcommands {
    #[command(about = "Follow a user without a request.")]
    Add(PairArgs),
    #[command(about = "Stop following a user.")]
    Remove(PairArgs),
    #[command(about = "List who follows a user.")]
    Followers(IdArgs),
    #[command(about = "List who a user follows.")]
    Following(IdArgs),
}

#[derive(Debug, Args)]
pub struct PairArgs {
    #[arg(help = "Acting user id (follower or requester).")]
    pub from: String,

    #[arg(help = "Target user id (followee or requestee).")]
    pub to: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    #[command(subcommand)]
    pub command: RequestSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum RequestSubcommands {
    #[command(about = "Send a follow request.")]
    Send(PairArgs),
    #[command(about = "Accept a pending request; creates the follow edge.")]
    Accept(IdArgs),
    #[command(about = "Reject a pending request.")]
    Reject(IdArgs),
    #[command(about = "Withdraw a pending request.")]
    Cancel(PairArgs),
    #[command(about = "List a user's requests in one direction.")]
    List(RequestListArgs),
    #[command(about = "List pending requests waiting on a user.")]
    Pending(IdArgs),
}

#[derive(Debug, Args)]
pub struct RequestListArgs {
    #[arg(help = "User id.")]
    pub id: String,

    #[arg(
        long,
        default_value = "incoming",
        help = "incoming (sent to the user) or outgoing (sent by the user)."
    )]
    pub direction: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleSubcommands {
    #[command(about = "Create a schedule, optionally repeating weekly.")]
    Create(ScheduleCreateArgs),
    #[command(about = "Show one schedule.")]
    Show(IdArgs),
    #[command(about = "List schedules owned by a user.")]
    List(IdArgs),
    #[command(about = "Update schedule fields.")]
    Update(ScheduleUpdateArgs),
    #[command(about = "Delete a schedule and its invitations.")]
    Delete(IdArgs),
}

#[derive(Debug, Args)]
pub struct ScheduleCreateArgs {
    #[arg(long, help = "Owner user id.")]
    pub owner: String,

    #[arg(long, help = "Start, YYYY-MM-DDTHH:MM:SS.")]
    pub start: String,

    #[arg(long, help = "End, YYYY-MM-DDTHH:MM:SS.")]
    pub end: String,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "")]
    pub location: String,

    #[arg(long, default_value = "")]
    pub category: String,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long = "type")]
    pub kind: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, help = "Repeat weekly through this date (YYYY-MM-DD).")]
    pub until: Option<String>,

    #[arg(
        short = 'p',
        long = "participant",
        value_delimiter = ',',
        help = "Invited user id; repeatable or comma-separated."
    )]
    pub participants: Vec<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScheduleUpdateArgs {
    #[arg(help = "Schedule id.")]
    pub id: String,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    #[arg(long = "type")]
    pub kind: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct InviteArgs {
    #[command(subcommand)]
    pub command: InviteSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum InviteSubcommands {
    #[command(about = "Accept a schedule invitation.")]
    Accept(IdArgs),
    #[command(about = "Reject a schedule invitation.")]
    Reject(IdArgs),
    #[command(about = "List every invitation sent to a user.")]
    ForUser(IdArgs),
    #[command(about = "List every invitation on a schedule.")]
    ForSchedule(IdArgs),
    #[command(about = "List accepted participants of a schedule.")]
    Accepted(IdArgs),
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
