#![forbid(unsafe_code)]

mod cmd;
mod output;
mod summarizer;
mod user;
mod validate;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use warren_core::error::ErrorCode;
use warren_core::model::post::ParseEnumError;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "warren: local-first discussion platform",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Override user identity (skips env resolution).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Get the user flag as an `Option<&str>` for resolution.
    fn user_flag(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a warren project",
        long_about = "Initialize a warren project in the current directory.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    wrn init\n\n    # Emit machine-readable output\n    wrn init --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(next_help_heading = "Communities", about = "Manage communities")]
    Community {
        #[command(subcommand)]
        command: CommunityCommand,
    },

    #[command(next_help_heading = "Posts", about = "Create, list, and manage posts")]
    Post {
        #[command(subcommand)]
        command: PostCommand,
    },

    #[command(
        next_help_heading = "Threads",
        about = "Comment on a post",
        long_about = "Add a top-level comment to a post, or reply to an existing comment.",
        after_help = "EXAMPLES:\n    # Comment on post 7\n    wrn comment 7 --body \"Nice writeup\"\n\n    # Reply to comment 12 on post 7\n    wrn comment 7 --parent 12 --body \"Agreed\""
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Threads",
        about = "Show a post's comment thread",
        long_about = "Show the nested comment thread for a post, with vote scores and your own votes.",
        after_help = "EXAMPLES:\n    # View the thread of post 7\n    wrn thread 7\n\n    # Machine-readable thread\n    wrn thread 7 --json"
    )]
    Thread(cmd::thread::ThreadArgs),

    #[command(
        next_help_heading = "Votes",
        about = "Vote on a post or comment",
        long_about = "Cast or change a vote. Re-voting overwrites your previous direction.",
        after_help = "EXAMPLES:\n    # Upvote post 7\n    wrn vote post 7 up\n\n    # Downvote comment 12\n    wrn vote comment 12 down"
    )]
    Vote(cmd::vote::VoteArgs),

    #[command(
        next_help_heading = "Votes",
        about = "Remove your vote from a post or comment",
        after_help = "EXAMPLES:\n    # Remove your vote from post 7\n    wrn unvote post 7"
    )]
    Unvote(cmd::vote::UnvoteArgs),

    #[command(next_help_heading = "Polls", about = "Vote in and inspect polls")]
    Poll {
        #[command(subcommand)]
        command: PollCommand,
    },

    #[command(
        next_help_heading = "Threads",
        about = "Show a post's AI summary",
        long_about = "Show the post's AI summary, regenerating it first when it is stale.",
        after_help = "EXAMPLES:\n    # Summarize the thread of post 7\n    wrn summary 7"
    )]
    Summary(cmd::summary::SummaryArgs),
}

#[derive(Subcommand, Debug)]
enum CommunityCommand {
    #[command(
        about = "Create a community",
        after_help = "EXAMPLES:\n    # Create a community\n    wrn community create rustdev --description \"Rust talk\""
    )]
    Create(cmd::community::CreateArgs),

    #[command(about = "List all communities")]
    List,

    #[command(about = "Follow a community")]
    Follow(cmd::community::FollowArgs),

    #[command(about = "Unfollow a community")]
    Unfollow(cmd::community::FollowArgs),

    #[command(about = "List communities you follow")]
    Following,
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    #[command(
        about = "Create a post",
        after_help = "EXAMPLES:\n    # Text post\n    wrn post create rustdev --title \"Hello\" --body \"First post\"\n\n    # Link post\n    wrn post create rustdev --title \"Interesting\" --url https://example.com\n\n    # Poll post\n    wrn post create rustdev --title \"Pick one\" --option Yes --option No"
    )]
    Create(cmd::post::CreateArgs),

    #[command(about = "List posts, newest first")]
    List(cmd::post::ListArgs),

    #[command(about = "Show one post")]
    Show(cmd::post::ShowArgs),

    #[command(about = "Save a post to your list")]
    Save(cmd::post::SaveArgs),

    #[command(about = "Remove a post from your saved list")]
    Unsave(cmd::post::SaveArgs),

    #[command(about = "List your saved posts")]
    Saved,
}

#[derive(Subcommand, Debug)]
enum PollCommand {
    #[command(
        about = "Cast your ballot in a poll",
        after_help = "EXAMPLES:\n    # Vote for option 2 on poll post 7\n    wrn poll ballot 7 2"
    )]
    Ballot(cmd::poll::BallotArgs),

    #[command(about = "Show poll results")]
    Results(cmd::poll::ResultsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WARREN_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "warren=debug,info"
        } else {
            "warren=info,warn"
        })
    });

    let format = env::var("WARREN_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

/// Translate a command failure into the structured error the CLI prints.
///
/// The chain is walked outermost-first so the most specific typed error
/// wins over generic context strings.
fn to_cli_error(err: &anyhow::Error) -> CliError {
    use warren_core::db::write::WriteError;
    use warren_core::thread::ThreadError;

    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<cmd::NotInitialized>() {
            return CliError::with_code(e.to_string(), ErrorCode::NotInitialized);
        }
        if let Some(e) = cause.downcast_ref::<validate::ValidationError>() {
            return CliError::with_code(e.to_string(), e.code);
        }
        if let Some(e) = cause.downcast_ref::<user::UserResolutionError>() {
            return CliError {
                message: e.message.clone(),
                suggestion: Some("export WARREN_USER=your-name".to_string()),
                error_code: Some(e.code.to_string()),
            };
        }
        if let Some(e) = cause.downcast_ref::<ParseEnumError>() {
            return CliError::with_code(e.to_string(), ErrorCode::InvalidEnumValue);
        }
        if let Some(e) = cause.downcast_ref::<ThreadError>() {
            if let ThreadError::PostNotFound(_) = e {
                return CliError::with_code(e.to_string(), ErrorCode::PostNotFound);
            }
        }
        if let Some(e) = cause.downcast_ref::<WriteError>() {
            let code = match e {
                WriteError::CommunityNotFound(_) => ErrorCode::CommunityNotFound,
                WriteError::DuplicateCommunity(_) => ErrorCode::DuplicateCommunity,
                WriteError::PostNotFound(_) => ErrorCode::PostNotFound,
                WriteError::CommentNotFound(_) => ErrorCode::CommentNotFound,
                WriteError::ParentNotFound(_) => ErrorCode::ParentNotFound,
                WriteError::CrossPostParent { .. } => ErrorCode::CrossPostParent,
                WriteError::NotAPoll(_) | WriteError::KindMismatch { .. } => {
                    ErrorCode::InvalidEnumValue
                }
                WriteError::OptionNotOnPost { .. } => ErrorCode::InvalidId,
                WriteError::Sqlite(_) | WriteError::Other(_) => ErrorCode::InternalUnexpected,
            };
            return CliError::with_code(e.to_string(), code);
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return CliError::with_code(err.to_string(), ErrorCode::ConfigParseError);
        }
    }

    CliError::new(err.to_string())
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let invoked_from = std::env::current_dir()?;
    let output = cli.output_mode();
    let user = cli.user_flag();

    let command_result = match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &invoked_from),
        Commands::Community { command } => match command {
            CommunityCommand::Create(args) => {
                cmd::community::run_create(args, user, output, &invoked_from)
            }
            CommunityCommand::List => cmd::community::run_list(output, &invoked_from),
            CommunityCommand::Follow(args) => {
                cmd::community::run_follow(args, user, output, &invoked_from)
            }
            CommunityCommand::Unfollow(args) => {
                cmd::community::run_unfollow(args, user, output, &invoked_from)
            }
            CommunityCommand::Following => {
                cmd::community::run_following(user, output, &invoked_from)
            }
        },
        Commands::Post { command } => match command {
            PostCommand::Create(args) => cmd::post::run_create(args, user, output, &invoked_from),
            PostCommand::List(args) => cmd::post::run_list(args, output, &invoked_from),
            PostCommand::Show(args) => cmd::post::run_show(args, output, &invoked_from),
            PostCommand::Save(args) => cmd::post::run_save(args, user, output, &invoked_from),
            PostCommand::Unsave(args) => cmd::post::run_unsave(args, user, output, &invoked_from),
            PostCommand::Saved => cmd::post::run_saved(user, output, &invoked_from),
        },
        Commands::Comment(args) => cmd::comment::run_comment(args, user, output, &invoked_from),
        Commands::Thread(args) => cmd::thread::run_thread(args, user, output, &invoked_from),
        Commands::Vote(args) => cmd::vote::run_vote(args, user, output, &invoked_from),
        Commands::Unvote(args) => cmd::vote::run_unvote(args, user, output, &invoked_from),
        Commands::Poll { command } => match command {
            PollCommand::Ballot(args) => cmd::poll::run_ballot(args, user, output, &invoked_from),
            PollCommand::Results(args) => cmd::poll::run_results(args, output, &invoked_from),
        },
        Commands::Summary(args) => cmd::summary::run_summary(args, output, &invoked_from),
    };

    if let Err(err) = command_result {
        let cli_error = to_cli_error(&err);
        render_error(output, &cli_error)?;
        std::process::exit(1);
    }

    Ok(())
}
