use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(name = "quizadmin", about = "Administer quizzes, users, assessments and resources")]
pub struct Cli {
    /// Configuration file; defaults to ./quizadmin.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    #[arg(long, global = true)]
    pub session_db: Option<String>,
    #[arg(long, global = true)]
    pub page_size: Option<usize>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            api_base_url: self.api_url.clone(),
            session_database_url: self.session_db.clone(),
            page_size: self.page_size,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session locally.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Location to open once signed in, e.g. `/userdetails?userId=42`.
        #[arg(long)]
        open: Option<String>,
    },
    Logout,
    Whoami,
    Dashboard,
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Quizzes(QuizzesCommand),
    #[command(subcommand)]
    Assessments(AssessmentsCommand),
    #[command(subcommand)]
    Resources(ResourcesCommand),
    /// Open a screen by location, as a browser address would.
    Open { location: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        status: Option<String>,
        /// Oldest first instead of newest first.
        #[arg(long)]
        oldest: bool,
    },
    Show { id: String },
    Delete { id: String },
}

#[derive(Args, Debug, Clone)]
pub struct QuizFields {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum QuizzesCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        status: Option<String>,
    },
    Create {
        #[command(flatten)]
        fields: QuizFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: QuizFields,
    },
    Delete { id: String },
    Questions {
        quiz_id: String,
        #[command(flatten)]
        list: ListArgs,
        #[arg(long = "type")]
        question_type: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AssessmentsCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        assessment_type: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResourcesCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        resource_type: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_list_flags_and_global_overrides() {
        let cli = Cli::try_parse_from([
            "quizadmin",
            "resources",
            "list",
            "--category",
            "Videos",
            "--page",
            "2",
            "--api-url",
            "http://127.0.0.1:9000/api/",
        ])
        .expect("parse");

        assert_eq!(
            cli.overrides().api_base_url.as_deref(),
            Some("http://127.0.0.1:9000/api/")
        );
        match cli.command {
            Command::Resources(ResourcesCommand::List { list, category, status }) => {
                assert_eq!(list.page, 2);
                assert_eq!(category.as_deref(), Some("Videos"));
                assert!(status.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn quiz_update_takes_id_and_fields() {
        let cli = Cli::try_parse_from([
            "quizadmin", "quizzes", "update", "q1", "--title", "Safety", "--status", "Inactive",
        ])
        .expect("parse");
        match cli.command {
            Command::Quizzes(QuizzesCommand::Update { id, fields }) => {
                assert_eq!(id, "q1");
                assert_eq!(fields.title, "Safety");
                assert_eq!(fields.status.as_deref(), Some("Inactive"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
