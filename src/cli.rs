use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, PartialEq, StructOpt)]
pub enum Command {
    /// List all tasks in the database.
    List,
    /// Start a new task.
    Start {
        /// Who performs the task.
        #[structopt()]
        user: String,

        /// The task description text.
        #[structopt()]
        description: String,
    },
    /// End a running task by id.
    End {
        #[structopt()]
        id: i64,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "worklog",
    about = "A minimalistic work task logger. Without a subcommand it opens the task window."
)]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Option<Command>,

    /// Use a different database file.
    #[structopt(parse(from_os_str), short, long)]
    pub database_file: Option<PathBuf>,

    /// Write the log to a different file.
    #[structopt(parse(from_os_str), short, long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_opens_window() {
        let args = CommandLineArgs::from_iter(&["worklog"]);
        assert_eq!(args.action, None);
        assert_eq!(args.database_file, None);
    }

    #[test]
    fn test_parse_start() {
        let args = CommandLineArgs::from_iter(&[
            "worklog",
            "--database-file",
            "/tmp/tasks.db",
            "start",
            "Alice",
            "Write report",
        ]);
        assert_eq!(args.database_file, Some(PathBuf::from("/tmp/tasks.db")));
        assert_eq!(
            args.action,
            Some(Command::Start {
                user: "Alice".to_string(),
                description: "Write report".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_end_and_list() {
        let args = CommandLineArgs::from_iter(&["worklog", "-l", "w.log", "end", "7"]);
        assert_eq!(args.action, Some(Command::End { id: 7 }));
        assert_eq!(args.log_file, Some(PathBuf::from("w.log")));

        let args = CommandLineArgs::from_iter(&["worklog", "list"]);
        assert_eq!(args.action, Some(Command::List));
    }

    #[test]
    fn test_end_requires_numeric_id() {
        assert!(CommandLineArgs::from_iter_safe(&["worklog", "end", "abc"]).is_err());
    }
}
