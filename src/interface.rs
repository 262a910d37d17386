use anyhow::Result;
use humantime::format_duration;
use prettytable::Table;

use crate::model::{self, Store, Task, Timestamp};

const DESCRIPTION_WIDTH: usize = 40;

/// Print all the tasks in a table.
pub fn list(store: &Store) -> Result<()> {
    let tasks = store.list_all()?;
    if tasks.is_empty() {
        println!("No tasks yet. Use 'worklog start' or the window to start one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["ID", "User", "Description", "Start", "End", "Duration"]);
    for task in &tasks {
        table.add_row(row![
            task.id,
            task.user,
            textwrap::fill(&task.description, DESCRIPTION_WIDTH),
            task.fmt_start(),
            task.fmt_end(),
            fmt_duration(task)
        ]);
    }
    table.printstd();

    let open = tasks.iter().filter(|t| !t.is_ended()).count();
    println!("{} tasks, {} open.", tasks.len(), open);
    Ok(())
}

/// Start a task from the command line and print its id.
pub fn start(store: &Store, user: &str, description: &str) -> Result<()> {
    let (user, description) = model::validate_fields(user, description)?;
    let id = store.insert(user, description, model::now())?;
    println!("Started task {}: {}", id, description);
    Ok(())
}

/// End a task from the command line.
pub fn end(store: &Store, id: i64) -> Result<()> {
    store.update_end(id, model::now())?;
    if let Some(task) = store.get(id)? {
        println!("Ended task {} at {} ({}).", task.id, task.fmt_end(), fmt_duration(&task));
    }
    Ok(())
}

/// Time between start and end of a finished task, empty while it runs or
/// when either timestamp is unreadable. Tasks ending before they start show
/// as 0s.
fn fmt_duration(task: &Task) -> String {
    match (task.start.time(), task.end.as_ref().and_then(Timestamp::time)) {
        (Some(start), Some(end)) => {
            let elapsed = (end - start).to_std().unwrap_or_default();
            format_duration(elapsed).to_string()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskError;
    use chrono::NaiveDate;

    #[test]
    fn test_fmt_duration() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut task = Task {
            id: 1,
            user: "Alice".to_string(),
            description: "Write report".to_string(),
            start: Timestamp::Parsed(start),
            end: None,
        };
        assert_eq!(fmt_duration(&task), "");

        task.end = Some(Timestamp::Parsed(start + chrono::Duration::minutes(90)));
        assert_eq!(fmt_duration(&task), "1h 30m");

        task.end = Some(Timestamp::Parsed(start - chrono::Duration::minutes(5)));
        assert_eq!(fmt_duration(&task), "0s");

        task.start = Timestamp::Raw("yesterday".to_string());
        assert_eq!(fmt_duration(&task), "");
    }

    #[test]
    fn test_start_and_end_commands() {
        let store = Store::open_in_memory().unwrap();
        start(&store, " Alice ", "Write report").unwrap();
        let id = store.list_all().unwrap()[0].id;

        end(&store, id).unwrap();
        assert!(store.get(id).unwrap().unwrap().is_ended());

        let err = end(&store, id + 1).unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::NotFound(id + 1)));
    }

    #[test]
    fn test_start_command_rejects_blank_user() {
        let store = Store::open_in_memory().unwrap();
        let err = start(&store, "  ", "Write report").unwrap_err();
        assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::EmptyField));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_list_command() {
        let store = Store::open_in_memory().unwrap();
        list(&store).unwrap();
        start(&store, "Alice", "Write report").unwrap();
        list(&store).unwrap();
    }
}
