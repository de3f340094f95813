use std::fmt;
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;

use crate::cli::{
    AddArgs, CliCommand, DeleteArgs, EditArgs, ListArgs, SetVaultArgs, ToggleArgs, WatchArgs,
};
use crate::config::AppConfig;
use crate::model::{DayTodos, Todo};
use crate::services::TodoSession;
use crate::watch::{FileWatch, ReloadQueue, RolloverTicker};

pub fn execute<W: Write>(config: &AppConfig, command: CliCommand, mut writer: W) -> Result<()> {
    let mut session = TodoSession::new(config.clone());
    match command {
        CliCommand::List(args) => handle_list(&mut session, &args, &mut writer),
        CliCommand::History(args) => handle_history(&session, &args, &mut writer),
        CliCommand::Add(args) => handle_add(&mut session, &args, &mut writer),
        CliCommand::Toggle(args) => handle_toggle(&mut session, &args, &mut writer),
        CliCommand::Edit(args) => handle_edit(&mut session, &args, &mut writer),
        CliCommand::Delete(args) => handle_delete(&mut session, &args, &mut writer),
        CliCommand::SetVault(args) => handle_set_vault(&mut session, &args, &mut writer),
        CliCommand::Watch(args) => run_watch(&mut session, &args, &mut writer),
    }
}

fn handle_list<W: Write>(session: &mut TodoSession, args: &ListArgs, writer: &mut W) -> Result<()> {
    let todos = session.list_today();
    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &todos)?;
        writeln!(writer)?;
        return Ok(());
    }
    write_todos(writer, &todos)
}

fn handle_history<W: Write>(
    session: &TodoSession,
    args: &ListArgs,
    writer: &mut W,
) -> Result<()> {
    let history = session.list_history();
    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &history)?;
        writeln!(writer)?;
        return Ok(());
    }
    if history.is_empty() {
        writeln!(writer, "No todos in the last 30 days")?;
        return Ok(());
    }
    for (position, day) in history.iter().enumerate() {
        if position > 0 {
            writeln!(writer)?;
        }
        write_day(writer, day)?;
    }
    Ok(())
}

fn handle_add<W: Write>(session: &mut TodoSession, args: &AddArgs, writer: &mut W) -> Result<()> {
    let text = args.text.join(" ");
    match session.add_today(&text) {
        Some(outcome) => writeln!(writer, "Added to {}: {}", outcome.date, outcome.text)?,
        None => writeln!(writer, "Nothing added")?,
    }
    Ok(())
}

fn handle_toggle<W: Write>(
    session: &mut TodoSession,
    args: &ToggleArgs,
    writer: &mut W,
) -> Result<()> {
    let done = !args.undone;
    let update = session.toggle(args.target, args.index, done);
    if update.changed {
        let state = if done { "done" } else { "not done" };
        writeln!(writer, "Marked #{} {}", update.index, state)?;
    } else {
        writeln!(writer, "No change for #{}", update.index)?;
    }
    Ok(())
}

fn handle_edit<W: Write>(session: &mut TodoSession, args: &EditArgs, writer: &mut W) -> Result<()> {
    let text = args.text.join(" ");
    let update = session.edit(args.target, args.index, &text);
    if update.changed {
        writeln!(writer, "Updated #{}", update.index)?;
    } else {
        writeln!(writer, "No change for #{}", update.index)?;
    }
    Ok(())
}

fn handle_delete<W: Write>(
    session: &mut TodoSession,
    args: &DeleteArgs,
    writer: &mut W,
) -> Result<()> {
    let result = session.delete(args.target, args.index);
    if result.deleted {
        writeln!(writer, "Deleted #{}", result.index)?;
    } else {
        writeln!(writer, "No todo at #{}", result.index)?;
    }
    Ok(())
}

fn handle_set_vault<W: Write>(
    session: &mut TodoSession,
    args: &SetVaultArgs,
    writer: &mut W,
) -> Result<()> {
    session.set_vault_root(args.path.clone())?;
    writeln!(writer, "Vault root set to {}", args.path.display())?;
    Ok(())
}

fn run_watch<W: Write>(
    session: &mut TodoSession,
    args: &WatchArgs,
    writer: &mut W,
) -> Result<()> {
    write_todos(writer, &session.list_today())?;
    writer.flush()?;

    let vault_root = session
        .config()
        .vault_root()
        .context("vault root is not configured; run `dailydo set-vault <PATH>` first")?
        .to_path_buf();

    let queue = ReloadQueue::new();
    let _file_watch = FileWatch::start(queue.clone(), &vault_root)
        .context("failed to start the vault file watch")?;
    let loaded = session
        .loaded_date()
        .unwrap_or_else(|| Local::now().date_naive());
    let ticker = RolloverTicker::start(
        queue.clone(),
        loaded,
        Duration::from_secs(args.rollover_interval),
    );

    loop {
        if !queue.wait_timeout(Duration::from_millis(500)) {
            continue;
        }
        let todos = session.reload();
        if let Some(date) = session.loaded_date() {
            ticker.mark_loaded(date);
        }
        writeln!(writer, "-- reloaded --")?;
        write_todos(writer, &todos)?;
        writer.flush()?;
    }
}

fn write_todos<W: Write>(writer: &mut W, todos: &[Todo]) -> Result<()> {
    if todos.is_empty() {
        writeln!(writer, "No todos for today")?;
        return Ok(());
    }
    for todo in todos {
        writeln!(writer, "{}", TodoLine(todo))?;
    }
    Ok(())
}

fn write_day<W: Write>(writer: &mut W, day: &DayTodos) -> Result<()> {
    writeln!(writer, "{}", day.date)?;
    for todo in &day.todos {
        writeln!(writer, "{}", TodoLine(todo))?;
    }
    Ok(())
}

struct TodoLine<'a>(&'a Todo);

impl fmt::Display for TodoLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3} [{}] {}",
            self.0.index,
            if self.0.done { 'x' } else { ' ' },
            self.0.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ListArgs;
    use crate::model::TodoTarget;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn temp_config() -> (AppConfig, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let mut config =
            AppConfig::from_config_dir(dir.path().join("config")).expect("config");
        config.override_vault_root(dir.path().join("vault"));
        (config, dir)
    }

    fn run(config: &AppConfig, command: CliCommand) -> String {
        let mut output = Vec::new();
        execute(config, command, &mut output).expect("execute");
        String::from_utf8(output).expect("utf8")
    }

    #[test]
    fn add_then_list_shows_the_todo() {
        let (config, _dir) = temp_config();
        let added = run(
            &config,
            CliCommand::Add(AddArgs {
                text: vec!["Buy".into(), "milk".into()],
            }),
        );
        assert!(added.contains("Buy milk"));

        let listed = run(&config, CliCommand::List(ListArgs { json: false }));
        assert_eq!(listed, "  0 [ ] Buy milk\n");
    }

    #[test]
    fn list_json_round_trips_through_serde() {
        let (config, _dir) = temp_config();
        run(
            &config,
            CliCommand::Add(AddArgs {
                text: vec!["Water plants".into()],
            }),
        );

        let json = run(&config, CliCommand::List(ListArgs { json: true }));
        let todos: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(todos.as_array().map(Vec::len), Some(1));
        assert_eq!(todos[0]["index"], 0);
        assert_eq!(todos[0]["text"], "Water plants");
        assert_eq!(todos[0]["done"], false);
    }

    #[test]
    fn toggle_reports_the_new_state() {
        let (config, _dir) = temp_config();
        run(
            &config,
            CliCommand::Add(AddArgs {
                text: vec!["Ship it".into()],
            }),
        );

        let output = run(
            &config,
            CliCommand::Toggle(ToggleArgs {
                target: TodoTarget::Today,
                index: 0,
                undone: false,
            }),
        );
        assert_eq!(output, "Marked #0 done\n");
    }

    #[test]
    fn delete_reports_missing_indices() {
        let (config, _dir) = temp_config();
        let output = run(
            &config,
            CliCommand::Delete(DeleteArgs {
                target: TodoTarget::Today,
                index: 7,
            }),
        );
        assert_eq!(output, "No todo at #7\n");
    }

    #[test]
    fn set_vault_persists_the_slot() {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::from_config_dir(dir.path().join("config")).expect("config");
        let vault = dir.path().join("elsewhere");

        let output = run(
            &config,
            CliCommand::SetVault(SetVaultArgs {
                path: vault.clone(),
            }),
        );
        assert!(output.contains("Vault root set to"));

        let reloaded = AppConfig::from_config_dir(dir.path().join("config")).expect("config");
        assert_eq!(reloaded.vault_root(), Some(vault.as_path()));
    }

    #[test]
    fn history_lists_days_newest_first() {
        let (config, _dir) = temp_config();
        let vault = config.vault_root().unwrap().to_path_buf();
        fs::create_dir_all(&vault).unwrap();

        let today = Local::now().date_naive();
        let earlier = today - chrono::Days::new(3);
        for (day, text) in [(today, "today item"), (earlier, "earlier item")] {
            let body = format!("### 重点事项\n- [ ] {}\n", text);
            fs::write(vault.join(format!("{}.md", day.format("%Y-%m-%d"))), body).unwrap();
        }

        let output = run(&config, CliCommand::History(ListArgs { json: false }));
        let today_at = output.find("today item").unwrap();
        let earlier_at = output.find("earlier item").unwrap();
        assert!(today_at < earlier_at);
        assert!(output.contains(&today.format("%Y-%m-%d").to_string()));
    }
}
