//! Line-oriented terminal presenter over a [`TaskSyncClient`].
//!
//! Renders the read-model as text and turns typed commands into sync calls.
//! The draft being added is kept here, not in the client.

use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::cache::{OperationStatus, TasksView};
use crate::client::{CompletionSummary, SyncError, TaskSyncClient};
use crate::model::{draft_problem, Task, ValidationError};
use crate::store::TaskStore;

const BAR_WIDTH: usize = 20;

pub const HELP: &str = "\
commands:
  add <title>            add a task (3 to 25 characters)
  add                    retry the draft kept after a failed add
  toggle <id>            mark done / not done
  rename <id> <title>    change the title
  rm <id>                delete a task
  list                   reload from the store
  help                   this text
  quit                   leave
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(Option<String>),
    Toggle(String),
    Rename(String, String),
    Remove(String),
    List,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help'")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("no task with id {0}")]
    NoSuchTask(String),
}

fn required(arg: &str, what: &'static str) -> Result<String, CommandError> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(what));
    }
    Ok(arg.to_string())
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start().trim_end_matches(['\r', '\n']);
        let (word, rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
        match word {
            "add" => Ok(Command::Add(Some(rest.to_string()).filter(|t| !t.is_empty()))),
            "toggle" | "done" => Ok(Command::Toggle(required(rest, "task id")?)),
            "rename" | "edit" => {
                let rest = rest.trim_start();
                let (id, title) = rest.split_once(' ').unwrap_or((rest, ""));
                let id = required(id, "task id")?;
                if title.is_empty() {
                    return Err(CommandError::MissingArgument("new title"));
                }
                Ok(Command::Rename(id, title.to_string()))
            }
            "rm" | "delete" => Ok(Command::Remove(required(rest, "task id")?)),
            "list" | "ls" | "" => Ok(Command::List),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Outcome of one command.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Continue(String),
    Quit,
}

fn validation_hint(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::TitleTooShort { .. } => "At least 3 characters!",
        ValidationError::TitleTooLong { .. } => "At most 25 characters!",
    }
}

fn describe(err: &SyncError) -> String {
    match err {
        SyncError::Validation(v) => format!("{} ({})", validation_hint(v), v),
        SyncError::Transport(t) => format!("task store error: {}", t),
    }
}

/// Header, progress bar and list for `view`, with times shown in `now`'s offset.
pub fn render(view: &TasksView, now: DateTime<FixedOffset>) -> String {
    let summary = CompletionSummary::of(&view.tasks);
    let offset = now.offset();
    let mut out = String::new();

    let date = now.format("%A, %-d %b").to_string().to_uppercase();
    let _ = writeln!(out, "DAILY TASKS {:>28}", date);
    let _ = writeln!(
        out,
        "progress {:>3}% {:>25}",
        summary.percentage,
        format!("{} / {}", summary.completed, summary.total)
    );
    let filled = (summary.ratio() * BAR_WIDTH as f64).round() as usize;
    let _ = writeln!(
        out,
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    );

    if view.is_loading && view.version == 0 {
        out.push_str("  loading...\n");
    } else if view.tasks.is_empty() {
        out.push_str("  no tasks yet...\n");
    } else {
        for task in view.tasks.iter() {
            let _ = writeln!(
                out,
                "{:>5} [{}] {:<25}  {}",
                task.id.to_string(),
                if task.is_completed { 'x' } else { ' ' },
                task.title,
                task.created_at.with_timezone(offset).format("%H:%M • %-d %b")
            );
        }
    }

    if let OperationStatus::Error(reason) = &view.status {
        let _ = writeln!(out, "  ! last refresh failed: {}", reason);
    }
    out
}

pub struct Console<S: TaskStore> {
    client: TaskSyncClient<S>,
    draft: String,
    offset: FixedOffset,
}

impl<S: TaskStore> Console<S> {
    pub fn new(client: TaskSyncClient<S>, offset: FixedOffset) -> Self {
        Self {
            client,
            draft: String::new(),
            offset,
        }
    }

    pub fn client(&self) -> &TaskSyncClient<S> {
        &self.client
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    fn screen(&self) -> String {
        let now = chrono::Utc::now().with_timezone(&self.offset);
        render(&self.client.get_tasks(), now)
    }

    fn find(&self, id: &str) -> Result<Task, CommandError> {
        self.client
            .get_tasks()
            .tasks
            .iter()
            .find(|t| t.id.to_string() == id)
            .cloned()
            .ok_or_else(|| CommandError::NoSuchTask(id.to_string()))
    }

    async fn add(&mut self, title: Option<String>) -> String {
        if let Some(title) = title {
            self.draft = title;
        }
        if self.draft.is_empty() {
            return "nothing to add\n".to_string();
        }
        if let Some(problem) = draft_problem(&self.draft) {
            return format!("{}\ndraft kept: '{}'\n", validation_hint(&problem), self.draft);
        }
        match self.client.submit_new_task(&mut self.draft).await {
            Ok(_) => self.screen(),
            Err(err) => format!("{}\ndraft kept: '{}'\n", describe(&err), self.draft),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Step {
        debug!(?command, "console command");
        let text = match command {
            Command::Add(title) => self.add(title).await,
            Command::Toggle(id) => match self.find(&id) {
                Ok(task) => match self.client.toggle_completion(&task).await {
                    Ok(_) => self.screen(),
                    Err(err) => format!("{}\n", describe(&err)),
                },
                Err(err) => format!("{}\n", err),
            },
            Command::Rename(id, title) => match self.find(&id) {
                Ok(task) => match self.client.rename_task(&task, &title).await {
                    Ok(_) => self.screen(),
                    Err(err) => format!("{}\n", describe(&err)),
                },
                Err(err) => format!("{}\n", err),
            },
            Command::Remove(id) => match self.find(&id) {
                Ok(task) => match self.client.remove_task(&task.id).await {
                    Ok(()) => self.screen(),
                    Err(err) => format!("{}\n", describe(&err)),
                },
                Err(err) => format!("{}\n", err),
            },
            Command::List => {
                // a failed reload still shows the cached tasks, flagged by the status line
                let _ = self.client.load().await;
                self.screen()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Step::Quit,
        };
        Step::Continue(text)
    }

    /// Loads the list, then serves commands from `input` until `quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let _ = self.client.load().await;
        output.write_all(self.screen().as_bytes()).await?;
        output.flush().await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let step = match line.parse::<Command>() {
                Ok(command) => self.execute(command).await,
                Err(err) => Step::Continue(format!("{}\n", err)),
            };
            match step {
                Step::Continue(text) => {
                    output.write_all(text.as_bytes()).await?;
                    output.flush().await?;
                }
                Step::Quit => break,
            }
        }
        Ok(())
    }
}
