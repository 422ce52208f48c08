use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use uuid::Uuid;

use crate::auth::AuthClient;
use crate::models::{Filter, Task};
use crate::services::{SessionTracker, TaskList};
use crate::store::TaskStore;

type InputLines = Lines<BufReader<Stdin>>;

/// Line-driven terminal surface. Renders the filtered list plus the
/// single-slot error banner and drives the form state machine via prompts.
/// Contains no sync logic: session transitions arrive through the tracker's
/// subscription, even for logins this surface itself initiated.
pub struct App {
    auth: Arc<dyn AuthClient>,
    tracker: SessionTracker,
    list: TaskList,
}

impl App {
    pub fn new(auth: Arc<dyn AuthClient>, store: Arc<dyn TaskStore>) -> Self {
        let tracker = SessionTracker::new(auth.clone());
        Self {
            auth,
            tracker,
            list: TaskList::new(store),
        }
    }

    pub async fn run(mut self) -> std::io::Result<()> {
        match self.tracker.init().await {
            Ok(session) => self.list.set_session(session).await,
            Err(e) => self.list.set_error(e.to_string()),
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("tasklist - type `help` for commands");
        self.render();
        prompt_marker()?;

        loop {
            tokio::select! {
                session = self.tracker.changed() => {
                    println!();
                    self.list.set_session(session).await;
                    self.render();
                    prompt_marker()?;
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if !self.handle(line.trim(), &mut lines).await? {
                        break;
                    }
                    prompt_marker()?;
                }
            }
        }

        Ok(())
    }

    async fn handle(&mut self, line: &str, lines: &mut InputLines) -> std::io::Result<bool> {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or("");
        let arg = parts.next();

        match command {
            "" => {}
            "help" => print_help(),
            "login" | "signup" => self.sign_in_or_up(command, lines).await?,
            "logout" => {
                if let Err(e) = self.auth.sign_out().await {
                    self.list.set_error(e.to_string());
                    self.render();
                }
            }
            "list" => self.render(),
            "filter" => match arg.and_then(Filter::parse) {
                Some(filter) => {
                    self.list.set_filter(filter);
                    self.render();
                }
                None => println!("usage: filter all|active|completed"),
            },
            "add" => {
                self.add(lines).await?;
                self.render();
            }
            "edit" => match self.visible_task(arg) {
                Some(task) => {
                    self.edit(task.id, lines).await?;
                    self.render();
                }
                None => println!("usage: edit <n>"),
            },
            "done" => match self.visible_task(arg) {
                Some(task) => {
                    self.list.toggle_completed(&task).await;
                    self.render();
                }
                None => println!("usage: done <n>"),
            },
            "rm" => match self.visible_task(arg) {
                Some(task) => {
                    self.list.remove(task.id).await;
                    self.render();
                }
                None => println!("usage: rm <n>"),
            },
            "quit" | "exit" => return Ok(false),
            other => println!("unknown command `{}`; type `help`", other),
        }

        Ok(true)
    }

    async fn sign_in_or_up(&mut self, command: &str, lines: &mut InputLines) -> std::io::Result<()> {
        let Some(email) = prompt_line(lines, "Email: ").await? else {
            return Ok(());
        };
        let Some(password) = prompt_line(lines, "Password: ").await? else {
            return Ok(());
        };

        let result = if command == "signup" {
            self.auth.sign_up(email.trim(), &password).await
        } else {
            self.auth.sign_in_with_password(email.trim(), &password).await
        };

        // Success arrives through the tracker subscription; only failures
        // are reported here.
        if let Err(e) = result {
            self.list.set_error(e.to_string());
            self.render();
        }
        Ok(())
    }

    async fn add(&mut self, lines: &mut InputLines) -> std::io::Result<()> {
        self.list.open_create();
        if self.list.form().is_idle() {
            println!("sign in first");
            return Ok(());
        }

        if self.fill_draft(lines).await? {
            self.list.submit_form().await;
        } else {
            self.list.cancel_form();
        }
        Ok(())
    }

    async fn edit(&mut self, id: Uuid, lines: &mut InputLines) -> std::io::Result<()> {
        self.list.open_edit(id);
        if self.list.form().is_idle() {
            return Ok(());
        }

        if self.fill_draft(lines).await? {
            self.list.submit_form().await;
        } else {
            self.list.cancel_form();
        }
        Ok(())
    }

    /// Prompts for the three draft fields. Empty input keeps the current
    /// value, `-` clears an optional one. Returns false on EOF or an
    /// unparseable due date, in which case the caller cancels the form.
    async fn fill_draft(&mut self, lines: &mut InputLines) -> std::io::Result<bool> {
        let current = self.list.form().draft().cloned().unwrap_or_default();

        let Some(title) = prompt_line(lines, &format!("Title [{}]: ", current.title)).await? else {
            return Ok(false);
        };
        let title = if title.trim().is_empty() {
            current.title.clone()
        } else {
            title.trim().to_string()
        };

        let Some(description) =
            prompt_line(lines, &format!("Description [{}] (- clears): ", current.description))
                .await?
        else {
            return Ok(false);
        };
        let description = match description.trim() {
            "" => current.description.clone(),
            "-" => String::new(),
            other => other.to_string(),
        };

        let current_due = current
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let Some(due) =
            prompt_line(lines, &format!("Due date [{}] (- clears): ", current_due)).await?
        else {
            return Ok(false);
        };
        let due_date = match due.trim() {
            "" => current.due_date,
            "-" => None,
            other => match NaiveDate::parse_from_str(other, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    self.list.set_error("Invalid due date (expected YYYY-MM-DD)");
                    return Ok(false);
                }
            },
        };

        if let Some(draft) = self.list.draft_mut() {
            draft.title = title;
            draft.description = description;
            draft.due_date = due_date;
        }
        Ok(true)
    }

    fn visible_task(&self, arg: Option<&str>) -> Option<Task> {
        let index: usize = arg?.parse().ok()?;
        self.list
            .visible()
            .get(index.checked_sub(1)?)
            .map(|t| (*t).clone())
    }

    fn render(&self) {
        if let Some(error) = self.list.error() {
            println!("! {}", error);
        }

        let Some(session) = self.list.session() else {
            println!("(signed out - `login` or `signup` to get started)");
            return;
        };

        let visible = self.list.visible();
        println!(
            "{} - showing {} of {} task(s) [{}]",
            session.email,
            visible.len(),
            self.list.tasks().len(),
            self.list.filter()
        );
        for (i, task) in visible.iter().enumerate() {
            let mark = if task.completed { "x" } else { " " };
            let due = task
                .due_date
                .map(|d| format!("  (due {})", d.format("%Y-%m-%d")))
                .unwrap_or_default();
            println!("{:>3}. [{}] {}{}", i + 1, mark, task.title, due);
            if let Some(description) = &task.description {
                println!("         {}", description);
            }
        }
    }
}

async fn prompt_line(lines: &mut InputLines, label: &str) -> std::io::Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    lines.next_line().await
}

fn prompt_marker() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

fn print_help() {
    println!("commands:");
    println!("  login / signup      authenticate (prompts for email and password)");
    println!("  logout              end the session");
    println!("  list                show tasks under the current filter");
    println!("  filter <f>          all | active | completed");
    println!("  add                 create a task (prompts for fields)");
    println!("  edit <n>            edit task n of the visible list");
    println!("  done <n>            toggle completion of task n");
    println!("  rm <n>              delete task n");
    println!("  quit                exit");
}
