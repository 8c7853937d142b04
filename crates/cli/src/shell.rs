//! `lumascan shell` command implementation.
//!
//! An interactive REPL. Dragging a PDF into the terminal pastes its path, so a
//! line naming an existing file is treated as a drop on the drop target.

use crate::app::{App, AuthState};
use crate::files;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use lumascan::{DragEvent, DropZone};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;

const HELP: &str = "\
Drop or paste the path of a PDF resume to upload it.

  match <job description>   score the current resume against a job description
  industry [name]           set (or clear) the industry sent with matches
  list                      show saved resumes
  open <id>                 load a saved resume
  delete <id>               delete a saved resume
  refresh                   reload saved resumes
  save                      save the current resume again
  status                    show the current state
  quit                      exit";

/// What the loop does after a line was handled.
enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    app: &'a App,
    drop_zone: DropZone,
    industry: Option<String>,
}

impl Shell<'_> {
    fn signed_in(&self) -> bool {
        matches!(self.app.auth_state(), AuthState::Authenticated { .. })
    }

    /// Saved records change after every upload or match while signed in.
    async fn refresh_quietly(&self) {
        if self.signed_in() {
            let _ = self.app.dashboard.fetch().await;
        }
    }

    fn print_save_warning(&self) {
        if let Some(message) = self.app.workflow.view().save_error {
            eprintln!("{}", ui::save_warning(&message));
        }
    }

    async fn handle_drop(&mut self, path: &std::path::Path) -> Result<()> {
        self.drop_zone.handle(DragEvent::Enter);
        let file = match files::read_resume_file(path) {
            Ok(file) => file,
            Err(e) => {
                self.drop_zone.handle(DragEvent::Leave);
                return Err(e);
            }
        };
        let outcome = self.drop_zone.handle(DragEvent::Drop(vec![file]));
        let Some(file) = outcome.file else {
            return Ok(());
        };

        println!("{}", self.drop_zone.label(true).dimmed());
        let view = self.app.submit(&file).await?;
        print!("{}", ui::skills(&view.skills));
        self.print_save_warning();
        self.refresh_quietly().await;
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if let Some(path) = files::dropped_path(line) {
            info!("Shell drop: {}", path.display());
            self.handle_drop(&path).await?;
            return Ok(Flow::Continue);
        }

        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => println!("{HELP}"),
            "match" => {
                let result = self.app.analyze(rest, self.industry.as_deref()).await?;
                print!("{}", ui::match_report(&result));
                self.print_save_warning();
                self.refresh_quietly().await;
            }
            "industry" => {
                self.industry = Some(rest.to_string()).filter(|i| !i.is_empty());
                match &self.industry {
                    Some(industry) => println!("Industry set to '{industry}'."),
                    None => println!("Industry cleared."),
                }
            }
            "list" => print!("{}", ui::record_list(&self.app.dashboard.records())),
            "open" => {
                let record = self.app.open_record(rest)?;
                println!("Loaded '{}'.", record.display_title());
                print!("{}", ui::skills(&record.skills));
            }
            "delete" => {
                self.app.dashboard.delete(rest).await?;
                println!("Deleted {rest}.");
                print!("{}", ui::record_list(&self.app.dashboard.records()));
            }
            "save" => match self.app.workflow.save().await? {
                Some(record) => {
                    println!("Saved '{}'.", record.display_title());
                    self.refresh_quietly().await;
                }
                None => println!("Nothing to save. Sign in and load a resume first."),
            },
            "refresh" => {
                let count = self.app.dashboard.refresh().await?;
                println!("{count} saved resumes.");
            }
            "status" => {
                let email = match self.app.auth_state() {
                    AuthState::Authenticated { email } => {
                        Some(email.unwrap_or_else(|| "unknown user".to_string()))
                    }
                    AuthState::Guest => None,
                };
                println!("{}", ui::status(&self.app.workflow.view(), email.as_deref()));
            }
            _ => eprintln!(
                "Unknown command '{command}'. Drop a PDF or type {}.",
                "help".yellow()
            ),
        }
        Ok(Flow::Continue)
    }
}

/// Runs the interactive shell until `quit` or end of input.
pub async fn run_shell(app: &App) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut shell = Shell {
        app,
        drop_zone: DropZone::new(),
        industry: None,
    };

    if app.restore_last_resume()? {
        println!("Restored your last resume.");
    }
    if shell.signed_in() {
        if let Err(e) = app.dashboard.fetch().await {
            eprintln!("{}: {e}", "error".red());
        }
    }

    println!("{}", "lumascan shell".bold().green());
    println!("{}", shell.drop_zone.label(false));
    println!("Type {} for commands, {} to exit.\n", "help".yellow(), "quit".yellow());

    let prompt = format!("{}> ", "lumascan".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                match shell.handle_line(trimmed).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }
    Ok(())
}
