//! Line-oriented console - the presentation layer over the post store.
//!
//! The console keeps the form fields and the current search query. Everything
//! about posts themselves is delegated to [`PostStore`].

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand, ValueEnum};

use postbook_core::render::html_fragment;
use postbook_core::{
    HtmlSanitizer, LoadReport, LoadStatus, Notice, NoticeLevel, Post, PostError, PostId,
    PostStore, Sanitizer, TerminalSanitizer,
};

/// One input line. The first word names the command.
#[derive(Debug, Parser)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    #[value(alias = "yes", alias = "true")]
    On,
    #[value(alias = "no", alias = "false")]
    Off,
}

/// Console commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show posts matching the current search
    #[command(visible_alias = "ls")]
    List,
    /// Set the search query (empty shows everything)
    #[command(visible_alias = "find")]
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Set the form title
    Title {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Append a line to the form content (no text clears it)
    Content {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },
    /// Set the form's published flag
    Publish {
        #[arg(value_enum, ignore_case = true)]
        state: Switch,
    },
    /// Show the form
    Form,
    /// Save the form as a new post, or update the one being edited
    Save,
    /// Clear the form and leave edit mode
    #[command(visible_alias = "cancel")]
    Clear,
    /// Load a post into the form
    Edit { id: PostId },
    /// Delete a post (asks first)
    #[command(visible_alias = "rm")]
    Delete { id: PostId },
    /// Publish or unpublish a post
    Toggle { id: PostId },
    /// Print the visible posts as JSON
    Json,
    /// Print the visible posts as HTML
    Html,
    /// Exit
    #[command(visible_aliases = ["exit", "q"])]
    Quit,
}

impl Command {
    /// Parse one input line. Help requests and usage errors come back as
    /// [`clap::Error`], ready to be printed.
    pub fn parse_line(line: &str) -> Result<Self, clap::Error> {
        Line::try_parse_from(line.split_whitespace()).map(|line| line.command)
    }
}

/// Editable form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl Form {
    fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            published: post.published,
        }
    }
}

pub struct Console<R, W> {
    store: PostStore,
    input: R,
    out: W,
    form: Form,
    query: String,
    sanitizer: TerminalSanitizer,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(store: PostStore, input: R, out: W) -> Self {
        Self {
            store,
            input,
            out,
            form: Form::default(),
            query: String::new(),
            sanitizer: TerminalSanitizer::default(),
        }
    }

    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Tell the user about anything unusual that happened while loading.
    pub fn report_load(&mut self, report: &LoadReport) -> io::Result<()> {
        match &report.status {
            LoadStatus::Malformed { .. } => self.notice(&Notice::warning(
                "Saved posts could not be read; starting with an empty list",
            ))?,
            LoadStatus::Unavailable(_) => self.notice(&Notice::warning(
                "Storage could not be read; starting with an empty list",
            ))?,
            LoadStatus::Loaded | LoadStatus::Missing => {}
        }
        if report.skipped > 0 {
            self.notice(&Notice::warning(format!(
                "{} unreadable post(s) were skipped",
                report.skipped
            )))?;
        }
        if let Some(err) = &report.persist_error {
            self.notice(&Notice::from_error(err))?;
        }
        Ok(())
    }

    /// Read and execute commands until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        self.render()?;
        let mut line = String::new();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                return Ok(());
            }

            if line.trim().is_empty() {
                continue;
            }
            match Command::parse_line(&line) {
                Ok(Command::Quit) => return Ok(()),
                Ok(command) => self.execute(command)?,
                Err(err) => write!(self.out, "{}", err.render())?,
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::List => self.render(),
            Command::Search { words } => {
                self.query = words.join(" ");
                self.render()
            }
            Command::Title { words } => {
                self.form.title = words.join(" ");
                Ok(())
            }
            Command::Content { words } if words.is_empty() => {
                self.form.content.clear();
                Ok(())
            }
            Command::Content { words } => {
                if !self.form.content.is_empty() {
                    self.form.content.push('\n');
                }
                self.form.content.push_str(&words.join(" "));
                Ok(())
            }
            Command::Publish { state } => {
                self.form.published = state == Switch::On;
                Ok(())
            }
            Command::Form => self.show_form(),
            Command::Save => self.save(),
            Command::Clear => {
                self.store.cancel_edit();
                self.form = Form::default();
                Ok(())
            }
            Command::Edit { id } => self.edit(id),
            Command::Delete { id } => self.delete(id),
            Command::Toggle { id } => self.toggle(id),
            Command::Json => {
                let view = self.store.render(&self.query, &HtmlSanitizer);
                let json = serde_json::to_string_pretty(&view).map_err(io::Error::other)?;
                writeln!(self.out, "{json}")
            }
            Command::Html => {
                let view = self.store.render(&self.query, &HtmlSanitizer);
                writeln!(self.out, "{}", html_fragment(&view))
            }
            Command::Quit => Ok(()),
        }
    }

    fn save(&mut self) -> io::Result<()> {
        let Form {
            title,
            content,
            published,
        } = &self.form;

        match self.store.save(title, content, *published) {
            Ok(committed) => {
                self.form = Form::default();
                self.render()?;
                if let Some(err) = &committed.persist_error {
                    self.notice(&Notice::from_error(err))?;
                }
                self.notice(&Notice::saved())
            }
            Err(err) => self.notice(&Notice::from_error(&err)),
        }
    }

    fn edit(&mut self, id: PostId) -> io::Result<()> {
        match self.store.start_edit(id) {
            Ok(post) => {
                self.form = Form::from_post(post);
                self.show_form()
            }
            Err(err) => Self::ignore_stale(err),
        }
    }

    fn delete(&mut self, id: PostId) -> io::Result<()> {
        let confirm = match self.store.request_delete(id) {
            Ok(confirm) => confirm,
            Err(err) => return Self::ignore_stale(err),
        };

        let title = self.sanitizer.sanitize(&confirm.title);
        write!(self.out, "{} ({title}) [y/N] ", confirm.prompt)?;
        self.out.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            return Ok(());
        }

        match self.store.delete(id) {
            Ok(committed) => {
                self.render()?;
                match &committed.persist_error {
                    Some(err) => self.notice(&Notice::from_error(err)),
                    None => Ok(()),
                }
            }
            Err(err) => Self::ignore_stale(err),
        }
    }

    fn toggle(&mut self, id: PostId) -> io::Result<()> {
        match self.store.toggle_publish(id) {
            Ok(committed) => {
                self.render()?;
                match &committed.persist_error {
                    Some(err) => self.notice(&Notice::from_error(err)),
                    None => Ok(()),
                }
            }
            Err(err) => Self::ignore_stale(err),
        }
    }

    /// A stale id means the user acted on an outdated listing; nothing to report.
    fn ignore_stale(err: PostError) -> io::Result<()> {
        tracing::debug!(error = %err, "Ignoring action on missing post");
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let view = self.store.render(&self.query, &self.sanitizer);
        writeln!(self.out, "{}", view.count_label)?;
        for item in &view.items {
            writeln!(
                self.out,
                "[{}] {}\n  {} • {}  [{}: toggle {}]",
                item.id, item.title, item.created_at, item.status_label, item.toggle_label, item.id
            )?;
            if !item.content.is_empty() {
                writeln!(self.out, "  {}", item.content)?;
            }
        }
        Ok(())
    }

    fn show_form(&mut self) -> io::Result<()> {
        let mode = match self.store.editing_id() {
            Some(id) => format!("editing {id}"),
            None => "new post".to_string(),
        };
        writeln!(self.out, "Form ({mode}):")?;
        writeln!(self.out, "  title:     {}", self.sanitizer.sanitize(&self.form.title))?;
        writeln!(self.out, "  content:   {}", self.sanitizer.sanitize(&self.form.content))?;
        writeln!(
            self.out,
            "  published: {}",
            if self.form.published { "on" } else { "off" }
        )
    }

    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Warning => "warning: ",
            NoticeLevel::Error => "error: ",
        };
        writeln!(self.out, "{prefix}{}", notice.message)
    }
}
