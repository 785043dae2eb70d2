//! catalog アプリ: コマンド 1 つをセッション上の操作列に落として実行する

use crate::cli::render;
use crate::domain::{CatalogCommand, CatalogError, CategoryId, EditField, EditOp, PartId};
use crate::ports::inbound::RunCatalogApp;
use crate::ports::outbound::CatalogService;
use crate::usecase::{CatalogSession, SessionEvent};
use common::error::Error;
use common::ports::outbound::{Log, LogLevel, LogRecord};
use std::io::Write;
use std::sync::Arc;

pub struct App {
    session: CatalogSession,
    service: Arc<dyn CatalogService>,
    log: Arc<dyn Log>,
}

impl App {
    pub fn new(session: CatalogSession, service: Arc<dyn CatalogService>, log: Arc<dyn Log>) -> Self {
        Self {
            session,
            service,
            log,
        }
    }

    pub fn session(&self) -> &CatalogSession {
        &self.session
    }

    /// 応答待ちが無くなるまで待つ。失敗イベントがあれば最初のものを返す。
    fn settle(&mut self) -> Result<Vec<SessionEvent>, Error> {
        let events = self.session.wait_idle();
        if let Some(e) = events.iter().find_map(|ev| match ev {
            SessionEvent::Failed(e) => Some(e.clone()),
            _ => None,
        }) {
            return Err(e.into());
        }
        Ok(events)
    }

    fn load(&mut self, part: PartId) -> Result<(), Error> {
        self.session.load_part(part)?;
        self.settle()?;
        Ok(())
    }

    fn write_current_part(&self, out: &mut dyn Write) -> Result<(), Error> {
        let editor = self.session.editor();
        let part = editor
            .part()
            .ok_or_else(|| CatalogError::invalid_state("show a part", editor.state()))?;
        render::write_part(out, part, &editor.draft().sources)?;
        Ok(())
    }

    fn apply_edit(&mut self, op: EditOp) -> Result<(), CatalogError> {
        match op {
            EditOp::Description(value) => self.session.edit(EditField::Description, &value),
            EditOp::Manufacturer { position, value } => self
                .session
                .edit(EditField::Manufacturer { position }, &value),
            EditOp::Mpn { position, value } => {
                self.session.edit(EditField::Mpn { position }, &value)
            }
            EditOp::AddSource { manufacturer, mpn } => {
                let position = self.session.add_source()?;
                self.session
                    .edit(EditField::Manufacturer { position }, &manufacturer)?;
                self.session.edit(EditField::Mpn { position }, &mpn)
            }
            EditOp::RemoveSource { position } => self.session.remove_source(position),
        }
    }

    fn categories(&mut self, filter: Option<String>, out: &mut dyn Write) -> Result<i32, Error> {
        self.session.start();
        self.settle()?;
        self.session.set_filter(filter.as_deref().unwrap_or(""));
        render::write_categories(out, &self.session.visible_categories())?;
        Ok(0)
    }

    fn edit(
        &mut self,
        part: PartId,
        edits: Vec<EditOp>,
        dry_run: bool,
        out: &mut dyn Write,
    ) -> Result<i32, Error> {
        self.load(part)?;
        for op in edits {
            self.apply_edit(op)?;
        }
        let changes = self.session.pending_changes()?;
        render::write_changes(out, &changes)?;
        if dry_run || changes.is_empty() {
            return Ok(0);
        }
        self.session.save()?;
        self.settle()?;
        writeln!(out)?;
        self.write_current_part(out)?;
        Ok(0)
    }

    fn revise(&mut self, part: PartId, out: &mut dyn Write) -> Result<i32, Error> {
        self.load(part.clone())?;
        self.session.start_revision()?;
        let events = self.settle()?;
        let created = events.iter().find_map(|ev| match ev {
            SessionEvent::RevisionCreated(id) => Some(id.clone()),
            _ => None,
        });
        if let Some(id) = created {
            writeln!(out, "Created revision {} from {}", id, part)?;
        }
        self.write_current_part(out)?;
        Ok(0)
    }

    fn create(
        &mut self,
        category: CategoryId,
        id: PartId,
        name: String,
        out: &mut dyn Write,
    ) -> Result<i32, Error> {
        self.session.select_category(category);
        self.settle()?;
        self.session.create_part(id.as_str(), &name)?;
        self.settle()?;
        writeln!(out, "Created {}", id.as_str().trim())?;
        render::write_parts(out, self.session.navigator().parts())?;
        Ok(0)
    }

    fn command_name(command: &CatalogCommand) -> &'static str {
        match command {
            CatalogCommand::Categories { .. } => "categories",
            CatalogCommand::Parts { .. } => "parts",
            CatalogCommand::Show { .. } => "show",
            CatalogCommand::Edit { .. } => "edit",
            CatalogCommand::Revise { .. } => "revise",
            CatalogCommand::Create { .. } => "create",
            CatalogCommand::Ping => "ping",
        }
    }

    fn dispatch(&mut self, command: CatalogCommand, out: &mut dyn Write) -> Result<i32, Error> {
        match command {
            CatalogCommand::Categories { filter } => self.categories(filter, out),
            CatalogCommand::Parts { category } => {
                self.session.select_category(category);
                self.settle()?;
                render::write_parts(out, self.session.navigator().parts())?;
                Ok(0)
            }
            CatalogCommand::Show { part } => {
                self.load(part)?;
                self.write_current_part(out)?;
                Ok(0)
            }
            CatalogCommand::Edit {
                part,
                edits,
                dry_run,
            } => self.edit(part, edits, dry_run, out),
            CatalogCommand::Revise { part } => self.revise(part, out),
            CatalogCommand::Create { category, id, name } => self.create(category, id, name, out),
            CatalogCommand::Ping => {
                self.service.health()?;
                writeln!(out, "OK")?;
                Ok(0)
            }
        }
    }
}

impl RunCatalogApp for App {
    fn run(&mut self, command: CatalogCommand, out: &mut dyn Write) -> Result<i32, Error> {
        let name = Self::command_name(&command);
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "command started")
                .layer("cli")
                .kind("lifecycle")
                .field("command", name),
        );
        let result = self.dispatch(command, out);
        let code = match &result {
            Ok(code) => *code,
            Err(e) => e.exit_code(),
        };
        let _ = self.log.log(
            &LogRecord::new(LogLevel::Info, "command finished")
                .layer("cli")
                .kind("lifecycle")
                .field("command", name)
                .field("exit_code", code),
        );
        if let Err(ref e) = result {
            let _ = self.log.log(
                &LogRecord::new(LogLevel::Error, e.to_string())
                    .layer("cli")
                    .kind("error"),
            );
        }
        result
    }
}
