#![forbid(unsafe_code)]

mod cli;
mod command;
mod render;

use std::sync::Arc;

use clap::Parser;
use quiz_core::model::{Catalog, UserIdentity};
use services::{
    IdentityState, QuizSession, QuizWorkflow, SavedSessionCheck, SavedSessionStatus,
    SessionPersistence, SnapshotWriter, View,
};
use storage::Storage;
use storage::http::{HttpDocumentStore, HttpDocumentStoreConfig};
use storage::repository::DocumentStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Args, prepare_sqlite_file};
use crate::command::{Command, HELP};

const BUNDLED_CATALOG: &str = include_str!("../data/questions.json");

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_catalog(args: &Args) -> Result<Catalog, Box<dyn std::error::Error>> {
    let raw = match &args.catalog {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUNDLED_CATALOG.to_owned(),
    };
    let catalog = Catalog::from_json(&raw)?;
    info!(questions = catalog.len(), "loaded question catalog");
    Ok(catalog)
}

enum Flow {
    Continue,
    Quit,
}

/// Terminal front end: one session, one identity, one background writer.
struct Terminal {
    session: QuizSession,
    workflow: QuizWorkflow,
    writer: SnapshotWriter,
    identity: Option<UserIdentity>,
    availability: SavedSessionCheck,
}

impl Terminal {
    async fn refresh_availability(&mut self) {
        let state = IdentityState {
            identity: self.identity.clone(),
            resolved: true,
        };
        if let Some(ticket) = self.availability.begin(&state) {
            let found = self.workflow.has_saved_session(ticket.identity()).await;
            self.availability.complete(&ticket, found);
        }
    }

    fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    async fn apply(&mut self, command: Command) -> Flow {
        match command {
            Command::Start(filter) => {
                let started = match filter {
                    None => self.session.start_session(),
                    Some(category) => self.session.start_category_session(category),
                };
                match started {
                    Ok(()) => print!("{}", render::question(&self.session)),
                    Err(err) => println!("cannot start: {err}"),
                }
            }
            Command::Resume => {
                if self.workflow.resume(&mut self.session, self.identity.as_ref()).await {
                    print!("{}", render::question(&self.session));
                } else {
                    println!("no saved session to resume");
                }
            }
            Command::Restart => {
                match self
                    .workflow
                    .start_over(&mut self.session, self.identity.as_ref())
                    .await
                {
                    Ok(()) => {
                        self.availability.invalidate();
                        print!("{}", render::question(&self.session));
                    }
                    Err(err) => println!("cannot start: {err}"),
                }
            }
            Command::Select(options) => {
                for option in &options {
                    self.session.select_option(option);
                }
                print!("{}", render::question(&self.session));
            }
            Command::Check => match self.session.check_answer() {
                Some(_) => print!("{}", render::question(&self.session)),
                None if self.session.is_checked() => println!("already checked: `next` or `clear`"),
                None => println!("select at least one option first"),
            },
            Command::Next => {
                self.session.next_question();
                print!("{}", render::screen(&self.session));
            }
            Command::Jump(position) => {
                if position > self.session.questions().len() {
                    println!("there is no question {position}");
                } else {
                    self.session.jump_to(position - 1);
                    self.session.resume_quiz();
                    print!("{}", render::question(&self.session));
                }
            }
            Command::Clear => {
                self.session.clear_answer();
                print!("{}", render::question(&self.session));
            }
            Command::Flag => {
                let flagged = self.session.toggle_current_flag();
                println!("{}", if flagged { "flagged" } else { "unflagged" });
            }
            Command::List => print!("{}", render::question_list(&self.session)),
            Command::Review => {
                self.session.stop_and_review();
                print!("{}", render::screen(&self.session));
            }
            Command::Quiz => {
                self.session.resume_quiz();
                print!("{}", render::screen(&self.session));
            }
            Command::RetryWrong => match self.session.retry_wrong_answers() {
                Ok(()) => print!("{}", render::question(&self.session)),
                Err(_) => println!("no wrong answers to retry"),
            },
            Command::RetryFlagged => match self.session.retry_flagged_questions() {
                Ok(()) => print!("{}", render::question(&self.session)),
                Err(_) => println!("no flagged questions to retry"),
            },
            Command::Login(user) => {
                self.identity = Some(UserIdentity::new(user));
                self.refresh_availability().await;
                self.print_identity_status();
            }
            Command::Logout => {
                self.identity = None;
                self.refresh_availability().await;
                self.print_identity_status();
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Flow::Quit,
        }

        self.writer.submit(&self.session, self.identity());
        Flow::Continue
    }

    fn print_identity_status(&self) {
        if self.session.view() == View::Landing {
            print!(
                "{}",
                render::landing(
                    self.availability.status(),
                    self.identity.as_ref().map(UserIdentity::as_str)
                )
            );
            return;
        }
        match self.identity() {
            Some(user) => println!("signed in as {}", user.as_str()),
            None => println!("signed out"),
        }
        if self.availability.status() == SavedSessionStatus::Available {
            println!("this account has a saved session: `resume` to load it");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let catalog = Arc::new(load_catalog(&args)?);

    let db_url = args.database_url();
    prepare_sqlite_file(&db_url)?;
    let remote = args.remote_url.clone().map(|base_url| {
        Arc::new(HttpDocumentStore::new(HttpDocumentStoreConfig {
            base_url,
            token: args.remote_token.clone(),
        })) as Arc<dyn DocumentStore>
    });
    let storage = Storage::sqlite(&db_url, remote).await?;
    info!(db = %db_url, "opened local store");

    let workflow = QuizWorkflow::new(
        services::Clock::system(),
        SessionPersistence::from_storage(&storage),
    );
    let session = match args.seed {
        Some(seed) => QuizSession::with_seed(catalog, seed),
        None => QuizSession::new(catalog),
    };
    let (writer, writer_task) = workflow.spawn_writer();

    let mut terminal = Terminal {
        session,
        workflow,
        writer,
        identity: args.user.clone().map(UserIdentity::new),
        availability: SavedSessionCheck::new(),
    };
    terminal.refresh_availability().await;
    print!(
        "{}",
        render::landing(terminal.availability.status(), args.user.as_deref())
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Ok(Some(command)) => {
                if let Flow::Quit = terminal.apply(command).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(err) => println!("{err}"),
        }
    }

    // Drain queued writes before exiting.
    drop(terminal);
    writer_task.await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
