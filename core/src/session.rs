//! Event loop that drives a `ListController` against a live catalog.
//!
//! # Design
//! One task owns the controller, so overlay and paging state need no
//! locks. It `select!`s over three sources: UI commands from the
//! `SessionHandle`, finished fetches in a `JoinSet`, and the pending
//! search deadline. Fetches run concurrently and may finish in any order;
//! the controller drops stale ones by sequence number. Every state change
//! is published as a `ListView` on a watch channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error};

use crate::client::CatalogClient;
use crate::config::ListConfig;
use crate::controller::{DialogOutcome, FetchRequest, ListController, ListView};
use crate::error::{ConfigError, SessionClosed};
use crate::transport::Transport;
use crate::types::{CharacterId, Page};

/// Inbound operations from the presentation layer.
#[derive(Debug)]
pub enum Command {
    Init,
    InitWithSearch(String),
    NextPage,
    PrevPage,
    Search(String),
    Rename { id: CharacterId, name: String },
    Delete(CharacterId),
    Resolve { id: CharacterId, outcome: DialogOutcome },
    TotalCount(oneshot::Sender<u64>),
    Shutdown,
}

/// Cloneable front door to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ListView>,
}

impl SessionHandle {
    fn send(&self, command: Command) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }

    pub fn init(&self) -> Result<(), SessionClosed> {
        self.send(Command::Init)
    }

    /// Like `init`, but the first fetch is already filtered by `search`.
    pub fn init_with_search(&self, search: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::InitWithSearch(search.into()))
    }

    pub fn next_page(&self) -> Result<(), SessionClosed> {
        self.send(Command::NextPage)
    }

    pub fn prev_page(&self) -> Result<(), SessionClosed> {
        self.send(Command::PrevPage)
    }

    pub fn search(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::Search(text.into()))
    }

    pub fn rename(&self, id: CharacterId, name: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::Rename {
            id,
            name: name.into(),
        })
    }

    pub fn delete(&self, id: CharacterId) -> Result<(), SessionClosed> {
        self.send(Command::Delete(id))
    }

    pub fn resolve(&self, id: CharacterId, outcome: DialogOutcome) -> Result<(), SessionClosed> {
        self.send(Command::Resolve { id, outcome })
    }

    /// Unfiltered catalog size; 0 if the catalog is unreachable.
    pub async fn total_count(&self) -> Result<u64, SessionClosed> {
        let (reply, response) = oneshot::channel();
        self.send(Command::TotalCount(reply))?;
        response.await.map_err(|_| SessionClosed)
    }

    pub fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(Command::Shutdown)
    }

    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListView> {
        self.view.clone()
    }
}

pub struct Session<T: Transport> {
    client: Arc<CatalogClient>,
    transport: Arc<T>,
    controller: ListController,
    inflight: JoinSet<(FetchRequest, Page)>,
    view: watch::Sender<ListView>,
}

impl<T: Transport> Session<T> {
    /// Start the session loop on the current tokio runtime. Fails before
    /// spawning anything if `config` is invalid.
    pub fn spawn(
        client: CatalogClient,
        transport: T,
        config: ListConfig,
    ) -> Result<(SessionHandle, JoinHandle<()>), ConfigError> {
        let controller = ListController::new(config)?;
        let (view_tx, view_rx) = watch::channel(controller.view());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let session = Session {
            client: Arc::new(client),
            transport: Arc::new(transport),
            controller,
            inflight: JoinSet::new(),
            view: view_tx,
        };
        let task = tokio::spawn(session.run(commands_rx));

        let handle = SessionHandle {
            commands: commands_tx,
            view: view_rx,
        };
        Ok((handle, task))
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.controller.search_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(joined) = self.inflight.join_next(), if !self.inflight.is_empty() => {
                    match joined {
                        Ok((request, page)) => {
                            if let Some(refetch) = self.controller.apply(&request, page) {
                                self.dispatch(refetch);
                            }
                        }
                        Err(e) => error!("fetch task failed: {e}"),
                    }
                    self.publish();
                }
                () = wait_until(deadline) => {
                    if let Some(request) = self.controller.poll_search(Instant::now()) {
                        self.dispatch(request);
                    }
                    self.publish();
                }
            }
        }
        debug!("session shutting down");
        self.inflight.abort_all();
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Init => {
                let request = self.controller.init();
                self.dispatch(request);
            }
            Command::InitWithSearch(search) => {
                let request = self.controller.init_with_search(search);
                self.dispatch(request);
            }
            Command::NextPage => {
                if let Some(request) = self.controller.next_page() {
                    self.dispatch(request);
                }
            }
            Command::PrevPage => {
                if let Some(request) = self.controller.prev_page() {
                    self.dispatch(request);
                }
            }
            Command::Search(text) => self.controller.search_input(text, Instant::now()),
            Command::Rename { id, name } => self.controller.rename(id, name),
            Command::Delete(id) => {
                self.controller.delete(id);
            }
            Command::Resolve { id, outcome } => self.controller.resolve(id, outcome),
            Command::TotalCount(reply) => {
                let client = Arc::clone(&self.client);
                let transport = Arc::clone(&self.transport);
                tokio::spawn(async move {
                    let total = client.fetch_total_count(transport.as_ref()).await;
                    let _ = reply.send(total);
                });
            }
            Command::Shutdown => {}
        }
        self.publish();
    }

    fn dispatch(&mut self, request: FetchRequest) {
        debug!(seq = request.seq, offset = request.query.offset, "dispatching fetch");
        let client = Arc::clone(&self.client);
        let transport = Arc::clone(&self.transport);
        self.inflight.spawn(async move {
            let page = client
                .fetch_characters(transport.as_ref(), &request.query)
                .await;
            (request, page)
        });
    }

    fn publish(&self) {
        let next = self.controller.view();
        self.view.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
