use crate::fixture::{FileFixture, FixtureStore};
use crate::geometry::Rect;
use crate::runner::{Report, Runner};
use crate::scenarios::Scenario;
use crate::session::{PageSession, TextNode};
use crate::{Error, Result, Viewport};
use log::debug;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

enum Command {
    Visit(String, oneshot::Sender<Result<()>>),
    Reload(oneshot::Sender<Result<()>>),
    SetViewport(Viewport, oneshot::Sender<Result<()>>),

    // Reads
    Rect(String, oneshot::Sender<Result<Rect>>),
    Style(String, String, oneshot::Sender<Result<String>>),
    Attribute(String, String, oneshot::Sender<Result<Option<String>>>),
    Value(String, oneshot::Sender<Result<String>>),
    Visible(String, oneshot::Sender<Result<bool>>),
    TextNodes(oneshot::Sender<Result<Vec<TextNode>>>),

    // Actions
    Type(String, String, oneshot::Sender<Result<()>>),
    Click(String, oneshot::Sender<Result<()>>),
    Upload(String, FileFixture, oneshot::Sender<Result<()>>),

    Run(Vec<Scenario>, FixtureStore, oneshot::Sender<Report>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async command queue in front of a page session.
///
/// A dedicated worker thread owns the session and executes commands one at a
/// time, in the order they were sent, so the session itself never has to be
/// `Send`. Async callers await each reply before issuing the next step.
#[derive(Clone)]
pub struct SessionQueue {
    cmd_tx: Sender<Command>,
}

impl SessionQueue {
    /// Spawn the worker and build the session on it with `factory`.
    pub async fn start<F>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn PageSession>> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            let mut session = match factory() {
                Ok(s) => s,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Visit(path, resp) => {
                        let _ = resp.send(session.visit(&path));
                    }
                    Command::Reload(resp) => {
                        let _ = resp.send(session.reload());
                    }
                    Command::SetViewport(viewport, resp) => {
                        let _ = resp.send(session.set_viewport(viewport));
                    }
                    Command::Rect(selector, resp) => {
                        let _ = resp.send(session.bounding_rect(&selector));
                    }
                    Command::Style(selector, property, resp) => {
                        let _ = resp.send(session.computed_style(&selector, &property));
                    }
                    Command::Attribute(selector, name, resp) => {
                        let _ = resp.send(session.attribute(&selector, &name));
                    }
                    Command::Value(selector, resp) => {
                        let _ = resp.send(session.value(&selector));
                    }
                    Command::Visible(selector, resp) => {
                        let _ = resp.send(session.is_visible(&selector));
                    }
                    Command::TextNodes(resp) => {
                        let _ = resp.send(session.text_nodes());
                    }
                    Command::Type(selector, text, resp) => {
                        let _ = resp.send(session.type_text(&selector, &text));
                    }
                    Command::Click(selector, resp) => {
                        let _ = resp.send(session.click(&selector));
                    }
                    Command::Upload(selector, file, resp) => {
                        let _ = resp.send(session.upload_file(&selector, &file));
                    }
                    Command::Run(scenarios, fixtures, resp) => {
                        let report = Runner::with_fixtures(fixtures).run(session.as_mut(), &scenarios);
                        let _ = resp.send(report);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
            debug!("session worker stopped");
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    async fn request<T>(
        &self,
        what: &str,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| Error::Other(format!("{} failed: session worker is gone", what)))?;
        rx.await
            .map_err(|e| Error::Other(format!("{} canceled: {}", what, e)))
    }

    pub async fn visit(&self, path: &str) -> Result<()> {
        self.request("Visit", |tx| Command::Visit(path.to_string(), tx))
            .await?
    }

    pub async fn reload(&self) -> Result<()> {
        self.request("Reload", Command::Reload).await?
    }

    pub async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        self.request("SetViewport", |tx| Command::SetViewport(viewport, tx))
            .await?
    }

    pub async fn bounding_rect(&self, selector: &str) -> Result<Rect> {
        self.request("Rect", |tx| Command::Rect(selector.to_string(), tx))
            .await?
    }

    pub async fn computed_style(&self, selector: &str, property: &str) -> Result<String> {
        self.request("Style", |tx| {
            Command::Style(selector.to_string(), property.to_string(), tx)
        })
        .await?
    }

    pub async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.request("Attribute", |tx| {
            Command::Attribute(selector.to_string(), name.to_string(), tx)
        })
        .await?
    }

    pub async fn value(&self, selector: &str) -> Result<String> {
        self.request("Value", |tx| Command::Value(selector.to_string(), tx))
            .await?
    }

    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        self.request("Visible", |tx| Command::Visible(selector.to_string(), tx))
            .await?
    }

    pub async fn text_nodes(&self) -> Result<Vec<TextNode>> {
        self.request("TextNodes", Command::TextNodes).await?
    }

    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.request("Type", |tx| {
            Command::Type(selector.to_string(), text.to_string(), tx)
        })
        .await?
    }

    pub async fn click(&self, selector: &str) -> Result<()> {
        self.request("Click", |tx| Command::Click(selector.to_string(), tx))
            .await?
    }

    pub async fn upload_file(&self, selector: &str, file: FileFixture) -> Result<()> {
        self.request("Upload", |tx| Command::Upload(selector.to_string(), file, tx))
            .await?
    }

    /// Run scenarios on the worker; the whole run holds the queue.
    pub async fn run_scenarios(
        &self,
        scenarios: Vec<Scenario>,
        fixtures: FixtureStore,
    ) -> Result<Report> {
        self.request("Run", |tx| Command::Run(scenarios, fixtures, tx))
            .await
    }

    /// Shut the worker down and drop the session.
    pub async fn close(self) -> Result<()> {
        self.request("Close", Command::Close).await?
    }
}
