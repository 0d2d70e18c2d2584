use super::types::{AgentBrowserResponse, BrowserCommand, SessionCookie, data_field};
use super::{Browser, BrowserFuture, BrowsingContext, Element, OUTER_HTML_SCRIPT};
use crate::config::BrowserConfig;
use crate::error::BrowserError;
use serde_json::{Value, json};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Spawns agent-browser commands against one named session.
#[derive(Debug, Clone)]
struct AgentRunner {
    binary: String,
    session: String,
}

impl AgentRunner {
    /// Execute an agent-browser command and return its `data` payload.
    async fn run(&self, command: &BrowserCommand) -> Result<Option<Value>, BrowserError> {
        let args = command.args();
        debug!(
            "Running: {} --session {} {} --json",
            self.binary,
            self.session,
            args.join(" ")
        );

        let output = Command::new(&self.binary)
            .arg("--session")
            .arg(&self.session)
            .args(&args)
            .arg("--json")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BrowserError::Process(format!("{}: {e}", self.binary)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.is_empty() {
            debug!("agent-browser stderr: {}", stderr.trim());
        }

        if let Ok(resp) = serde_json::from_str::<AgentBrowserResponse>(&stdout) {
            return if resp.success {
                Ok(resp.data)
            } else {
                Err(command_error(
                    command,
                    resp.error.unwrap_or_else(|| "unknown error".into()),
                ))
            };
        }

        // Fallback for non-JSON output
        if output.status.success() {
            Ok(Some(json!({ "output": stdout.trim() })))
        } else {
            Err(command_error(command, stderr.trim().to_string()))
        }
    }
}

fn command_error(command: &BrowserCommand, message: String) -> BrowserError {
    match command {
        BrowserCommand::Open { url } => BrowserError::Navigation {
            url: url.clone(),
            message,
        },
        BrowserCommand::Eval { .. } | BrowserCommand::GetUrl => BrowserError::Script(message),
        BrowserCommand::Count { selector } | BrowserCommand::Click { selector } => {
            BrowserError::Element {
                selector: selector.clone(),
                message,
            }
        }
        BrowserCommand::TabNew | BrowserCommand::TabClose | BrowserCommand::SetCookie { .. } => {
            BrowserError::Process(message)
        }
    }
}

/// Browser backed by Vercel's agent-browser CLI.
///
/// One session keeps the cookie jar; every context is a fresh tab in it.
#[derive(Debug, Clone)]
pub struct AgentBrowser {
    runner: AgentRunner,
}

impl AgentBrowser {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            runner: AgentRunner {
                binary: config.binary.clone(),
                session: config.session.clone(),
            },
        }
    }

    /// Check if the agent-browser CLI is available
    pub async fn is_available(&self) -> bool {
        Command::new(&self.runner.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn open_tab(&self) -> Result<AgentTab, BrowserError> {
        self.runner.run(&BrowserCommand::TabNew).await?;
        Ok(AgentTab {
            runner: self.runner.clone(),
            closed: false,
        })
    }
}

impl Browser for AgentBrowser {
    fn open_context(&self) -> BrowserFuture<'_, Box<dyn BrowsingContext>> {
        Box::pin(async move {
            let tab = self.open_tab().await?;
            Ok(Box::new(tab) as Box<dyn BrowsingContext>)
        })
    }

    fn set_cookies<'a>(
        &'a self,
        origin: &'a str,
        cookies: &'a [SessionCookie],
    ) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            let mut tab = self.open_tab().await?;
            let outcome = async {
                tab.navigate(origin).await?;
                for cookie in cookies {
                    self.runner
                        .run(&BrowserCommand::SetCookie {
                            name: cookie.name.clone(),
                            value: cookie.value.clone(),
                        })
                        .await?;
                }
                Ok::<(), BrowserError>(())
            }
            .await;

            if let Err(e) = tab.close().await {
                tracing::warn!("Failed to close cookie tab: {e}");
            }
            outcome
        })
    }
}

struct AgentTab {
    runner: AgentRunner,
    closed: bool,
}

impl BrowsingContext for AgentTab {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            self.runner
                .run(&BrowserCommand::Open { url: url.to_string() })
                .await
                .map(|_| ())
        })
    }

    fn run_script<'a>(&'a mut self, script: &'a str) -> BrowserFuture<'a, Value> {
        Box::pin(async move {
            let data = self
                .runner
                .run(&BrowserCommand::Eval {
                    script: script.to_string(),
                })
                .await?;
            Ok(data_field(data, "result").unwrap_or(Value::Null))
        })
    }

    fn current_url(&mut self) -> BrowserFuture<'_, String> {
        Box::pin(async move {
            let data = self.runner.run(&BrowserCommand::GetUrl).await?;
            match data_field(data, "url") {
                Some(Value::String(url)) => Ok(url.trim().to_string()),
                other => Err(BrowserError::Output(format!("get url returned {other:?}"))),
            }
        })
    }

    fn find_element<'a>(&'a mut self, selector: &'a str) -> BrowserFuture<'a, Option<Element>> {
        Box::pin(async move {
            let data = self
                .runner
                .run(&BrowserCommand::Count {
                    selector: selector.to_string(),
                })
                .await?;
            let count = match data_field(data, "count") {
                Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
                Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
                _ => 0,
            };
            Ok((count > 0).then(|| Element {
                selector: selector.to_string(),
            }))
        })
    }

    fn click<'a>(&'a mut self, element: &'a Element) -> BrowserFuture<'a, ()> {
        Box::pin(async move {
            self.runner
                .run(&BrowserCommand::Click {
                    selector: element.selector.clone(),
                })
                .await
                .map(|_| ())
        })
    }

    fn page_html(&mut self) -> BrowserFuture<'_, String> {
        Box::pin(async move {
            match self.run_script(OUTER_HTML_SCRIPT).await? {
                Value::String(html) => Ok(html),
                other => Err(BrowserError::Output(format!(
                    "page markup was not a string: {other}"
                ))),
            }
        })
    }

    fn close(&mut self) -> BrowserFuture<'_, ()> {
        Box::pin(async move {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            self.runner.run(&BrowserCommand::TabClose).await.map(|_| ())
        })
    }
}
